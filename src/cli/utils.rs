use serde_json::{json, Value};

use crate::access::AccessDecision;
use crate::cli::OutputFormat;
use crate::session::Session;

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "ok": true,
                "message": message
            });

            match data {
                Some(Value::Object(fields)) => {
                    if let Some(envelope) = response.as_object_mut() {
                        envelope.extend(fields);
                    }
                }
                Some(other) => response["data"] = other,
                None => {}
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(output_format: &OutputFormat, message: &str, error_code: Option<&str>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "ok": false,
                "message": message
            });

            if let Some(code) = error_code {
                response["code"] = json!(code);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
    }
    Ok(())
}

/// Output the current session, or its absence
pub fn output_session(output_format: &OutputFormat, session: Option<&Session>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "ok": true,
                    "signed_in": session.is_some(),
                    "session": session,
                }))?
            );
        }
        OutputFormat::Text => match session {
            Some(session) => {
                println!("Signed in as {}", session.user.email);
                println!("Role: {}", session.user.role().unwrap_or("(none)"));
                if session.is_fallback() {
                    println!("Mode: local fallback");
                }
            }
            None => println!("Not signed in"),
        },
    }
    Ok(())
}

/// Output a dashboard access decision
pub fn output_decision(output_format: &OutputFormat, decision: &AccessDecision) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = serde_json::to_value(decision)?;
            response["ok"] = json!(true);
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => match decision {
            AccessDecision::Login { route } => println!("Not signed in, go to {}", route),
            AccessDecision::AdminDashboard { route } => println!("Super admin dashboard: {}", route),
            AccessDecision::Denied { message, .. } => println!("{}", message),
            AccessDecision::Redirect { slug, route } => println!("Redirect to {} ({})", route, slug),
            AccessDecision::Render { slug, route } => println!("Dashboard: {} ({})", route, slug),
        },
    }
    Ok(())
}
