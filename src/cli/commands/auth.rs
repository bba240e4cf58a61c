use std::io::{self, BufRead, Write};

use clap::Subcommand;
use serde_json::json;

use crate::access::{resolve_role, AccessPolicy};
use crate::auth::{Credentials, SignOutOptions, SignOutScope};
use crate::cli::config::CliContext;
use crate::cli::utils::{output_error, output_session, output_success};
use crate::cli::OutputFormat;
use crate::config::config;
use crate::roles::EmailRoleMap;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Sign in with email and password")]
    Login {
        #[arg(help = "Email address")]
        email: String,
        #[arg(long, help = "Password (falls back to QUBE_PASSWORD, then a prompt)")]
        password: Option<String>,
    },

    #[command(about = "Sign out and forget the stored session")]
    Logout {
        #[arg(long, help = "Revoke every session of this user at the provider")]
        global: bool,
    },

    #[command(about = "Show current authentication status")]
    Status,

    #[command(about = "Show current user and resolved role")]
    Whoami,
}

pub async fn handle(cmd: AuthCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let ctx = CliContext::connect(config().clone());

    match cmd {
        AuthCommands::Login { email, password } => {
            let password = match password.or_else(|| std::env::var("QUBE_PASSWORD").ok()) {
                Some(password) => password,
                None => prompt_password()?,
            };

            let result = ctx.client.sign_in_with_password(&Credentials::new(email, password)).await;
            let fallback_auth = result.is_fallback();

            match result.into_result() {
                Ok(session) => output_success(
                    &output_format,
                    &format!("Signed in as {}", session.user.email),
                    Some(json!({
                        "role": session.user.role(),
                        "fallbackAuth": fallback_auth,
                    })),
                ),
                Err(e) => {
                    output_error(&output_format, &e.to_string(), None)?;
                    Err(anyhow::anyhow!("sign-in failed"))
                }
            }
        }
        AuthCommands::Logout { global } => {
            let options = if global {
                SignOutOptions { scope: SignOutScope::Global }
            } else {
                SignOutOptions::local()
            };
            ctx.client.sign_out(options).await;
            output_success(&output_format, "Signed out", None)
        }
        AuthCommands::Status => {
            let session = ctx.client.get_session().await;
            if let Some(session) = session.as_ref() {
                // Keep refreshed provider tokens for the next invocation
                ctx.store.save(session);
            }
            if ctx.client.is_local_only() {
                tracing::info!("Hosted auth inactive; showing the locally stored session");
            }
            output_session(&output_format, session.as_ref())
        }
        AuthCommands::Whoami => {
            let Some(mut session) = ctx.client.get_session().await else {
                output_error(&output_format, "Not signed in", Some("UNAUTHORIZED"))?;
                return Err(anyhow::anyhow!("not signed in"));
            };

            // Provider metadata may have changed since the token was issued
            if let (Some(api), Some(token)) = (ctx.hosted.as_ref(), session.access_token.as_deref()) {
                if !session.is_fallback() {
                    match api.get_user(token).await {
                        Ok(user) => session.user.metadata = user.metadata,
                        Err(e) => tracing::debug!("Keeping cached user metadata: {}", e),
                    }
                }
            }

            let policy = AccessPolicy::new(&ctx.config.auth, EmailRoleMap::builtin());
            let profiles = ctx.profile_source(Some(&session));
            let role = resolve_role(&session, &policy, profiles.as_ref()).await;

            output_success(
                &output_format,
                &format!("{} ({})", session.user.email, role.as_deref().unwrap_or("no role")),
                Some(json!({
                    "user": session.user,
                    "role": role,
                    "fallbackAuth": session.is_fallback(),
                })),
            )
        }
    }
}

fn prompt_password() -> anyhow::Result<String> {
    eprint!("Password: ");
    io::stderr().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(&['\r', '\n'][..]).to_string())
}
