mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn local_login_returns_fallback_session() -> Result<()> {
    let server = common::ensure_server().await?;
    let res = reqwest::Client::new()
        .post(format!("{}/api/auth/login", server.base_url))
        .json(&json!({ "email": "9965572625@gmail.com", "password": common::LOCAL_PASSWORD }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body["ok"], true);
    assert_eq!(body["fallbackAuth"], true);
    assert_eq!(body["role"], "sales-co-ordinator");
    assert_eq!(body["session"]["user"]["id"], "local-sales-co-ordinator");
    assert!(body["access_token"].as_str().is_some_and(|t| !t.is_empty()));
    Ok(())
}

#[tokio::test]
async fn wrong_password_is_rejected() -> Result<()> {
    let server = common::ensure_server().await?;
    let res = reqwest::Client::new()
        .post(format!("{}/api/auth/login", server.base_url))
        .json(&json!({ "email": "hr@qube.com", "password": "not-the-password" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let body: Value = res.json().await?;
    assert_eq!(body["ok"], false);
    assert_eq!(body["message"], "Invalid login credentials");
    Ok(())
}

#[tokio::test]
async fn missing_email_is_a_validation_error() -> Result<()> {
    let server = common::ensure_server().await?;
    let res = reqwest::Client::new()
        .post(format!("{}/api/auth/login", server.base_url))
        .json(&json!({ "password": common::LOCAL_PASSWORD }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: Value = res.json().await?;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["field_errors"]["email"].is_string());
    Ok(())
}

#[tokio::test]
async fn whoami_reflects_the_bearer() -> Result<()> {
    let server = common::ensure_server().await?;
    let token = common::login(server, "accounts@qube.com").await?;

    let res = reqwest::Client::new()
        .get(format!("{}/api/auth/whoami", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body["user"]["email"], "accounts@qube.com");
    assert_eq!(body["slug"], "accounts-executive");
    assert_eq!(body["super_admin"], false);
    assert_eq!(body["fallbackAuth"], true);
    Ok(())
}

#[tokio::test]
async fn whoami_without_bearer_is_unauthorized() -> Result<()> {
    let server = common::ensure_server().await?;
    let res = reqwest::get(format!("{}/api/auth/whoami", server.base_url)).await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}
