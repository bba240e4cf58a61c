//! Stub hosted provider served by axum on an ephemeral port.
//!
//! Password grant accepts [`GOOD_PASSWORD`]. Refresh grant accepts
//! [`GOOD_REFRESH`], and answers [`SLOW_BAD_REFRESH`] with `invalid_grant`
//! after [`SLOW_REFRESH_DELAY`]. Every other refresh token is rejected at once.

use std::collections::HashMap;
use std::time::Duration;

use axum::{
    extract::{Path, Query},
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};

use crate::config::HostedConfig;

pub const ANON_KEY: &str = "stub-anon";
pub const SERVICE_KEY: &str = "stub-service";
pub const GOOD_PASSWORD: &str = "correct-horse";
pub const GOOD_REFRESH: &str = "good-refresh";
pub const SLOW_BAD_REFRESH: &str = "slow-bad-refresh";
pub const SLOW_REFRESH_DELAY: Duration = Duration::from_millis(300);
pub const USER_ID: &str = "5b0c1f0e-8f2a-4a55-9d4e-3b8b6c8f9a10";

type Reply = (StatusCode, Json<Value>);

/// Start the stub and return its base URL
pub async fn serve() -> String {
    let router = Router::new()
        .route("/auth/v1/token", post(token))
        .route("/auth/v1/user", get(user))
        .route("/auth/v1/admin/users", post(admin_create))
        .route("/auth/v1/admin/users/:id", put(admin_update))
        .route("/rest/v1/profiles", get(profiles));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://{}", addr)
}

/// Hosted config pointing at a running stub
pub fn config(url: &str) -> HostedConfig {
    HostedConfig {
        url: Some(url.to_string()),
        anon_key: Some(ANON_KEY.to_string()),
        service_key: Some(SERVICE_KEY.to_string()),
        jwt_secret: None,
        request_timeout_secs: 5,
    }
}

fn invalid_grant(description: &str) -> Reply {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "invalid_grant", "error_description": description })),
    )
}

fn token_body(access: &str, refresh: &str) -> Value {
    json!({
        "access_token": access,
        "refresh_token": refresh,
        "token_type": "bearer",
        "expires_in": 3600,
        "user": {
            "id": USER_ID,
            "email": "hr@qube.com",
            "user_metadata": { "role": "HR Manager" }
        }
    })
}

async fn token(Query(query): Query<HashMap<String, String>>, Json(body): Json<Value>) -> Reply {
    match query.get("grant_type").map(String::as_str) {
        Some("password") if body["password"] == GOOD_PASSWORD => {
            (StatusCode::OK, Json(token_body("fresh-access", "fresh-refresh")))
        }
        Some("password") => invalid_grant("Invalid login credentials"),
        Some("refresh_token") => match body["refresh_token"].as_str() {
            Some(GOOD_REFRESH) => (StatusCode::OK, Json(token_body("refreshed-access", "next-refresh"))),
            Some(SLOW_BAD_REFRESH) => {
                tokio::time::sleep(SLOW_REFRESH_DELAY).await;
                invalid_grant("Refresh Token Not Found")
            }
            _ => invalid_grant("Refresh Token Not Found"),
        },
        _ => (StatusCode::BAD_REQUEST, Json(json!({ "msg": "unsupported grant_type" }))),
    }
}

async fn user(headers: HeaderMap) -> Reply {
    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
        Some("Bearer fresh-access") => (
            StatusCode::OK,
            Json(json!({
                "id": USER_ID,
                "email": "hr@qube.com",
                "user_metadata": { "role": "HR Manager", "full_name": "Priya" }
            })),
        ),
        _ => (StatusCode::UNAUTHORIZED, Json(json!({ "msg": "invalid JWT" }))),
    }
}

fn is_service(headers: &HeaderMap) -> bool {
    headers.get("apikey").and_then(|v| v.to_str().ok()) == Some(SERVICE_KEY)
}

async fn admin_create(headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    if !is_service(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "msg": "service key required" })));
    }
    (
        StatusCode::OK,
        Json(json!({
            "id": USER_ID,
            "email": body["email"],
            "user_metadata": body["user_metadata"],
        })),
    )
}

async fn admin_update(headers: HeaderMap, Path(id): Path<String>, Json(body): Json<Value>) -> Reply {
    if !is_service(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "msg": "service key required" })));
    }
    (
        StatusCode::OK,
        Json(json!({
            "id": id,
            "email": "admin@qube.com",
            "user_metadata": body["user_metadata"],
        })),
    )
}

async fn profiles(Query(query): Query<HashMap<String, String>>) -> Reply {
    match query.get("id").map(String::as_str) {
        Some("eq.profile-hr") => (StatusCode::OK, Json(json!([{ "role": "HR Manager" }]))),
        Some("eq.profile-unset") => (StatusCode::OK, Json(json!([{ "role": null }]))),
        Some("eq.profile-broken") => (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "message": "down" }))),
        _ => (StatusCode::OK, Json(json!([]))),
    }
}
