// handlers/public/system.rs - service info, liveness, and connectivity smoke test

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::state::AppState;

pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "ok": true,
        "name": "Qube Ops API",
        "version": version,
        "endpoints": {
            "health": "/health (public)",
            "test": "/api/test (public - database and auth connectivity)",
            "login": "/api/auth/login (public)",
            "dashboard": "/api/dashboard[/:role] (optional bearer)",
            "user_role": "/api/user-role (public)",
            "ensure_user": "/api/ensure-user (public, allow-listed emails only)",
            "whoami": "/api/auth/whoami (bearer)",
            "admin": "/api/admin/credentials (super admin bearer)",
        }
    }))
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.database.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "ok": true,
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "ok": false,
                "message": "database unavailable",
                "status": "degraded",
                "timestamp": now,
                "database_error": e.to_string()
            })),
        ),
    }
}

/// GET /api/test - probe the database and the hosted auth provider
pub async fn connectivity_get(State(state): State<AppState>) -> impl IntoResponse {
    let database = match state.database.health_check().await {
        Ok(_) => json!({ "ok": true }),
        Err(e) => json!({ "ok": false, "message": e.to_string() }),
    };

    let auth = match state.require_hosted() {
        Ok(api) => match api.health().await {
            Ok(_) => json!({ "ok": true }),
            Err(e) => json!({ "ok": false, "message": e.to_string() }),
        },
        Err(e) => json!({ "ok": false, "message": e.to_string() }),
    };

    let ok = database["ok"] == true && auth["ok"] == true;
    let status = if ok { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };

    (
        status,
        Json(json!({
            "ok": ok,
            "database": database,
            "auth": auth,
            "local_auth": {
                "enabled": state.config.auth.local_enabled,
                "forced": state.config.auth.force_local,
            }
        })),
    )
}
