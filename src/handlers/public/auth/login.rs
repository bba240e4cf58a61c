// handlers/public/auth/login.rs - POST /api/auth/login handler

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::auth::token::{generate_jwt, Claims};
use crate::auth::Credentials;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::session::Session;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub session: Session,
    pub access_token: String,
    pub role: Option<String>,
    #[serde(rename = "fallbackAuth")]
    pub fallback_auth: bool,
}

/// POST /api/auth/login - Authenticate and receive a bearer token
///
/// Runs the wrapped sign-in: hosted provider first (unless local auth is
/// forced), local shim on connectivity failure. Local sessions have no
/// provider token, so one is minted with the provider's JWT secret.
///
/// ```json
/// { "email": "9965572625@gmail.com", "password": "..." }
/// ```
pub async fn login_post(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let email = payload.email.trim();
    if email.is_empty() {
        return Err(ApiError::missing_field("email"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::missing_field("password"));
    }

    let client = state.request_auth_client();
    let result = client
        .sign_in_with_password(&Credentials::new(email, payload.password.as_str()))
        .await;
    let fallback_auth = result.is_fallback();

    let session = result.into_result().map_err(|e| {
        tracing::info!("Login failed for {} (fallback: {}): {}", email, fallback_auth, e);
        ApiError::from(e)
    })?;

    let access_token = match session.access_token.clone() {
        Some(token) => token,
        None => {
            let secret = state.config.hosted.require_jwt_secret()?;
            let claims = Claims::for_session(&session, state.config.security.token_expiry_hours);
            generate_jwt(&claims, secret)?
        }
    };

    tracing::info!("Login succeeded for {} (fallback: {})", session.user.email, fallback_auth);

    Ok(ApiResponse::success(LoginResponse {
        role: session.user.role().map(str::to_string),
        session,
        access_token,
        fallback_auth,
    })
    .message("Signed in"))
}
