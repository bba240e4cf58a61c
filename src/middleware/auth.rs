use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth::token::validate_jwt;
use crate::error::ApiError;
use crate::session::Session;
use crate::state::AppState;

/// Authenticated session extracted from a bearer token
#[derive(Clone, Debug)]
pub struct AuthUser(pub Session);

/// Bearer authentication middleware that validates tokens and injects the session
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_jwt_from_headers(&headers).map_err(ApiError::unauthorized)?;
    let secret = state.config.hosted.require_jwt_secret()?;
    let claims = validate_jwt(&token, secret)?;

    request
        .extensions_mut()
        .insert(AuthUser(claims.into_session(&token)));

    Ok(next.run(request).await)
}

/// Session for the bearer token, if any; every failure reads as "no session"
pub fn optional_session(state: &AppState, headers: &HeaderMap) -> Option<Session> {
    let token = extract_jwt_from_headers(headers).ok()?;
    let secret = state.config.hosted.require_jwt_secret().ok()?;

    match validate_jwt(&token, secret) {
        Ok(claims) => Some(claims.into_session(&token)),
        Err(e) => {
            tracing::debug!("Ignoring invalid bearer token: {}", e);
            None
        }
    }
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get("authorization")
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(token.trim().to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}
