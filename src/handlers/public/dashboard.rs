// handlers/public/dashboard.rs - GET /api/dashboard[/:role]
//
// Runs the role resolution flow for the bearer session and reports what the
// dashboard should do: login, admin, denied, redirect, or render.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
};

use crate::access::{resolve_access, AccessDecision};
use crate::middleware::{optional_session, ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /api/dashboard - entry point, always resolves to the user's own route
pub async fn dashboard_get(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<AccessDecision> {
    Ok(ApiResponse::success(decide(&state, &headers, None).await))
}

/// GET /api/dashboard/:role - a specific role's dashboard
pub async fn dashboard_role_get(
    State(state): State<AppState>,
    Path(role): Path<String>,
    headers: HeaderMap,
) -> ApiResult<AccessDecision> {
    Ok(ApiResponse::success(decide(&state, &headers, Some(role.as_str())).await))
}

async fn decide(state: &AppState, headers: &HeaderMap, requested: Option<&str>) -> AccessDecision {
    let session = optional_session(state, headers);
    let profiles = state.profile_roles();
    resolve_access(session.as_ref(), requested, &state.policy, &profiles).await
}
