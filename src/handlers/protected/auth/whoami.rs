// handlers/protected/auth/whoami.rs - GET /api/auth/whoami handler

use axum::{extract::State, Extension};
use serde::Serialize;

use crate::access::resolve_role;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::roles;
use crate::session::User;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct WhoamiResponse {
    pub user: User,
    pub role: Option<String>,
    pub slug: Option<String>,
    pub super_admin: bool,
    #[serde(rename = "fallbackAuth")]
    pub fallback_auth: bool,
}

/// GET /api/auth/whoami - the bearer's user and resolved role
pub async fn whoami_get(
    State(state): State<AppState>,
    Extension(AuthUser(session)): Extension<AuthUser>,
) -> ApiResult<WhoamiResponse> {
    let profiles = state.profile_roles();
    let role = resolve_role(&session, &state.policy, &profiles).await;

    let super_admin = state.policy.is_super_admin_email(&session.user.email)
        || role.as_deref().is_some_and(roles::is_super_admin_role);
    let slug = role.as_deref().map(roles::slugify).filter(|s| !s.is_empty());

    Ok(ApiResponse::success(WhoamiResponse {
        fallback_auth: session.is_fallback(),
        user: session.user,
        role,
        slug,
        super_admin,
    }))
}
