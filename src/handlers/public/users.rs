// handlers/public/users.rs - role lookup and allow-listed provisioning
//
// POST /api/user-role    map a user id to its stored role
// POST /api/ensure-user  provision an allow-listed staff email in the hosted provider

use std::collections::HashMap;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::database::Profile;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::roles::{self, SUPER_ADMIN};
use crate::session::ROLE_KEY;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UserRoleRequest {
    #[serde(default)]
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct UserRoleResponse {
    pub user_id: Uuid,
    pub email: String,
    pub role: String,
    pub slug: String,
    pub route: Option<String>,
}

/// POST /api/user-role - stored role for a user id, email map as fallback
pub async fn user_role_post(
    State(state): State<AppState>,
    Json(payload): Json<UserRoleRequest>,
) -> ApiResult<UserRoleResponse> {
    let raw_id = payload.user_id.trim();
    if raw_id.is_empty() {
        return Err(ApiError::missing_field("user_id"));
    }
    let user_id = Uuid::parse_str(raw_id).map_err(|_| {
        let mut field_errors = HashMap::new();
        field_errors.insert("user_id".to_string(), format!("Invalid UUID format: {}", raw_id));
        ApiError::validation_error("Invalid field format", Some(field_errors))
    })?;

    let pool = state.database.pool().await?;
    let profile = Profile::find_by_id(&pool, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No profile for user {}", user_id)))?;

    let role = profile
        .role
        .clone()
        .filter(|r| !r.trim().is_empty())
        .or_else(|| state.policy.email_roles.lookup(&profile.email).map(str::to_string))
        .ok_or_else(|| ApiError::not_found(format!("No role assigned to user {}", user_id)))?;

    let (slug, route) = if roles::is_super_admin_role(&role) {
        (SUPER_ADMIN.to_string(), Some(roles::ADMIN_ROUTE.to_string()))
    } else {
        let slug = roles::slugify(&role);
        let route = state.policy.routes.route_for(&slug);
        (slug, route)
    };

    Ok(ApiResponse::success(UserRoleResponse {
        user_id,
        email: profile.email,
        role,
        slug,
        route,
    }))
}

#[derive(Debug, Deserialize)]
pub struct EnsureUserRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct EnsureUserResponse {
    pub user_id: Uuid,
    pub email: String,
    pub role: String,
    pub created: bool,
}

/// POST /api/ensure-user - make sure an allow-listed email has a hosted user and profile
pub async fn ensure_user_post(
    State(state): State<AppState>,
    Json(payload): Json<EnsureUserRequest>,
) -> ApiResult<EnsureUserResponse> {
    let email = roles::normalize_email(&payload.email);
    if email.is_empty() {
        return Err(ApiError::missing_field("email"));
    }
    // The super admin account is only provisioned through /api/admin/credentials
    if state.policy.is_super_admin_email(&email) {
        tracing::warn!("Public provisioning refused for the super admin email {}", email);
        return Err(ApiError::forbidden("The super admin account cannot be provisioned here"));
    }
    let Some(role) = state.policy.email_roles.lookup(&email).map(str::to_string) else {
        tracing::warn!("Provisioning refused for non allow-listed email {}", email);
        return Err(ApiError::forbidden("Email is not authorised for this dashboard"));
    };
    if payload.password.is_empty() {
        return Err(ApiError::missing_field("password"));
    }

    let hosted = state.require_hosted()?;
    let pool = state.database.pool().await?;

    let (user_id, created) = match Profile::find_by_email(&pool, &email).await? {
        Some(existing) => (existing.id, false),
        None => {
            let mut metadata = Map::new();
            metadata.insert(ROLE_KEY.to_string(), Value::String(role.clone()));
            let user = hosted.admin_create_user(&email, &payload.password, metadata).await?;
            let id = Uuid::parse_str(&user.id)
                .map_err(|_| ApiError::bad_gateway("Hosted user id is not a UUID"))?;
            (id, true)
        }
    };

    let profile = Profile::upsert_role(&pool, user_id, &email, &role).await?;
    tracing::info!("Ensured user {} as {} (created: {})", email, role, created);

    let message = if created { "User provisioned" } else { "User already provisioned" };
    Ok(ApiResponse::success(EnsureUserResponse {
        user_id: profile.id,
        email: profile.email,
        role,
        created,
    })
    .message(message))
}
