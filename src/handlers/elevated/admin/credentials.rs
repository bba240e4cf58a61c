// handlers/elevated/admin/credentials.rs - POST /api/admin/credentials
//
// Super admin only. Sets the password of a hosted account (the configured
// super admin by default). Allow-listed accounts without a profile are created.

use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::access::resolve_role;
use crate::database::Profile;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::roles::{self, SUPER_ADMIN};
use crate::session::ROLE_KEY;
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: Option<String>,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct CredentialsResponse {
    pub user_id: String,
    pub email: String,
    pub created: bool,
}

pub async fn credentials_post(
    State(state): State<AppState>,
    Extension(AuthUser(session)): Extension<AuthUser>,
    Json(payload): Json<CredentialsRequest>,
) -> ApiResult<CredentialsResponse> {
    let profiles = state.profile_roles();
    let role = resolve_role(&session, &state.policy, &profiles).await;
    let is_super_admin = state.policy.is_super_admin_email(&session.user.email)
        || role.as_deref().is_some_and(roles::is_super_admin_role);
    if !is_super_admin {
        tracing::warn!("Credential update refused for {}", session.user.email);
        return Err(ApiError::forbidden("Super admin access required"));
    }

    if payload.password.is_empty() {
        return Err(ApiError::missing_field("password"));
    }
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let email = payload
        .email
        .as_deref()
        .map(roles::normalize_email)
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| state.policy.super_admin_email.clone());
    if email.is_empty() {
        return Err(ApiError::missing_field("email"));
    }

    let hosted = state.require_hosted()?;
    let pool = state.database.pool().await?;

    match Profile::find_by_email(&pool, &email).await? {
        Some(profile) => {
            let mut metadata = Map::new();
            if let Some(role) = profile.role.as_deref().filter(|r| !r.is_empty()) {
                metadata.insert(ROLE_KEY.to_string(), Value::String(role.to_string()));
            }
            let user = hosted
                .admin_update_user(&profile.id.to_string(), &payload.password, metadata)
                .await?;
            tracing::info!("Updated credentials for {}", email);

            Ok(ApiResponse::success(CredentialsResponse {
                user_id: user.id,
                email,
                created: false,
            })
            .message("Credentials updated"))
        }
        None => {
            if !state.policy.is_allow_listed(&email) {
                return Err(ApiError::forbidden("Email is not authorised for this dashboard"));
            }
            let role = if state.policy.is_super_admin_email(&email) {
                SUPER_ADMIN.to_string()
            } else {
                state
                    .policy
                    .email_roles
                    .lookup(&email)
                    .map(str::to_string)
                    .unwrap_or_default()
            };

            let mut metadata = Map::new();
            metadata.insert(ROLE_KEY.to_string(), Value::String(role.clone()));
            let user = hosted.admin_create_user(&email, &payload.password, metadata).await?;
            let id = Uuid::parse_str(&user.id)
                .map_err(|_| ApiError::bad_gateway("Hosted user id is not a UUID"))?;
            Profile::upsert_role(&pool, id, &email, &role).await?;
            tracing::info!("Created account {} as {}", email, role);

            Ok(ApiResponse::created(CredentialsResponse {
                user_id: user.id,
                email,
                created: true,
            })
            .message("Credentials created"))
        }
    }
}
