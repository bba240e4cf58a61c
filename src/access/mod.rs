//! Role resolution for protected dashboard routes.
//!
//! Every protected page follows the same protocol: no session sends the user
//! to login; otherwise a role is resolved (metadata, email map, stored
//! profile), slugified, and compared against the route being viewed.
//! Lookup failures degrade to "no role", so the worst outcome is `Denied`.

pub mod profiles;

pub use profiles::{NoProfiles, PgProfileRoles, RestProfileRoles};

use async_trait::async_trait;
use serde::Serialize;

use crate::config::{AuthConfig, ConfigError};
use crate::database::DatabaseError;
use crate::roles::{self, DashboardRoutes, EmailRoleMap, ADMIN_ROUTE, LOGIN_ROUTE};
use crate::session::Session;

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Profile request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Profile request returned status {0}")]
    Status(u16),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Where stored profile roles come from
#[async_trait]
pub trait ProfileRoleSource: Send + Sync {
    async fn fetch_role(&self, user_id: &str) -> Result<Option<String>, ProfileError>;
}

/// Static inputs of the resolution flow
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    pub email_roles: EmailRoleMap,
    pub routes: DashboardRoutes,
    pub super_admin_email: String,
}

impl AccessPolicy {
    pub fn new(config: &AuthConfig, email_roles: EmailRoleMap) -> Self {
        Self {
            email_roles,
            routes: DashboardRoutes::builtin(),
            super_admin_email: roles::normalize_email(&config.super_admin_email),
        }
    }

    pub fn is_super_admin_email(&self, email: &str) -> bool {
        !self.super_admin_email.is_empty() && roles::normalize_email(email) == self.super_admin_email
    }

    /// Emails allowed to be provisioned: the super admin and every mapped address
    pub fn is_allow_listed(&self, email: &str) -> bool {
        self.is_super_admin_email(email) || self.email_roles.contains(email)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum AccessDecision {
    /// No session
    Login { route: String },
    /// Super admin, regardless of the route requested
    AdminDashboard { route: String },
    /// No usable role or no dashboard for it
    Denied { slug: Option<String>, message: String },
    /// Viewing another role's route, or the generic landing route
    Redirect { slug: String, route: String },
    Render { slug: String, route: String },
}

impl AccessDecision {
    pub fn route(&self) -> Option<&str> {
        match self {
            AccessDecision::Login { route }
            | AccessDecision::AdminDashboard { route }
            | AccessDecision::Redirect { route, .. }
            | AccessDecision::Render { route, .. } => Some(route),
            AccessDecision::Denied { .. } => None,
        }
    }
}

/// Candidate role for a session: metadata, then email map, then stored profile
pub async fn resolve_role(
    session: &Session,
    policy: &AccessPolicy,
    profiles: &dyn ProfileRoleSource,
) -> Option<String> {
    if let Some(role) = session.user.role() {
        return Some(role.to_string());
    }

    if let Some(label) = policy.email_roles.lookup(&session.user.email) {
        return Some(label.to_string());
    }

    match profiles.fetch_role(&session.user.id).await {
        Ok(role) => role
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty()),
        Err(e) => {
            tracing::warn!("Profile role lookup for {} failed: {}", session.user.id, e);
            None
        }
    }
}

/// Decide what a protected route shows. `requested` is the role slug the
/// route belongs to, or None for the generic dashboard entry point.
pub async fn resolve_access(
    session: Option<&Session>,
    requested: Option<&str>,
    policy: &AccessPolicy,
    profiles: &dyn ProfileRoleSource,
) -> AccessDecision {
    let Some(session) = session else {
        return AccessDecision::Login {
            route: LOGIN_ROUTE.to_string(),
        };
    };

    let candidate = resolve_role(session, policy, profiles).await;

    if policy.is_super_admin_email(&session.user.email)
        || candidate.as_deref().is_some_and(roles::is_super_admin_role)
    {
        return AccessDecision::AdminDashboard {
            route: ADMIN_ROUTE.to_string(),
        };
    }

    let slug = candidate.map(|c| roles::slugify(&c)).unwrap_or_default();
    if slug.is_empty() {
        return AccessDecision::Denied {
            slug: None,
            message: "Access denied: no role assigned to this account".to_string(),
        };
    }

    let Some(route) = policy.routes.route_for(&slug) else {
        return AccessDecision::Denied {
            message: format!("No dashboard configured for role '{}'", slug),
            slug: Some(slug),
        };
    };

    if requested != Some(slug.as_str()) {
        tracing::debug!("Redirecting {} from {:?} to {}", session.user.email, requested, route);
        return AccessDecision::Redirect { slug, route };
    }

    AccessDecision::Render { slug, route }
}
