use std::sync::Arc;

use crate::config::AuthConfig;
use crate::roles::{self, EmailRoleMap, SUPER_ADMIN};
use crate::session::{Session, SessionStore};

use super::{AuthError, AuthResult};

/// Offline stand-in for the hosted provider.
///
/// Every mapped user shares one configured password. This is a demo and
/// offline-development convenience, not a security boundary.
pub struct LocalAuth {
    enabled: bool,
    password: Option<String>,
    default_role: String,
    super_admin_email: String,
    email_roles: EmailRoleMap,
    store: Arc<dyn SessionStore>,
}

impl LocalAuth {
    pub fn new(config: &AuthConfig, email_roles: EmailRoleMap, store: Arc<dyn SessionStore>) -> Self {
        Self {
            enabled: config.local_enabled,
            password: config.local_password.clone(),
            default_role: roles::slugify(&config.default_role),
            super_admin_email: roles::normalize_email(&config.super_admin_email),
            email_roles,
            store,
        }
    }

    /// Role the shim assigns to an email: super admin, mapped role, or default
    pub fn role_for(&self, email: &str) -> String {
        let email = roles::normalize_email(email);
        if email == self.super_admin_email {
            return SUPER_ADMIN.to_string();
        }

        self.email_roles
            .lookup(&email)
            .map(roles::slugify)
            .unwrap_or_else(|| self.default_role.clone())
    }

    /// Authenticate against the shared password.
    ///
    /// Returns None when the shim does not apply (disabled, or no email) so
    /// the caller can fall through to the hosted provider.
    pub fn sign_in(&self, email: &str, password: &str) -> Option<AuthResult> {
        let email = roles::normalize_email(email);
        if !self.enabled || email.is_empty() {
            return None;
        }

        let role = self.role_for(&email);

        let accepted = self
            .password
            .as_deref()
            .is_some_and(|expected| !expected.is_empty() && expected == password);

        if !accepted {
            tracing::info!("Local sign-in rejected for {}", email);
            return Some(AuthResult::local(Err(AuthError::invalid_credentials())));
        }

        let session = Session::local(email.clone(), &role);
        self.store.save(&session);
        tracing::info!("Local sign-in for {} as {}", email, role);

        Some(AuthResult::local(Ok(session)))
    }
}
