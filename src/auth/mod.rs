pub mod client;
pub mod error;
pub mod hosted;
pub mod local;
pub mod remote;
pub mod token;

pub use client::{AuthClient, Subscription};
pub use error::{is_network_failure_message, should_use_local_auth, AuthError, INVALID_CREDENTIALS};
pub use hosted::{HostedAuthApi, HostedSession};
pub use local::LocalAuth;
pub use remote::{AuthChangeEvent, AuthStateChange, RemoteAuth};
pub use token::{Claims, TokenError};

use serde::{Deserialize, Serialize};

use crate::session::Session;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Which sessions a sign-out revokes at the provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignOutScope {
    /// Every session of the user
    #[default]
    Global,
    /// Only this client's session
    Local,
}

impl SignOutScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignOutScope::Global => "global",
            SignOutScope::Local => "local",
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SignOutOptions {
    pub scope: SignOutScope,
}

impl SignOutOptions {
    pub fn local() -> Self {
        Self {
            scope: SignOutScope::Local,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthMeta {
    #[serde(rename = "fallbackAuth")]
    pub fallback_auth: bool,
}

/// Outcome of a sign-in: a session or an error, tagged with its provenance
#[derive(Debug, Clone)]
pub struct AuthResult {
    pub outcome: Result<Session, AuthError>,
    pub meta: AuthMeta,
}

impl AuthResult {
    pub fn remote(outcome: Result<Session, AuthError>) -> Self {
        Self {
            outcome,
            meta: AuthMeta { fallback_auth: false },
        }
    }

    pub fn local(outcome: Result<Session, AuthError>) -> Self {
        Self {
            outcome,
            meta: AuthMeta { fallback_auth: true },
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&AuthError> {
        self.outcome.as_ref().err()
    }

    pub fn is_fallback(&self) -> bool {
        self.meta.fallback_auth
    }

    pub fn into_result(self) -> Result<Session, AuthError> {
        self.outcome
    }
}
