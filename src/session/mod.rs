pub mod store;

pub use store::{FileSessionStore, MemorySessionStore, SessionStore, SESSION_STORAGE_KEY};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Metadata key carrying the user's role label or slug
pub const ROLE_KEY: &str = "role";
/// Metadata key marking a session synthesized by the local fallback
pub const FALLBACK_KEY: &str = "fallbackAuth";

/// Authenticated user as seen by the dashboard, remote or local
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// A signed-in session. Remote sessions carry provider tokens; local ones do not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user: User,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Unix timestamp (seconds) after which the access token is stale
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

impl User {
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            metadata: Map::new(),
        }
    }

    /// Non-empty role from metadata, if any
    pub fn role(&self) -> Option<&str> {
        self.metadata
            .get(ROLE_KEY)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|role| !role.is_empty())
    }

    pub fn set_role(&mut self, role: impl Into<String>) {
        self.metadata.insert(ROLE_KEY.to_string(), Value::String(role.into()));
    }

    pub fn is_fallback(&self) -> bool {
        self.metadata
            .get(FALLBACK_KEY)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

impl Session {
    /// Session issued by the hosted provider
    pub fn remote(
        user: User,
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_at: Option<i64>,
    ) -> Self {
        Self {
            user,
            access_token: Some(access_token.into()),
            refresh_token,
            expires_at,
        }
    }

    /// Session synthesized by the local fallback, with a deterministic id
    pub fn local(email: impl Into<String>, role: &str) -> Self {
        let mut user = User::new(format!("local-{}", role), email);
        user.set_role(role);
        user.metadata.insert(FALLBACK_KEY.to_string(), Value::Bool(true));

        Self {
            user,
            access_token: None,
            refresh_token: None,
            expires_at: None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.user.is_fallback()
    }

    /// True when the access token is past (or within `margin_secs` of) expiry
    pub fn is_expired(&self, margin_secs: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at <= Utc::now().timestamp() + margin_secs,
            None => false,
        }
    }
}
