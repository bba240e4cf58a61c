use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::session::Session;

use super::{AuthError, Credentials, SignOutScope};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthChangeEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

/// Event published by a remote auth client
#[derive(Debug, Clone, PartialEq)]
pub struct AuthStateChange {
    pub event: AuthChangeEvent,
    pub session: Option<Session>,
}

impl AuthStateChange {
    pub fn new(event: AuthChangeEvent, session: Option<Session>) -> Self {
        Self { event, session }
    }

    /// A refresh that produced no session: the remote token is dead
    pub fn is_failed_refresh(&self) -> bool {
        self.event == AuthChangeEvent::TokenRefreshed && self.session.is_none()
    }
}

/// The hosted provider as seen by the wrapped client
#[async_trait]
pub trait RemoteAuth: Send + Sync {
    async fn sign_in_with_password(&self, credentials: &Credentials) -> Result<Session, AuthError>;

    /// Current live session, refreshed if stale. Ok(None) when signed out.
    async fn get_session(&self) -> Result<Option<Session>, AuthError>;

    async fn sign_out(&self, scope: SignOutScope) -> Result<(), AuthError>;

    fn subscribe(&self) -> broadcast::Receiver<AuthStateChange>;
}
