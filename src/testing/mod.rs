//! In-crate fakes for the auth and profile seams.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::access::{ProfileError, ProfileRoleSource};
use crate::auth::{AuthError, AuthStateChange, Credentials, RemoteAuth, SignOutScope};
use crate::session::Session;

pub mod provider;

/// Scripted hosted provider that counts every call
pub struct FakeRemote {
    sign_in: Mutex<Result<Session, AuthError>>,
    session: Mutex<Result<Option<Session>, AuthError>>,
    sign_out_error: Mutex<Option<AuthError>>,
    last_sign_out: Mutex<Option<SignOutScope>>,
    calls: AtomicUsize,
    events: broadcast::Sender<AuthStateChange>,
}

impl FakeRemote {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            sign_in: Mutex::new(Err(AuthError::invalid_credentials())),
            session: Mutex::new(Ok(None)),
            sign_out_error: Mutex::new(None),
            last_sign_out: Mutex::new(None),
            calls: AtomicUsize::new(0),
            events,
        }
    }

    pub fn with_sign_in(self, result: Result<Session, AuthError>) -> Self {
        *self.sign_in.lock().unwrap() = result;
        self
    }

    pub fn with_session(self, result: Result<Option<Session>, AuthError>) -> Self {
        *self.session.lock().unwrap() = result;
        self
    }

    pub fn with_sign_out_error(self, error: AuthError) -> Self {
        *self.sign_out_error.lock().unwrap() = Some(error);
        self
    }

    pub fn emit(&self, change: AuthStateChange) {
        let _ = self.events.send(change);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_sign_out_scope(&self) -> Option<SignOutScope> {
        *self.last_sign_out.lock().unwrap()
    }

    /// Live subscribers to the event channel
    pub fn receiver_count(&self) -> usize {
        self.events.receiver_count()
    }
}

#[async_trait]
impl RemoteAuth for FakeRemote {
    async fn sign_in_with_password(&self, _credentials: &Credentials) -> Result<Session, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.sign_in.lock().unwrap().clone()
    }

    async fn get_session(&self) -> Result<Option<Session>, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.session.lock().unwrap().clone()
    }

    async fn sign_out(&self, scope: SignOutScope) -> Result<(), AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_sign_out.lock().unwrap() = Some(scope);
        match self.sign_out_error.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthStateChange> {
        self.events.subscribe()
    }
}

/// Profile table held in memory; `failing()` makes every fetch error
#[derive(Default)]
pub struct StaticProfiles {
    roles: HashMap<String, String>,
    fail: bool,
    calls: AtomicUsize,
}

impl StaticProfiles {
    pub fn with(entries: &[(&str, &str)]) -> Self {
        Self {
            roles: entries
                .iter()
                .map(|(id, role)| (id.to_string(), role.to_string()))
                .collect(),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileRoleSource for StaticProfiles {
    async fn fetch_role(&self, user_id: &str) -> Result<Option<String>, ProfileError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProfileError::Status(503));
        }
        Ok(self.roles.get(user_id).cloned())
    }
}
