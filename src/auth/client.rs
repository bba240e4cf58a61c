use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::roles::{self, EmailRoleMap};
use crate::session::{Session, SessionStore, User};

use super::error::should_use_local_auth;
use super::local::LocalAuth;
use super::remote::{AuthChangeEvent, RemoteAuth};
use super::{AuthError, AuthResult, Credentials, SignOutOptions};

/// Handle returned by [`AuthClient::on_auth_state_change`]
#[derive(Debug)]
pub struct Subscription {
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    fn noop() -> Self {
        Self { task: None }
    }

    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn unsubscribe(self) {
        if let Some(task) = self.task {
            task.abort();
        }
    }
}

/// Auth client used by dashboard consumers.
///
/// Talks to the hosted provider when one is available and local auth is not
/// forced; falls back to the local shim and store when the provider is
/// unreachable. Parts are injected so callers and tests control them.
pub struct AuthClient {
    remote: Option<Arc<dyn RemoteAuth>>,
    local: LocalAuth,
    store: Arc<dyn SessionStore>,
    email_roles: EmailRoleMap,
    force_local: bool,
}

impl AuthClient {
    pub fn new(
        remote: Option<Arc<dyn RemoteAuth>>,
        local: LocalAuth,
        store: Arc<dyn SessionStore>,
        email_roles: EmailRoleMap,
        force_local: bool,
    ) -> Self {
        Self {
            remote,
            local,
            store,
            email_roles,
            force_local,
        }
    }

    /// Build the client and start its background duties.
    ///
    /// Registers a watchdog that signs out locally when the provider reports a
    /// failed token refresh, and probes the remote session once, clearing the
    /// store if the provider rejects it. Must be called inside a Tokio runtime.
    pub fn connect(
        remote: Option<Arc<dyn RemoteAuth>>,
        local: LocalAuth,
        store: Arc<dyn SessionStore>,
        email_roles: EmailRoleMap,
        force_local: bool,
    ) -> Arc<Self> {
        let client = Arc::new(Self::new(remote, local, store, email_roles, force_local));
        client.spawn_refresh_watchdog();
        client.spawn_session_probe();
        client
    }

    /// Remote provider, unless local auth is forced
    fn active_remote(&self) -> Option<&Arc<dyn RemoteAuth>> {
        if self.force_local {
            None
        } else {
            self.remote.as_ref()
        }
    }

    pub fn is_local_only(&self) -> bool {
        self.active_remote().is_none()
    }

    fn spawn_refresh_watchdog(self: &Arc<Self>) {
        let Some(remote) = self.active_remote() else {
            return;
        };

        let mut events = remote.subscribe();
        let client = Arc::downgrade(self);

        tokio::spawn(async move {
            loop {
                let received = events.recv().await;
                let Some(client) = client.upgrade() else {
                    break;
                };

                match received {
                    Ok(change) if change.is_failed_refresh() => client.handle_failed_refresh().await,
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!("Auth watchdog skipped {} events", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
    }

    /// Local sign-out after a failed refresh, unless a newer session has
    /// been installed since the event was published
    async fn handle_failed_refresh(&self) {
        if let Some(remote) = self.active_remote() {
            if let Ok(Some(current)) = remote.get_session().await {
                tracing::debug!("Ignoring stale refresh failure; {} is signed in", current.user.email);
                return;
            }
        }

        tracing::warn!("Token refresh failed, signing out locally");
        self.sign_out(SignOutOptions::local()).await;
    }

    fn spawn_session_probe(self: &Arc<Self>) {
        let Some(remote) = self.active_remote().cloned() else {
            return;
        };
        let store = self.store.clone();
        let probed = store.read();

        tokio::spawn(async move {
            match remote.get_session().await {
                Ok(_) => {}
                Err(e) if should_use_local_auth(&e) => {
                    tracing::debug!("Session probe could not reach provider: {}", e);
                }
                // A sign-in that completed meanwhile has replaced the probed session
                Err(e) if store.read() != probed => {
                    tracing::debug!("Session probe failed after a newer sign-in: {}", e);
                }
                Err(e) => {
                    tracing::warn!("Session probe failed, clearing stored session: {}", e);
                    store.clear();
                }
            }
        });
    }

    /// Attach a role to a provider user that has none: metadata first, then the email map
    fn annotate_role(&self, user: &mut User) {
        if user.role().is_some() {
            return;
        }
        if let Some(label) = self.email_roles.lookup(&user.email) {
            user.set_role(roles::slugify(label));
        }
    }

    pub async fn sign_in_with_password(&self, credentials: &Credentials) -> AuthResult {
        if let Some(remote) = self.active_remote() {
            return self.remote_sign_in(remote, credentials).await;
        }

        if let Some(result) = self.local.sign_in(&credentials.email, &credentials.password) {
            return result;
        }

        // Either local auth is forced or there is no provider: nothing else to try
        AuthResult::local(Err(AuthError::NotConfigured))
    }

    async fn remote_sign_in(&self, remote: &Arc<dyn RemoteAuth>, credentials: &Credentials) -> AuthResult {
        match remote.sign_in_with_password(credentials).await {
            Ok(mut session) => {
                self.annotate_role(&mut session.user);
                self.store.save(&session);
                AuthResult::remote(Ok(session))
            }
            Err(e) if should_use_local_auth(&e) => {
                tracing::warn!("Hosted sign-in unreachable ({}), trying local fallback", e);
                self.local
                    .sign_in(&credentials.email, &credentials.password)
                    .unwrap_or_else(|| AuthResult::remote(Err(e)))
            }
            Err(e) => AuthResult::remote(Err(e)),
        }
    }

    /// Live remote session if there is one, else whatever the local store holds
    pub async fn get_session(&self) -> Option<Session> {
        if let Some(remote) = self.active_remote() {
            match remote.get_session().await {
                Ok(Some(mut session)) => {
                    self.annotate_role(&mut session.user);
                    return Some(session);
                }
                Ok(None) => {}
                Err(e) => tracing::debug!("Remote session unavailable: {}", e),
            }
        }

        self.store.read()
    }

    /// Sign out at the provider if possible; the local store is always cleared
    pub async fn sign_out(&self, options: SignOutOptions) {
        if let Some(remote) = self.active_remote() {
            if let Err(e) = remote.sign_out(options.scope).await {
                tracing::debug!("Ignoring remote sign-out failure: {}", e);
            }
        }

        self.store.clear();
    }

    /// Observe sign-in state.
    ///
    /// Local-only clients report the current store contents once, right away,
    /// and return an inert subscription.
    pub fn on_auth_state_change<F>(&self, callback: F) -> Subscription
    where
        F: Fn(AuthChangeEvent, Option<Session>) + Send + Sync + 'static,
    {
        let Some(remote) = self.active_remote() else {
            let session = self.store.read();
            let event = if session.is_some() {
                AuthChangeEvent::SignedIn
            } else {
                AuthChangeEvent::SignedOut
            };
            callback(event, session);
            return Subscription::noop();
        };

        let mut events = remote.subscribe();
        let task = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(change) => callback(change.event, change.session),
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                }
            }
        });

        Subscription { task: Some(task) }
    }
}
