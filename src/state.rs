use std::sync::Arc;

use crate::access::{AccessPolicy, PgProfileRoles};
use crate::auth::{AuthClient, HostedAuthApi, HostedSession, LocalAuth, RemoteAuth};
use crate::config::{AppConfig, ConfigError};
use crate::database::DatabaseManager;
use crate::roles::EmailRoleMap;
use crate::session::{MemorySessionStore, SessionStore};

/// Shared dependencies injected into every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub database: Arc<DatabaseManager>,
    pub hosted: Option<Arc<HostedAuthApi>>,
    pub policy: Arc<AccessPolicy>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let hosted = if !config.hosted.is_configured() {
            tracing::info!("Hosted auth not configured; sign-in uses the local fallback only");
            None
        } else {
            match HostedAuthApi::from_config(&config.hosted) {
                Ok(api) => Some(Arc::new(api)),
                Err(e) => {
                    tracing::warn!("Hosted auth disabled: {}", e);
                    None
                }
            }
        };

        Self {
            database: Arc::new(DatabaseManager::new(config.database.clone())),
            policy: Arc::new(AccessPolicy::new(&config.auth, EmailRoleMap::builtin())),
            hosted,
            config: Arc::new(config),
        }
    }

    /// Auth client for one request. Sessions land in a throwaway memory store,
    /// so no user's state outlives the request.
    pub fn request_auth_client(&self) -> AuthClient {
        let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
        let remote = self
            .hosted
            .as_ref()
            .map(|api| Arc::new(HostedSession::new(api.clone())) as Arc<dyn RemoteAuth>);
        let local = LocalAuth::new(&self.config.auth, self.policy.email_roles.clone(), store.clone());

        AuthClient::new(
            remote,
            local,
            store,
            self.policy.email_roles.clone(),
            self.config.auth.force_local,
        )
    }

    pub fn profile_roles(&self) -> PgProfileRoles {
        PgProfileRoles::new(self.database.clone())
    }

    /// Hosted client, or the configuration error that kept it from being built
    pub fn require_hosted(&self) -> Result<&HostedAuthApi, ConfigError> {
        self.hosted.as_deref().ok_or_else(|| {
            let hosted = &self.config.hosted;
            hosted
                .require_url()
                .and_then(|_| hosted.require_anon_key())
                .err()
                .unwrap_or(ConfigError::Missing("QUBE_AUTH_URL"))
        })
    }
}
