use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use crate::access::{NoProfiles, ProfileRoleSource, RestProfileRoles};
use crate::auth::{AuthClient, HostedAuthApi, HostedSession, LocalAuth, RemoteAuth};
use crate::config::AppConfig;
use crate::roles::EmailRoleMap;
use crate::session::{FileSessionStore, Session, SessionStore};

/// Directory holding the CLI's persisted session
pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    let config_dir = if let Ok(custom_dir) = std::env::var("QUBE_CLI_CONFIG_DIR") {
        PathBuf::from(custom_dir)
    } else {
        let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
        PathBuf::from(home).join(".config").join("qube").join("cli")
    };

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

/// Session file in the config directory; an unusable directory reads as "no session"
pub fn session_store() -> FileSessionStore {
    match get_config_dir() {
        Ok(dir) => FileSessionStore::in_dir(dir),
        Err(e) => {
            tracing::warn!("Session persistence disabled: {}", e);
            FileSessionStore::unavailable()
        }
    }
}

/// Everything a command needs to talk to the auth layer
pub struct CliContext {
    pub config: AppConfig,
    pub store: Arc<dyn SessionStore>,
    pub client: Arc<AuthClient>,
    pub hosted: Option<Arc<HostedAuthApi>>,
}

impl CliContext {
    /// Wire the auth client: hosted provider seeded from the stored session
    /// when configured, local shim and file store always.
    pub fn connect(config: AppConfig) -> Self {
        let store: Arc<dyn SessionStore> = Arc::new(session_store());
        let email_roles = EmailRoleMap::builtin();

        let hosted = match HostedAuthApi::from_config(&config.hosted) {
            Ok(api) => Some(Arc::new(api)),
            Err(e) => {
                tracing::debug!("Hosted auth unavailable, local sign-in only: {}", e);
                None
            }
        };
        let remote = hosted.as_ref().map(|api| {
            Arc::new(HostedSession::with_session(api.clone(), store.read())) as Arc<dyn RemoteAuth>
        });

        let local = LocalAuth::new(&config.auth, email_roles.clone(), store.clone());
        let client = AuthClient::connect(remote, local, store.clone(), email_roles, config.auth.force_local);

        Self {
            config,
            store,
            client,
            hosted,
        }
    }

    /// Stored profile roles over REST, authorised as the session's user
    pub fn profile_source(&self, session: Option<&Session>) -> Box<dyn ProfileRoleSource> {
        let token = session
            .filter(|s| !s.is_fallback())
            .and_then(|s| s.access_token.clone());

        match RestProfileRoles::new(&self.config.hosted, token) {
            Ok(source) => Box::new(source),
            Err(_) => Box::new(NoProfiles),
        }
    }
}
