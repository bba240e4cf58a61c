use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::sync::{broadcast, RwLock};
use url::Url;

use crate::config::{ConfigError, HostedConfig};
use crate::session::{Session, User};

use super::remote::{AuthChangeEvent, AuthStateChange, RemoteAuth};
use super::{AuthError, Credentials, SignOutScope};

/// Refresh the access token this long before it actually expires
const REFRESH_MARGIN_SECS: i64 = 30;
const EVENT_CAPACITY: usize = 16;

#[derive(Debug, Deserialize)]
struct HostedUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: HostedUser,
}

/// Error body shapes the provider uses across endpoints
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl From<HostedUser> for User {
    fn from(user: HostedUser) -> Self {
        User {
            id: user.id,
            email: user.email.unwrap_or_default(),
            metadata: user.user_metadata,
        }
    }
}

impl From<TokenResponse> for Session {
    fn from(token: TokenResponse) -> Self {
        let expires_at = token
            .expires_at
            .or_else(|| token.expires_in.map(|secs| Utc::now().timestamp() + secs));
        Session::remote(token.user.into(), token.access_token, token.refresh_token, expires_at)
    }
}

/// Stateless client for the hosted provider's auth REST API
#[derive(Debug, Clone)]
pub struct HostedAuthApi {
    base: Url,
    anon_key: String,
    service_key: Option<String>,
    http: reqwest::Client,
}

impl HostedAuthApi {
    pub fn from_config(config: &HostedConfig) -> Result<Self, ConfigError> {
        let raw = config.require_url()?;
        let anon_key = config.require_anon_key()?.to_string();

        // Url::join replaces the last path segment unless the base ends with '/'
        let normalized = if raw.ends_with('/') {
            raw.to_string()
        } else {
            format!("{}/", raw)
        };
        let base = Url::parse(&normalized).map_err(|_| ConfigError::Missing("QUBE_AUTH_URL"))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Ok(Self {
            base,
            anon_key,
            service_key: config.service_key.clone().filter(|k| !k.trim().is_empty()),
            http,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, AuthError> {
        self.base
            .join(path)
            .map_err(|e| AuthError::provider(0, format!("invalid endpoint {}: {}", path, e)))
    }

    pub async fn sign_in_with_password(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");

        let request = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": credentials.email, "password": credentials.password }));

        let token: TokenResponse = send_json(request).await?;
        Ok(token.into())
    }

    pub async fn refresh_session(&self, refresh_token: &str) -> Result<Session, AuthError> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "refresh_token");

        let request = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&json!({ "refresh_token": refresh_token }));

        let token: TokenResponse = send_json(request).await?;
        Ok(token.into())
    }

    pub async fn get_user(&self, access_token: &str) -> Result<User, AuthError> {
        let request = self
            .http
            .get(self.endpoint("auth/v1/user")?)
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token);

        let user: HostedUser = send_json(request).await?;
        Ok(user.into())
    }

    pub async fn sign_out(&self, access_token: &str, scope: SignOutScope) -> Result<(), AuthError> {
        let mut url = self.endpoint("auth/v1/logout")?;
        url.query_pairs_mut().append_pair("scope", scope.as_str());

        let request = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token);

        send_empty(request).await
    }

    /// Provider liveness probe used by the connectivity smoke test
    pub async fn health(&self) -> Result<(), AuthError> {
        let request = self
            .http
            .get(self.endpoint("auth/v1/health")?)
            .header("apikey", &self.anon_key);

        send_empty(request).await
    }

    fn service_key(&self) -> Result<&str, AuthError> {
        self.service_key
            .as_deref()
            .ok_or(AuthError::Config(ConfigError::Missing("QUBE_AUTH_SERVICE_KEY")))
    }

    /// Create a confirmed user through the admin API (service key required)
    pub async fn admin_create_user(
        &self,
        email: &str,
        password: &str,
        metadata: Map<String, Value>,
    ) -> Result<User, AuthError> {
        let key = self.service_key()?;
        let request = self
            .http
            .post(self.endpoint("auth/v1/admin/users")?)
            .header("apikey", key)
            .bearer_auth(key)
            .json(&json!({
                "email": email,
                "password": password,
                "email_confirm": true,
                "user_metadata": metadata,
            }));

        let user: HostedUser = send_json(request).await?;
        Ok(user.into())
    }

    /// Replace a user's password and metadata through the admin API
    pub async fn admin_update_user(
        &self,
        user_id: &str,
        password: &str,
        metadata: Map<String, Value>,
    ) -> Result<User, AuthError> {
        let key = self.service_key()?;
        let request = self
            .http
            .put(self.endpoint(&format!("auth/v1/admin/users/{}", user_id))?)
            .header("apikey", key)
            .bearer_auth(key)
            .json(&json!({ "password": password, "user_metadata": metadata }));

        let user: HostedUser = send_json(request).await?;
        Ok(user.into())
    }
}

fn transport_error(err: reqwest::Error) -> AuthError {
    if err.is_connect() || err.is_timeout() || err.is_request() {
        AuthError::connectivity(err.to_string())
    } else {
        AuthError::provider(err.status().map(|s| s.as_u16()).unwrap_or(0), err.to_string())
    }
}

async fn send(request: RequestBuilder) -> Result<reqwest::Response, AuthError> {
    let response = request.send().await.map_err(transport_error)?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body: ErrorBody = response.json().await.unwrap_or_default();
    Err(classify_status(status, body))
}

async fn send_json<T: serde::de::DeserializeOwned>(request: RequestBuilder) -> Result<T, AuthError> {
    let response = send(request).await?;
    response
        .json::<T>()
        .await
        .map_err(|e| AuthError::provider(StatusCode::BAD_GATEWAY.as_u16(), format!("unexpected response: {}", e)))
}

async fn send_empty(request: RequestBuilder) -> Result<(), AuthError> {
    send(request).await.map(|_| ())
}

fn classify_status(status: StatusCode, body: ErrorBody) -> AuthError {
    let invalid_grant = body.error.as_deref() == Some("invalid_grant");
    let message = body
        .error_description
        .or(body.msg)
        .or(body.message)
        .or(body.error)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());

    if invalid_grant || (status == StatusCode::BAD_REQUEST && message == super::INVALID_CREDENTIALS) {
        AuthError::InvalidCredentials(message)
    } else {
        AuthError::provider(status.as_u16(), message)
    }
}

/// Per-client remote session on top of [`HostedAuthApi`].
///
/// Holds the live session, refreshes it when stale, and publishes state
/// changes. A failed refresh publishes `TOKEN_REFRESHED` with no session.
pub struct HostedSession {
    api: Arc<HostedAuthApi>,
    current: RwLock<Option<Session>>,
    events: broadcast::Sender<AuthStateChange>,
}

impl HostedSession {
    pub fn new(api: Arc<HostedAuthApi>) -> Self {
        Self::with_session(api, None)
    }

    /// Resume from a previously persisted remote session
    pub fn with_session(api: Arc<HostedAuthApi>, session: Option<Session>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            api,
            current: RwLock::new(session.filter(|s| !s.is_fallback() && s.access_token.is_some())),
            events,
        }
    }

    fn emit(&self, event: AuthChangeEvent, session: Option<Session>) {
        // No receivers is fine
        let _ = self.events.send(AuthStateChange::new(event, session));
    }

    async fn refresh(&self, stale: Session) -> Result<Option<Session>, AuthError> {
        let Some(refresh_token) = stale.refresh_token.as_deref() else {
            return Ok(self.replace_stale(&stale, None).await);
        };

        match self.api.refresh_session(refresh_token).await {
            Ok(session) => Ok(self.replace_stale(&stale, Some(session)).await),
            Err(e @ AuthError::Connectivity(_)) => Err(e),
            Err(e) => {
                tracing::warn!("Session refresh for {} failed: {}", stale.user.email, e);
                Ok(self.replace_stale(&stale, None).await)
            }
        }
    }

    /// Swap in the outcome of a refresh and publish it, but only while the
    /// stale session is still current. A sign-in or sign-out that landed
    /// during the refresh wins, and nothing is published.
    async fn replace_stale(&self, stale: &Session, outcome: Option<Session>) -> Option<Session> {
        {
            let mut current = self.current.write().await;
            let still_stale = current
                .as_ref()
                .is_some_and(|session| session.access_token == stale.access_token);
            if !still_stale {
                return current.clone();
            }
            *current = outcome.clone();
        }

        self.emit(AuthChangeEvent::TokenRefreshed, outcome.clone());
        outcome
    }
}

#[async_trait]
impl RemoteAuth for HostedSession {
    async fn sign_in_with_password(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let session = self.api.sign_in_with_password(credentials).await?;
        *self.current.write().await = Some(session.clone());
        self.emit(AuthChangeEvent::SignedIn, Some(session.clone()));
        Ok(session)
    }

    async fn get_session(&self) -> Result<Option<Session>, AuthError> {
        let current = self.current.read().await.clone();
        match current {
            None => Ok(None),
            Some(session) if !session.is_expired(REFRESH_MARGIN_SECS) => Ok(Some(session)),
            Some(stale) => self.refresh(stale).await,
        }
    }

    async fn sign_out(&self, scope: SignOutScope) -> Result<(), AuthError> {
        let previous = self.current.write().await.take();
        self.emit(AuthChangeEvent::SignedOut, None);

        match previous.and_then(|s| s.access_token) {
            Some(token) => self.api.sign_out(&token, scope).await,
            None => Ok(()),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthStateChange> {
        self.events.subscribe()
    }
}
