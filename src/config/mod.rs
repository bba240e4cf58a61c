use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

/// Errors raised when a required configuration value is missing
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub hosted: HostedConfig,
    pub auth: AuthConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// Hosted database/auth provider endpoints and keys
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostedConfig {
    pub url: Option<String>,
    pub anon_key: Option<String>,
    pub service_key: Option<String>,
    pub jwt_secret: Option<String>,
    pub request_timeout_secs: u64,
}

/// Local-fallback authentication and role routing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub super_admin_email: String,
    pub force_local: bool,
    pub local_enabled: bool,
    pub local_password: Option<String>,
    pub default_role: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub cors_origins: Vec<String>,
    pub token_expiry_hours: u64,
}

impl HostedConfig {
    /// Base URL of the hosted provider; absence is a configuration error
    pub fn require_url(&self) -> Result<&str, ConfigError> {
        self.url
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::Missing("QUBE_AUTH_URL"))
    }

    pub fn require_anon_key(&self) -> Result<&str, ConfigError> {
        self.anon_key
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::Missing("QUBE_AUTH_ANON_KEY"))
    }

    pub fn require_jwt_secret(&self) -> Result<&str, ConfigError> {
        self.jwt_secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("QUBE_AUTH_JWT_SECRET"))
    }

    /// True when enough is configured to build a remote auth client
    pub fn is_configured(&self) -> bool {
        self.require_url().is_ok() && self.require_anon_key().is_ok()
    }
}

impl DatabaseConfig {
    pub fn require_url(&self) -> Result<&str, ConfigError> {
        self.url
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Hosted provider
        if let Ok(v) = env::var("QUBE_AUTH_URL") {
            self.hosted.url = Some(v);
        }
        if let Ok(v) = env::var("QUBE_AUTH_ANON_KEY") {
            self.hosted.anon_key = Some(v);
        }
        if let Ok(v) = env::var("QUBE_AUTH_SERVICE_KEY") {
            self.hosted.service_key = Some(v);
        }
        if let Ok(v) = env::var("QUBE_AUTH_JWT_SECRET") {
            self.hosted.jwt_secret = Some(v);
        }
        if let Ok(v) = env::var("QUBE_AUTH_TIMEOUT_SECS") {
            self.hosted.request_timeout_secs = v.parse().unwrap_or(self.hosted.request_timeout_secs);
        }

        // Auth overrides
        if let Ok(v) = env::var("QUBE_SUPER_ADMIN_EMAIL") {
            if !v.trim().is_empty() {
                self.auth.super_admin_email = v.trim().to_lowercase();
            }
        }
        if let Ok(v) = env::var("QUBE_FORCE_LOCAL_AUTH") {
            self.auth.force_local = parse_flag(&v).unwrap_or(self.auth.force_local);
        }
        if let Ok(v) = env::var("QUBE_DISABLE_LOCAL_AUTH") {
            if let Some(disabled) = parse_flag(&v) {
                self.auth.local_enabled = !disabled;
            }
        }
        if let Ok(v) = env::var("QUBE_LOCAL_AUTH_PASSWORD") {
            self.auth.local_password = Some(v);
        }
        if let Ok(v) = env::var("QUBE_DEFAULT_ROLE") {
            if !v.trim().is_empty() {
                self.auth.default_role = v.trim().to_string();
            }
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // API overrides
        if let Some(port) = env::var("QUBE_API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.api.port = port;
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("SECURITY_TOKEN_EXPIRY_HOURS") {
            self.security.token_expiry_hours = v.parse().unwrap_or(self.security.token_expiry_hours);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            hosted: HostedConfig {
                jwt_secret: Some("qube-development-jwt-secret".to_string()),
                request_timeout_secs: 10,
                ..HostedConfig::default()
            },
            auth: AuthConfig {
                super_admin_email: "admin@qube.com".to_string(),
                force_local: true,
                local_enabled: true,
                local_password: Some("qube@123".to_string()),
                default_role: "guest".to_string(),
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 5,
                connection_timeout: 30,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                token_expiry_hours: 24 * 7, // 1 week
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            hosted: HostedConfig {
                request_timeout_secs: 10,
                ..HostedConfig::default()
            },
            auth: AuthConfig {
                super_admin_email: "admin@qube.com".to_string(),
                force_local: false,
                local_enabled: true,
                local_password: None,
                default_role: "guest".to_string(),
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 10,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                cors_origins: vec!["https://staging.qube.com".to_string()],
                token_expiry_hours: 24,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            hosted: HostedConfig {
                request_timeout_secs: 5,
                ..HostedConfig::default()
            },
            auth: AuthConfig {
                super_admin_email: "admin@qube.com".to_string(),
                force_local: false,
                local_enabled: false,
                local_password: None,
                default_role: "guest".to_string(),
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 5,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: false,
            },
            security: SecurityConfig {
                cors_origins: vec!["https://ops.qube.com".to_string()],
                token_expiry_hours: 8,
            },
        }
    }

    /// Development defaults without env overrides, for tests
    pub fn for_tests() -> Self {
        Self::development()
    }
}

/// Accepts the usual spellings of a boolean flag
fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

// Global singleton config for the binaries - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert!(config.auth.force_local);
        assert!(config.auth.local_enabled);
        assert_eq!(config.auth.super_admin_email, "admin@qube.com");
        assert!(config.hosted.require_jwt_secret().is_ok());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(!config.auth.force_local);
        assert!(!config.auth.local_enabled);
        assert!(config.auth.local_password.is_none());
        assert_eq!(
            config.hosted.require_jwt_secret(),
            Err(ConfigError::Missing("QUBE_AUTH_JWT_SECRET"))
        );
    }

    #[test]
    fn missing_hosted_url_is_config_error() {
        let hosted = HostedConfig {
            url: Some("   ".to_string()),
            ..HostedConfig::default()
        };
        assert_eq!(hosted.require_url(), Err(ConfigError::Missing("QUBE_AUTH_URL")));
        assert!(!hosted.is_configured());
    }

    #[test]
    fn parses_flag_spellings() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" 0 "), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
