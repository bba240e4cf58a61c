use thiserror::Error;

use crate::config::ConfigError;

/// Message shared by the hosted provider and the local fallback on a bad password
pub const INVALID_CREDENTIALS: &str = "Invalid login credentials";

/// Substrings that mark an error message as a connectivity failure
const NETWORK_FAILURE_MARKERS: &[&str] = &["failed to fetch", "getaddrinfo", "dns", "network", "fetch"];

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Credentials were checked and rejected
    #[error("{0}")]
    InvalidCredentials(String),

    /// The provider could not be reached
    #[error("Network error: {0}")]
    Connectivity(String),

    /// The provider answered with an error other than a credential rejection
    #[error("{message}")]
    Provider { status: u16, message: String },

    /// Neither the hosted provider nor the local fallback can serve the request
    #[error("Authentication is not configured")]
    NotConfigured,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl AuthError {
    pub fn invalid_credentials() -> Self {
        AuthError::InvalidCredentials(INVALID_CREDENTIALS.to_string())
    }

    pub fn connectivity(message: impl Into<String>) -> Self {
        AuthError::Connectivity(message.into())
    }

    pub fn provider(status: u16, message: impl Into<String>) -> Self {
        AuthError::Provider {
            status,
            message: message.into(),
        }
    }
}

/// True when a message looks like a transport failure rather than a rejection.
///
/// String matching on provider messages is brittle; typed `Connectivity`
/// errors are preferred and this only covers untyped provider messages.
pub fn is_network_failure_message(message: &str) -> bool {
    let message = message.to_lowercase();
    NETWORK_FAILURE_MARKERS
        .iter()
        .any(|marker| message.contains(marker))
}

/// Decide whether a failed remote call should be retried against the local shim
pub fn should_use_local_auth(error: &AuthError) -> bool {
    match error {
        AuthError::Connectivity(_) => true,
        AuthError::InvalidCredentials(_) => false,
        AuthError::Provider { message, .. } => is_network_failure_message(message),
        AuthError::NotConfigured | AuthError::Config(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connectivity_errors_fall_back() {
        assert!(should_use_local_auth(&AuthError::connectivity("connection refused")));
    }

    #[test]
    fn network_markers_match_case_insensitively() {
        for message in [
            "TypeError: Failed to fetch",
            "getaddrinfo ENOTFOUND project.example.co",
            "DNS lookup failed",
            "Network request failed",
            "fetch aborted",
        ] {
            assert!(
                should_use_local_auth(&AuthError::provider(502, message)),
                "expected fallback for {:?}",
                message
            );
        }
    }

    #[test]
    fn credential_rejections_never_fall_back() {
        assert!(!should_use_local_auth(&AuthError::invalid_credentials()));
        assert!(!should_use_local_auth(&AuthError::provider(400, INVALID_CREDENTIALS)));
        assert!(!should_use_local_auth(&AuthError::provider(500, "Database error saving new user")));
        assert!(!should_use_local_auth(&AuthError::NotConfigured));
    }

    #[test]
    fn invalid_credentials_display_matches_provider_message() {
        assert_eq!(AuthError::invalid_credentials().to_string(), INVALID_CREDENTIALS);
    }
}
