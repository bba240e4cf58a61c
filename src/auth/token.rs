use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::session::{Session, User};

/// Audience the hosted provider stamps on user tokens
pub const TOKEN_AUDIENCE: &str = "authenticated";

/// Bearer token claims, compatible with the hosted provider's access tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub aud: String,
    #[serde(default)]
    pub user_metadata: Map<String, Value>,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("JWT secret not configured")]
    InvalidSecret,

    #[error("JWT generation error: {0}")]
    Generation(String),

    #[error("Invalid JWT token: {0}")]
    Invalid(String),
}

impl Claims {
    /// Claims for a session whose token we mint ourselves (local fallback)
    pub fn for_session(session: &Session, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub: session.user.id.clone(),
            email: Some(session.user.email.clone()),
            aud: TOKEN_AUDIENCE.to_string(),
            user_metadata: session.user.metadata.clone(),
            exp,
            iat: now.timestamp(),
        }
    }

    /// Rebuild the dashboard session carried by a verified token
    pub fn into_session(self, token: &str) -> Session {
        let user = User {
            id: self.sub,
            email: self.email.unwrap_or_default(),
            metadata: self.user_metadata,
        };

        if user.is_fallback() {
            Session {
                user,
                access_token: Some(token.to_string()),
                refresh_token: None,
                expires_at: Some(self.exp),
            }
        } else {
            Session::remote(user, token, None, Some(self.exp))
        }
    }
}

pub fn generate_jwt(claims: &Claims, secret: &str) -> Result<String, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key).map_err(|e| TokenError::Generation(e.to_string()))
}

pub fn validate_jwt(token: &str, secret: &str) -> Result<Claims, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::default();
    validation.set_audience(&[TOKEN_AUDIENCE]);

    decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| TokenError::Invalid(e.to_string()))
}
