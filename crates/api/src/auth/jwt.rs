//! Session token generation and validation
//!
//! Session tokens are HS256 JWTs issued by the identity provider. The
//! signing secret is shared with this service so tokens can be verified
//! locally without a round trip.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use orgpress_shared::UserId;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

/// Clock skew tolerated when checking `exp`
const LEEWAY_SECS: u64 = 60;

/// Claims carried by a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Session ID, if the issuer tracks sessions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    /// Issued at
    pub iat: i64,
    /// Expiration
    pub exp: i64,
}

impl SessionClaims {
    pub fn user_id(&self) -> UserId {
        UserId(self.sub.clone())
    }
}

/// JWT manager for session token operations
#[derive(Clone)]
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtManager {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issue a session token for `user_id` valid for `ttl`
    pub fn generate_session_token(
        &self,
        user_id: &UserId,
        session_id: Option<&str>,
        ttl: Duration,
    ) -> Result<String, JwtError> {
        let now = OffsetDateTime::now_utc();
        let claims = SessionClaims {
            sub: user_id.to_string(),
            sid: session_id.map(str::to_string),
            iat: now.unix_timestamp(),
            exp: (now + ttl).unix_timestamp(),
        };

        // Explicit algorithm prevents algorithm confusion attacks
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::Encoding(e.to_string()))
    }

    /// Validate and decode a session token
    pub fn validate_session_token(&self, token: &str) -> Result<SessionClaims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = LEEWAY_SECS;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims = decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                jsonwebtoken::errors::ErrorKind::InvalidToken => JwtError::Invalid,
                jsonwebtoken::errors::ErrorKind::InvalidAlgorithm => JwtError::Invalid,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::Invalid,
                _ => JwtError::Validation(e.to_string()),
            })?;

        if claims.sub.trim().is_empty() {
            return Err(JwtError::MissingSubject);
        }
        Ok(claims)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Token has expired")]
    Expired,
    #[error("Invalid token")]
    Invalid,
    #[error("Token has no subject")]
    MissingSubject,
    #[error("Token encoding failed: {0}")]
    Encoding(String),
    #[error("Token validation failed: {0}")]
    Validation(String),
}
