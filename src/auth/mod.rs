//! Bearer-token credential verification.
//!
//! Identity issuance lives outside this service; all that is consumed
//! here is "verify credential, get subject id". Tokens are HS256 JWTs
//! signed with the shared secret from configuration.

use axum::http::{header, HeaderMap};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authorization token required")]
    MissingCredential,
    #[error("Invalid or expired token")]
    InvalidCredential,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: i64,
}

pub struct AuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl AuthService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Verify a bearer token and return the subject id it carries.
    pub fn verify(&self, token: &str) -> Result<String, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::new(Algorithm::HS256))
            .map_err(|_| AuthError::InvalidCredential)?;
        Ok(data.claims.sub)
    }

    /// Mint a token for a subject. Used by operator tooling and tests;
    /// the service itself never issues credentials to clients.
    pub fn issue(&self, subject: &str, ttl_secs: i64) -> Result<String, AuthError> {
        let claims = Claims {
            sub: subject.to_string(),
            exp: chrono::Utc::now().timestamp() + ttl_secs,
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|_| AuthError::InvalidCredential)
    }
}

/// Pull the token out of a standard `Authorization: Bearer ...` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
