//! Session tokens for the login and task services
//!
//! Tokens are HS256 JWTs carrying the username, signed with the secret named
//! [`SIGNING_SECRET_NAME`]. The key is read from the secret store on every
//! call so that rotating it in the store takes effect immediately. Tokens
//! expire one hour after issuance and are checked with no clock leeway.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::error::StoreError;
use crate::secrets::{SIGNING_SECRET_NAME, SecretStore};

/// Lifetime of a session token in seconds
pub const TOKEN_TTL_SECONDS: u64 = 3600;

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Owner of the session
    pub username: String,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
}

/// A freshly signed token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: u64,
}

#[derive(Error, Debug)]
pub enum TokenError {
    /// The token's expiry has passed
    #[error("Token expired")]
    Expired,

    /// Bad signature, malformed token or unusable claims
    #[error("Invalid token: {0}")]
    Invalid(String),

    /// The signing secret could not be read
    #[error("Signing key unavailable: {0}")]
    Store(#[from] StoreError),

    /// Signing failed
    #[error("Failed to sign token: {0}")]
    Signing(String),
}

/// Issues and verifies session tokens
#[derive(Clone)]
pub struct TokenService {
    secrets: Arc<dyn SecretStore>,
}

impl TokenService {
    pub fn new(secrets: Arc<dyn SecretStore>) -> Self {
        Self { secrets }
    }

    /// Issue a token for `username`, valid for one hour from now
    pub async fn issue(&self, username: &str) -> Result<IssuedToken, TokenError> {
        self.issue_at(username, Utc::now()).await
    }

    /// Issue a token as if the current time were `issued_at`
    pub async fn issue_at(
        &self,
        username: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError> {
        let iat = issued_at.timestamp().max(0) as u64;
        let claims = Claims {
            username: username.to_string(),
            iat,
            exp: iat + TOKEN_TTL_SECONDS,
        };

        let key = self.secrets.get_secret(SIGNING_SECRET_NAME).await?;
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(key.expose().as_bytes()),
        )
        .map_err(|e| TokenError::Signing(e.to_string()))?;

        Ok(IssuedToken {
            token,
            expires_in: TOKEN_TTL_SECONDS,
        })
    }

    /// Verify signature and expiry, returning the claims
    pub async fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let key = self.secrets.get_secret(SIGNING_SECRET_NAME).await?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(key.expose().as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid(e.to_string()),
        })?;

        if data.claims.username.is_empty() {
            return Err(TokenError::Invalid("empty username".to_string()));
        }

        debug!("Verified token for {}", data.claims.username);
        Ok(data.claims)
    }
}
