//! Password check against the secret store
//!
//! A user's password lives in the secret store under `{username}pass`. An
//! unknown user and a wrong password are reported the same way so callers
//! cannot tell which half of the pair was wrong.

use std::sync::Arc;

use common::error::StoreError;
use common::secrets::{SecretStore, credential_secret_name};
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum CredentialError {
    /// Unknown user or wrong password
    #[error("Invalid credentials")]
    Rejected,

    /// The secret store could not be read
    #[error("Credential store unavailable: {0}")]
    Store(#[source] StoreError),
}

/// Checks username/password pairs
#[derive(Clone)]
pub struct CredentialValidator {
    secrets: Arc<dyn SecretStore>,
}

impl CredentialValidator {
    pub fn new(secrets: Arc<dyn SecretStore>) -> Self {
        Self { secrets }
    }

    /// Succeeds only when `password` equals the stored secret byte for byte
    pub async fn validate(&self, username: &str, password: &str) -> Result<(), CredentialError> {
        let stored = match self
            .secrets
            .get_secret(&credential_secret_name(username))
            .await
        {
            Ok(secret) => secret,
            Err(e) if e.is_not_found() => {
                debug!("No credential secret for user {}", username);
                return Err(CredentialError::Rejected);
            }
            Err(e) => return Err(CredentialError::Store(e)),
        };

        if constant_time_eq(stored.expose().as_bytes(), password.as_bytes()) {
            Ok(())
        } else {
            Err(CredentialError::Rejected)
        }
    }
}

/// Byte comparison whose duration does not depend on where the inputs differ.
/// Inputs of different length compare unequal.
fn constant_time_eq(expected: &[u8], candidate: &[u8]) -> bool {
    expected.ct_eq(candidate).into()
}
