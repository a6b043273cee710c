//! Secret store abstraction
//!
//! Credentials and the token signing key live in an external secret store and
//! are looked up by name. This module defines the lookup trait, the naming
//! conventions and the Redis and in-memory backends. The key vault backend
//! lives in [`crate::keyvault`].

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::redis_pool::RedisPool;

/// Name of the process-wide token signing secret
pub const SIGNING_SECRET_NAME: &str = "jwtsecret";

/// Name of the secret holding a user's password
pub fn credential_secret_name(username: &str) -> String {
    format!("{username}pass")
}

/// A secret value read from the store or from settings. `Debug` never prints
/// the content.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct SecretValue(String);

impl SecretValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the raw secret
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretValue(<redacted>)")
    }
}

/// Read-only lookup of secrets by name
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch a secret; `StoreError::NotFound` when no secret has that name
    async fn get_secret(&self, name: &str) -> StoreResult<SecretValue>;
}

/// Secrets stored as plain Redis strings under `{key_prefix}{name}`
#[derive(Clone)]
pub struct RedisSecretStore {
    pool: RedisPool,
    key_prefix: String,
}

impl RedisSecretStore {
    pub fn new(pool: RedisPool, key_prefix: impl Into<String>) -> Self {
        Self {
            pool,
            key_prefix: key_prefix.into(),
        }
    }

    fn key(&self, name: &str) -> String {
        format!("{}{}", self.key_prefix, name)
    }
}

#[async_trait]
impl SecretStore for RedisSecretStore {
    async fn get_secret(&self, name: &str) -> StoreResult<SecretValue> {
        self.pool
            .get(&self.key(name))
            .await?
            .map(SecretValue::new)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }
}

/// In-process secret store
#[derive(Default)]
pub struct MemorySecretStore {
    secrets: RwLock<HashMap<String, String>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store holding the given `(name, value)` pairs
    pub fn with_secrets<I, K, V>(secrets: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            secrets: RwLock::new(
                secrets
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Insert or replace a secret
    pub async fn put(&self, name: impl Into<String>, value: impl Into<String>) {
        self.secrets.write().await.insert(name.into(), value.into());
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn get_secret(&self, name: &str) -> StoreResult<SecretValue> {
        self.secrets
            .read()
            .await
            .get(name)
            .map(|value| SecretValue::new(value.clone()))
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_secret_is_username_with_pass_suffix() {
        assert_eq!(credential_secret_name("alice"), "alicepass");
    }

    #[test]
    fn debug_output_hides_secret() {
        let secret = SecretValue::new("hunter2");
        let printed = format!("{:?}", secret);
        assert!(!printed.contains("hunter2"));
        assert_eq!(secret.expose(), "hunter2");
    }

    #[tokio::test]
    async fn memory_store_returns_not_found_for_unknown_name() {
        let store = MemorySecretStore::with_secrets([("alicepass", "secret1")]);

        let found = store.get_secret("alicepass").await.unwrap();
        assert_eq!(found.expose(), "secret1");

        let missing = store.get_secret("bobpass").await.unwrap_err();
        assert!(missing.is_not_found());
    }

    #[tokio::test]
    async fn memory_store_put_replaces_value() {
        let store = MemorySecretStore::new();
        store.put(SIGNING_SECRET_NAME, "first").await;
        store.put(SIGNING_SECRET_NAME, "second").await;

        let value = store.get_secret(SIGNING_SECRET_NAME).await.unwrap();
        assert_eq!(value.expose(), "second");
    }
}
