//! Service settings
//!
//! Both services read the same settings: built-in defaults overridden by
//! `TASKGEN_`-prefixed environment variables, with `__` separating nested
//! keys (e.g. `TASKGEN_SERVER__PORT=8080`, `TASKGEN_SECRETS__BACKEND=keyvault`).

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use tracing::info;

use crate::keyvault::{KeyVaultConfig, KeyVaultSecretStore};
use crate::redis_pool::{RedisConfig, RedisPool};
use crate::secrets::{RedisSecretStore, SecretStore, SecretValue};
use crate::table::{MemoryTableStore, RedisTableStore, TableStore};
use crate::timeout::Bounded;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub redis: RedisSettings,
    pub secrets: SecretSettings,
    pub table: TableSettings,
    /// Limit for any single secret or table call, in milliseconds
    pub upstream_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisSettings {
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretBackend {
    Redis,
    KeyVault,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecretSettings {
    pub backend: SecretBackend,
    /// Prefix of secret keys in Redis
    pub key_prefix: String,
    pub vault_url: Option<String>,
    pub access_token: Option<SecretValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableBackend {
    Redis,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableSettings {
    pub backend: TableBackend,
    pub name: String,
}

impl Settings {
    /// Load settings, using `default_port` unless `TASKGEN_SERVER__PORT` is set
    pub fn load(default_port: u16) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", i64::from(default_port))?
            .set_default("redis.url", "redis://localhost:6379")?
            .set_default("secrets.backend", "redis")?
            .set_default("secrets.key_prefix", "secret:")?
            .set_default("table.backend", "redis")?
            .set_default("table.name", "tasks")?
            .set_default("upstream_timeout_ms", 5000_i64)?
            .add_source(
                Environment::with_prefix("TASKGEN")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream_timeout_ms)
    }

    fn redis_config(&self) -> RedisConfig {
        RedisConfig {
            url: self.redis.url.clone(),
        }
    }
}

/// Build the configured secret store, bounded by the upstream timeout
pub async fn connect_secret_store(settings: &Settings) -> Result<Arc<dyn SecretStore>> {
    let inner: Arc<dyn SecretStore> = match settings.secrets.backend {
        SecretBackend::Redis => {
            let pool = RedisPool::new(&settings.redis_config()).await?;
            Arc::new(RedisSecretStore::new(
                pool,
                settings.secrets.key_prefix.clone(),
            ))
        }
        SecretBackend::KeyVault => {
            let vault_url = settings
                .secrets
                .vault_url
                .clone()
                .ok_or_else(|| anyhow::anyhow!("TASKGEN_SECRETS__VAULT_URL is not set"))?;
            let access_token = settings
                .secrets
                .access_token
                .clone()
                .ok_or_else(|| anyhow::anyhow!("TASKGEN_SECRETS__ACCESS_TOKEN is not set"))?;
            info!("Using key vault at {}", vault_url);
            Arc::new(KeyVaultSecretStore::new(KeyVaultConfig {
                vault_url,
                access_token,
            })?)
        }
    };

    Ok(Arc::new(Bounded::new(inner, settings.upstream_timeout())))
}

/// Build the configured table store, bounded by the upstream timeout
pub async fn connect_table_store(settings: &Settings) -> Result<Arc<dyn TableStore>> {
    let inner: Arc<dyn TableStore> = match settings.table.backend {
        TableBackend::Redis => {
            let pool = RedisPool::new(&settings.redis_config()).await?;
            Arc::new(RedisTableStore::new(pool, settings.table.name.clone()))
        }
        TableBackend::Memory => {
            info!("Using in-memory table store; rows are lost on restart");
            Arc::new(MemoryTableStore::new())
        }
    };

    Ok(Arc::new(Bounded::new(inner, settings.upstream_timeout())))
}
