//! Redis connection shared by the Redis secret and table backends
//!
//! This module provides a multiplexed Redis connection and the handful of
//! string and hash commands the backends need.

use std::collections::HashMap;

use redis::{AsyncCommands, Client, aio::MultiplexedConnection};
use tracing::info;

use crate::error::StoreResult;

/// Configuration for Redis connection
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis connection URL (e.g., "redis://localhost:6379")
    pub url: String,
}

/// Redis connection handle, cheap to clone
#[derive(Clone)]
pub struct RedisPool {
    connection: MultiplexedConnection,
}

impl RedisPool {
    /// Open the client and establish the multiplexed connection
    pub async fn new(config: &RedisConfig) -> StoreResult<Self> {
        let client = Client::open(config.url.clone())?;
        let connection = client.get_multiplexed_async_connection().await?;
        info!("Redis client initialized with URL: {}", config.url);
        Ok(RedisPool { connection })
    }

    fn connection(&self) -> MultiplexedConnection {
        self.connection.clone()
    }

    /// Get a value from Redis by key
    pub async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.connection();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    /// Set a key-value pair
    pub async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut conn = self.connection();
        let _: () = conn.set(key, value).await?;
        Ok(())
    }

    /// Delete a key, returning whether it existed
    pub async fn delete(&self, key: &str) -> StoreResult<bool> {
        let mut conn = self.connection();
        let removed: u64 = conn.del(key).await?;
        Ok(removed > 0)
    }

    /// Read every field of a hash
    pub async fn hash_get_all(&self, key: &str) -> StoreResult<HashMap<String, String>> {
        let mut conn = self.connection();
        let fields: HashMap<String, String> = conn.hgetall(key).await?;
        Ok(fields)
    }

    /// Set a hash field only if it is absent, returning whether it was written
    pub async fn hash_set_new(&self, key: &str, field: &str, value: &str) -> StoreResult<bool> {
        let mut conn = self.connection();
        let written: bool = conn.hset_nx(key, field, value).await?;
        Ok(written)
    }

    /// Remove a hash field, returning whether it existed
    pub async fn hash_delete(&self, key: &str, field: &str) -> StoreResult<bool> {
        let mut conn = self.connection();
        let removed: u64 = conn.hdel(key, field).await?;
        Ok(removed > 0)
    }

    /// Check if Redis is reachable
    pub async fn health_check(&self) -> StoreResult<bool> {
        let mut conn = self.connection();
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(pong == "PONG")
    }
}
