//! Time limits for upstream store calls
//!
//! A hung secret or table call must not hang the request that made it.
//! [`Bounded`] wraps any store and turns an overrun into
//! [`StoreError::Timeout`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::error::{StoreError, StoreResult};
use crate::secrets::{SecretStore, SecretValue};
use crate::table::{TableEntity, TableStore};

/// Run `fut`, failing with `StoreError::Timeout` once `limit` has passed
pub async fn bounded<T, F>(limit: Duration, operation: &'static str, fut: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!("{} exceeded {:?}", operation, limit);
            Err(StoreError::Timeout {
                operation,
                limit_ms: limit.as_millis() as u64,
            })
        }
    }
}

/// A store whose every call is subject to a time limit
pub struct Bounded<S: ?Sized> {
    inner: Arc<S>,
    limit: Duration,
}

impl<S: ?Sized> Bounded<S> {
    pub fn new(inner: Arc<S>, limit: Duration) -> Self {
        Self { inner, limit }
    }
}

#[async_trait]
impl<S> SecretStore for Bounded<S>
where
    S: SecretStore + ?Sized,
{
    async fn get_secret(&self, name: &str) -> StoreResult<SecretValue> {
        bounded(self.limit, "get_secret", self.inner.get_secret(name)).await
    }
}

#[async_trait]
impl<S> TableStore for Bounded<S>
where
    S: TableStore + ?Sized,
{
    async fn list_partition(&self, partition_key: &str) -> StoreResult<Vec<TableEntity>> {
        bounded(
            self.limit,
            "list_partition",
            self.inner.list_partition(partition_key),
        )
        .await
    }

    async fn delete_row(&self, partition_key: &str, row_key: &str) -> StoreResult<()> {
        bounded(
            self.limit,
            "delete_row",
            self.inner.delete_row(partition_key, row_key),
        )
        .await
    }

    async fn insert_row(&self, entity: &TableEntity) -> StoreResult<()> {
        bounded(self.limit, "insert_row", self.inner.insert_row(entity)).await
    }
}
