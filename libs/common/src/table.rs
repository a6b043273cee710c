//! Partitioned table store abstraction
//!
//! Rows are grouped by partition key and addressed by row key within their
//! partition. The store offers exactly three operations: list a partition,
//! delete a row and insert a row. There are no batches, transactions or
//! conditional writes, and listing imposes no order.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::redis_pool::RedisPool;

/// A single row of the table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableEntity {
    pub partition_key: String,
    pub row_key: String,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl TableEntity {
    pub fn new(partition_key: impl Into<String>, row_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            row_key: row_key.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }
}

#[async_trait]
pub trait TableStore: Send + Sync {
    /// Every row of the partition, in no particular order
    async fn list_partition(&self, partition_key: &str) -> StoreResult<Vec<TableEntity>>;

    /// Remove one row; `StoreError::NotFound` when it does not exist
    async fn delete_row(&self, partition_key: &str, row_key: &str) -> StoreResult<()>;

    /// Add one row; `StoreError::Conflict` when the keys are taken
    async fn insert_row(&self, entity: &TableEntity) -> StoreResult<()>;
}

/// Table stored in Redis as one hash per partition (`{table}:{partition}`),
/// each field a row key holding the JSON-encoded entity
#[derive(Clone)]
pub struct RedisTableStore {
    pool: RedisPool,
    table_name: String,
}

impl RedisTableStore {
    pub fn new(pool: RedisPool, table_name: impl Into<String>) -> Self {
        Self {
            pool,
            table_name: table_name.into(),
        }
    }

    fn partition_key(&self, partition_key: &str) -> String {
        format!("{}:{}", self.table_name, partition_key)
    }
}

#[async_trait]
impl TableStore for RedisTableStore {
    async fn list_partition(&self, partition_key: &str) -> StoreResult<Vec<TableEntity>> {
        let rows = self
            .pool
            .hash_get_all(&self.partition_key(partition_key))
            .await?;

        rows.into_values()
            .map(|json| serde_json::from_str(&json).map_err(StoreError::from))
            .collect()
    }

    async fn delete_row(&self, partition_key: &str, row_key: &str) -> StoreResult<()> {
        let removed = self
            .pool
            .hash_delete(&self.partition_key(partition_key), row_key)
            .await?;

        if removed {
            Ok(())
        } else {
            Err(StoreError::NotFound(format!("{partition_key}/{row_key}")))
        }
    }

    async fn insert_row(&self, entity: &TableEntity) -> StoreResult<()> {
        let json = serde_json::to_string(entity)?;
        let written = self
            .pool
            .hash_set_new(
                &self.partition_key(&entity.partition_key),
                &entity.row_key,
                &json,
            )
            .await?;

        if written {
            Ok(())
        } else {
            Err(StoreError::Conflict {
                partition_key: entity.partition_key.clone(),
                row_key: entity.row_key.clone(),
            })
        }
    }
}

/// In-process table store. Counts mutations so callers can check that an
/// operation wrote nothing.
#[derive(Default)]
pub struct MemoryTableStore {
    partitions: RwLock<HashMap<String, HashMap<String, TableEntity>>>,
    mutations: AtomicUsize,
}

impl MemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful inserts and deletes so far
    pub fn mutation_count(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TableStore for MemoryTableStore {
    async fn list_partition(&self, partition_key: &str) -> StoreResult<Vec<TableEntity>> {
        let partitions = self.partitions.read().await;
        Ok(partitions
            .get(partition_key)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn delete_row(&self, partition_key: &str, row_key: &str) -> StoreResult<()> {
        let mut partitions = self.partitions.write().await;
        let removed = partitions
            .get_mut(partition_key)
            .and_then(|rows| rows.remove(row_key));

        match removed {
            Some(_) => {
                self.mutations.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("{partition_key}/{row_key}"))),
        }
    }

    async fn insert_row(&self, entity: &TableEntity) -> StoreResult<()> {
        let mut partitions = self.partitions.write().await;
        let rows = partitions.entry(entity.partition_key.clone()).or_default();

        if rows.contains_key(&entity.row_key) {
            return Err(StoreError::Conflict {
                partition_key: entity.partition_key.clone(),
                row_key: entity.row_key.clone(),
            });
        }

        debug!(
            "Inserting row {}/{}",
            entity.partition_key, entity.row_key
        );
        rows.insert(entity.row_key.clone(), entity.clone());
        self.mutations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
