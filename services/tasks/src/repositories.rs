//! Task repository over the partitioned table store
//!
//! Each owner's tasks form one partition. Saving is a full replace: every
//! existing row of the partition is deleted, then one row per task is
//! inserted under a fresh UUID. The two phases are not atomic. A failure
//! between them leaves the list empty or partial, and two replaces for the
//! same owner running at once can interleave and leave a mix of both lists.

use std::sync::Arc;

use common::error::{StoreError, StoreResult};
use common::table::{TableEntity, TableStore};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{Task, TaskInput, TaskStatus};

const NAME_PROPERTY: &str = "name";
const STATUS_PROPERTY: &str = "status";

#[derive(Error, Debug)]
pub enum TaskError {
    /// A submitted task failed validation; nothing was written
    #[error("{0}")]
    Invalid(String),

    /// A stored row could not be turned back into a task
    #[error("Stored task {0} is malformed")]
    Corrupt(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Acknowledgement of a replace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceAck {
    pub username: String,
    pub count: usize,
}

/// Check every submitted task before anything is written
pub fn validate_tasks(inputs: &[TaskInput]) -> Result<Vec<Task>, TaskError> {
    inputs
        .iter()
        .map(|input| {
            if input.name.is_empty() {
                return Err(TaskError::Invalid("task name required".to_string()));
            }
            let status = input.status.parse::<TaskStatus>().map_err(TaskError::Invalid)?;
            Ok(Task {
                name: input.name.clone(),
                status,
            })
        })
        .collect()
}

/// Task repository for table store operations
#[derive(Clone)]
pub struct TaskRepository {
    table: Arc<dyn TableStore>,
}

impl TaskRepository {
    /// Create a new task repository
    pub fn new(table: Arc<dyn TableStore>) -> Self {
        Self { table }
    }

    /// All tasks of `owner`, in store order. An unknown owner has no tasks.
    pub async fn list(&self, owner: &str) -> Result<Vec<Task>, TaskError> {
        let rows = self.table.list_partition(owner).await?;
        rows.iter().map(task_from_row).collect()
    }

    /// Replace the whole task list of `owner`
    pub async fn replace(&self, owner: &str, inputs: &[TaskInput]) -> Result<ReplaceAck, TaskError> {
        let tasks = validate_tasks(inputs)?;

        let deleted = self.clear_partition(owner).await?;
        self.insert_all(owner, &tasks).await?;

        info!(
            "Replaced tasks for {}: {} removed, {} written",
            owner,
            deleted,
            tasks.len()
        );

        Ok(ReplaceAck {
            username: owner.to_string(),
            count: tasks.len(),
        })
    }

    /// Delete every row of the partition, returning how many this call removed.
    /// Rows that vanish before we reach them are skipped.
    pub(crate) async fn clear_partition(&self, owner: &str) -> StoreResult<usize> {
        let existing = self.table.list_partition(owner).await?;
        let mut deleted = 0;

        for row in existing {
            match self.table.delete_row(owner, &row.row_key).await {
                Ok(()) => deleted += 1,
                Err(e) if e.is_not_found() => {
                    debug!("Row {}/{} already gone", owner, row.row_key);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(deleted)
    }

    /// Insert one freshly keyed row per task
    pub(crate) async fn insert_all(&self, owner: &str, tasks: &[Task]) -> StoreResult<()> {
        for (written, task) in tasks.iter().enumerate() {
            let entity = TableEntity::new(owner, Uuid::new_v4().to_string())
                .with_property(NAME_PROPERTY, task.name.clone())
                .with_property(STATUS_PROPERTY, task.status.as_str());

            if let Err(e) = self.table.insert_row(&entity).await {
                warn!(
                    "Insert failed for {} after {} of {} tasks; list is incomplete",
                    owner,
                    written,
                    tasks.len()
                );
                return Err(e);
            }
        }

        Ok(())
    }
}

fn task_from_row(row: &TableEntity) -> Result<Task, TaskError> {
    let name = row.property(NAME_PROPERTY);
    let status = row
        .property(STATUS_PROPERTY)
        .and_then(|status| status.parse::<TaskStatus>().ok());

    match (name, status) {
        (Some(name), Some(status)) => Ok(Task {
            name: name.to_string(),
            status,
        }),
        _ => Err(TaskError::Corrupt(format!(
            "{}/{}",
            row.partition_key, row.row_key
        ))),
    }
}
