//! API models for request and response payloads

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Progress of a task. Serialized with the display strings the frontend uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "Not Started")]
    NotStarted,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Completed")]
    Completed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [
        TaskStatus::NotStarted,
        TaskStatus::InProgress,
        TaskStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "Not Started",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "task status must be one of {}",
                    TaskStatus::ALL.map(|status| status.as_str()).join(", ")
                )
            })
    }
}

/// A validated task
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Task {
    pub name: String,
    pub status: TaskStatus,
}

/// A task as submitted by the client, before validation
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
}

/// Request to replace the caller's task list
#[derive(Debug, Deserialize)]
pub struct ReplaceTasksRequest {
    pub tasks: Vec<TaskInput>,
}

/// Response for task listing
#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    pub username: String,
    pub tasks: Vec<Task>,
}

/// Response for a completed replace
#[derive(Debug, Serialize)]
pub struct ReplaceTasksResponse {
    pub message: String,
    pub username: String,
    pub count: usize,
}
