//! Read-only status/result boundary over the task store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PollError;
use crate::executor::OrchestrationResult;
use crate::state::{Task, TaskStatus, TaskStore};

/// Cheap status snapshot for one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusView {
    pub task_id: String,
    pub status: TaskStatus,
    /// Only while running.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage_description: Option<String>,
    /// 0 when created, 100 when completed.
    pub progress_percent: u8,
    /// Only when failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Task> for StatusView {
    fn from(task: &Task) -> Self {
        let stage_description = match task.status {
            TaskStatus::Running => task.stage_description.clone(),
            _ => None,
        };
        let error_message = match task.status {
            TaskStatus::Failed => task.error_message().map(str::to_string),
            _ => None,
        };
        Self {
            task_id: task.id.clone(),
            status: task.status,
            stage_description,
            progress_percent: task.progress_percent,
            error_message,
            updated_at: task.updated_at,
        }
    }
}

#[derive(Clone)]
pub struct PollingService {
    store: Arc<dyn TaskStore>,
}

impl PollingService {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    pub async fn status(&self, task_id: &str) -> Result<StatusView, PollError> {
        let task = self
            .store
            .get(task_id)
            .await
            .map_err(PollError::from_store)?;
        Ok(StatusView::from(&task))
    }

    /// The full result once completed.
    ///
    /// `NotReady` while created or running. A failed task yields `Failed` with
    /// the same message [`status`](Self::status) reports.
    pub async fn result(&self, task_id: &str) -> Result<OrchestrationResult, PollError> {
        let task = self
            .store
            .get(task_id)
            .await
            .map_err(PollError::from_store)?;

        match task.status {
            TaskStatus::Completed => task.result.ok_or_else(|| {
                PollError::Failed {
                    task_id: task.id.clone(),
                    message: "task completed without a stored result".to_string(),
                }
            }),
            TaskStatus::Failed => Err(PollError::Failed {
                message: task.error_message().unwrap_or_default().to_string(),
                task_id: task.id,
            }),
            TaskStatus::Created | TaskStatus::Running => Err(PollError::NotReady {
                task_id: task.id,
                status: task.status,
                progress_percent: task.progress_percent,
            }),
        }
    }
}
