use thiserror::Error;

use crate::state::TaskStatus;

/// Task registry errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("duplicate task id: {0}")]
    DuplicateTask(String),

    #[error("task not found: {0}")]
    NotFound(String),

    #[error("task {task_id} is already {status}")]
    AlreadyTerminal { task_id: String, status: TaskStatus },

    #[error("invalid transition for task {task_id}: {from} -> {to}")]
    InvalidTransition {
        task_id: String,
        from: TaskStatus,
        to: TaskStatus,
    },
}

/// Polling boundary errors. `NotReady` is a signal, not a failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PollError {
    #[error("task not found: {0}")]
    NotFound(String),

    #[error("task {task_id} is not ready ({status}, {progress_percent}%)")]
    NotReady {
        task_id: String,
        status: TaskStatus,
        progress_percent: u8,
    },

    /// Carries exactly the message `status()` reports for the failed task.
    #[error("{message}")]
    Failed { task_id: String, message: String },

    #[error("task store error: {0}")]
    Store(RegistryError),
}

impl PollError {
    pub(crate) fn from_store(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(task_id) => Self::NotFound(task_id),
            other => Self::Store(other),
        }
    }
}
