//! 状态转换规则和验证

use super::types::TaskStatus;
use thiserror::Error;

/// 状态转换错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Invalid transition from {from:?} to {to:?}")]
    InvalidTransition { from: TaskStatus, to: TaskStatus },
    #[error("Cannot transition from terminal state {state:?}")]
    FromTerminalState { state: TaskStatus },
}

/// 状态转换
pub struct TaskTransition;

impl TaskTransition {
    /// 验证状态转换是否合法
    pub fn validate(from: TaskStatus, to: TaskStatus) -> Result<(), TransitionError> {
        // 终态不可变
        if from.is_terminal() {
            return Err(TransitionError::FromTerminalState { state: from });
        }

        let is_valid = match (from, to) {
            (TaskStatus::Created, TaskStatus::Running) => true,
            // 进度更新
            (TaskStatus::Running, TaskStatus::Running) => true,
            // 预检失败时直接从 Created 进入 Failed
            (_, TaskStatus::Completed) | (_, TaskStatus::Failed) => true,
            _ => false,
        };

        if is_valid {
            Ok(())
        } else {
            Err(TransitionError::InvalidTransition { from, to })
        }
    }
}
