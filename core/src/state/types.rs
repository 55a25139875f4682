//! 任务状态类型定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::executor::types::{ConsultationRequest, OrchestrationResult};

/// 任务状态：Created → Running → {Completed | Failed}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Created,
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Running => "RUNNING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
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
        match s.trim().to_ascii_uppercase().as_str() {
            "CREATED" => Ok(Self::Created),
            "RUNNING" => Ok(Self::Running),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            other => Err(format!("unknown task status: {other}")),
        }
    }
}

/// 失败任务的错误信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskError {
    pub message: String,
    /// 可选的诊断元数据
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<serde_json::Value>,
}

/// 任务记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub status: TaskStatus,
    /// 当前阶段描述（仅 Running 时更新）
    pub stage_description: Option<String>,
    /// 0..=100，Running 期间单调不减
    pub progress_percent: u8,
    /// 创建时写入，之后不再修改
    pub input: ConsultationRequest,
    /// 仅 Completed 时存在
    pub result: Option<OrchestrationResult>,
    /// 仅 Failed 时存在
    pub error: Option<TaskError>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// 进入终态的时间
    pub finished_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(id: String, input: ConsultationRequest) -> Self {
        let now = Utc::now();
        Self {
            id,
            status: TaskStatus::Created,
            stage_description: None,
            progress_percent: 0,
            input,
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
            finished_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.message.as_str())
    }

    /// result/error 与状态是否一致
    pub fn is_consistent(&self) -> bool {
        let shape_ok = match self.status {
            TaskStatus::Created | TaskStatus::Running => {
                self.result.is_none() && self.error.is_none()
            }
            TaskStatus::Completed => {
                self.result.is_some() && self.error.is_none() && self.progress_percent == 100
            }
            TaskStatus::Failed => self.result.is_none() && self.error.is_some(),
        };
        shape_ok && self.progress_percent <= 100
    }
}

/// 任务统计
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStats {
    pub created: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
}

impl TaskStats {
    pub fn total(&self) -> usize {
        self.created + self.running + self.completed + self.failed
    }
}

/// 状态事件
#[derive(Debug, Clone, Serialize)]
pub enum TaskEvent {
    Created {
        task_id: String,
        timestamp: DateTime<Utc>,
    },
    Progress {
        task_id: String,
        stage: String,
        progress_percent: u8,
        timestamp: DateTime<Utc>,
    },
    Completed {
        task_id: String,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
    Failed {
        task_id: String,
        error: String,
        timestamp: DateTime<Utc>,
    },
    Evicted {
        task_id: String,
        timestamp: DateTime<Utc>,
    },
}

impl TaskEvent {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Created { timestamp, .. }
            | Self::Progress { timestamp, .. }
            | Self::Completed { timestamp, .. }
            | Self::Failed { timestamp, .. }
            | Self::Evicted { timestamp, .. } => *timestamp,
        }
    }

    pub fn task_id(&self) -> &str {
        match self {
            Self::Created { task_id, .. }
            | Self::Progress { task_id, .. }
            | Self::Completed { task_id, .. }
            | Self::Failed { task_id, .. }
            | Self::Evicted { task_id, .. } => task_id,
        }
    }
}
