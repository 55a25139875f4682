//! HTTP API数据模型（服务端与远程客户端共用）

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use consilium_core::api::{
    ConsultationRequest, PollError, RegistryError, SpecialistSelection, Task, TaskStats,
    TaskStatus,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============= Envelope =============

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// 错误响应体；task 相关错误附带 task_id / status / progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub error_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_percent: Option<u8>,
}

impl ErrorBody {
    fn new(error: String, error_code: &str) -> Self {
        Self {
            success: false,
            error,
            error_code: error_code.to_string(),
            task_id: None,
            status: None,
            progress_percent: None,
        }
    }
}

// ============= Start =============

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StartConsultationRequest {
    pub question: String,
    #[serde(default)]
    pub specialists: SpecialistSelection,
    #[serde(default)]
    pub document_scope: Option<Vec<String>>,
}

impl From<StartConsultationRequest> for ConsultationRequest {
    fn from(body: StartConsultationRequest) -> Self {
        let request = ConsultationRequest::new(body.question, body.specialists);
        match body.document_scope {
            Some(scope) => request.with_document_scope(scope),
            None => request,
        }
    }
}

impl From<&ConsultationRequest> for StartConsultationRequest {
    fn from(request: &ConsultationRequest) -> Self {
        Self {
            question: request.question.clone(),
            specialists: request.specialists.clone(),
            document_scope: request.document_scope.clone(),
        }
    }
}

// ============= Tasks =============

#[derive(Debug, Default, Deserialize)]
pub struct ListTasksQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// 列表视图：不含结果正文
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSummary {
    pub task_id: String,
    pub status: TaskStatus,
    pub progress_percent: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage_description: Option<String>,
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl From<&Task> for TaskSummary {
    fn from(task: &Task) -> Self {
        Self {
            task_id: task.id.clone(),
            status: task.status,
            progress_percent: task.progress_percent,
            stage_description: task.stage_description.clone(),
            question: task.input.question.clone(),
            error_message: task.error_message().map(str::to_string),
            created_at: task.created_at,
            updated_at: task.updated_at,
            finished_at: task.finished_at,
        }
    }
}

// ============= Health =============

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_seconds: f64,
    pub requests_handled: u64,
    pub errors_total: u64,
    pub requests_by_endpoint: BTreeMap<String, u64>,
    pub tasks: TaskStats,
    pub timestamp: String,
}

// ============= Error Handling =============

#[derive(Debug)]
pub enum HttpServerError {
    InvalidRequest(String),
    /// 预检失败：任务已创建并处于 Failed
    Rejected { task_id: String, message: String },
    NotFound(String),
    NotReady {
        task_id: String,
        status: TaskStatus,
        progress_percent: u8,
    },
    TaskFailed { task_id: String, message: String },
    Conflict(String),
    Internal(String),
}

impl From<PollError> for HttpServerError {
    fn from(err: PollError) -> Self {
        match err {
            PollError::NotFound(task_id) => Self::NotFound(task_id),
            PollError::NotReady {
                task_id,
                status,
                progress_percent,
            } => Self::NotReady {
                task_id,
                status,
                progress_percent,
            },
            PollError::Failed { task_id, message } => Self::TaskFailed { task_id, message },
            PollError::Store(e) => Self::Internal(e.to_string()),
        }
    }
}

impl From<RegistryError> for HttpServerError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(task_id) => Self::NotFound(task_id),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl HttpServerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Rejected { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::NotReady { .. } => StatusCode::ACCEPTED,
            Self::TaskFailed { .. } | Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(self) -> ErrorBody {
        match self {
            Self::InvalidRequest(msg) => ErrorBody::new(msg, "INVALID_REQUEST"),
            Self::Rejected { task_id, message } => ErrorBody {
                task_id: Some(task_id),
                status: Some(TaskStatus::Failed),
                ..ErrorBody::new(message, "VALIDATION_FAILED")
            },
            Self::NotFound(task_id) => ErrorBody {
                task_id: Some(task_id.clone()),
                ..ErrorBody::new(format!("task not found: {task_id}"), "TASK_NOT_FOUND")
            },
            Self::NotReady {
                task_id,
                status,
                progress_percent,
            } => ErrorBody {
                task_id: Some(task_id),
                status: Some(status),
                progress_percent: Some(progress_percent),
                ..ErrorBody::new("result not ready".to_string(), "NOT_READY")
            },
            Self::TaskFailed { task_id, message } => ErrorBody {
                task_id: Some(task_id),
                status: Some(TaskStatus::Failed),
                ..ErrorBody::new(message, "TASK_FAILED")
            },
            Self::Conflict(msg) => ErrorBody::new(msg, "CONFLICT"),
            Self::Internal(msg) => ErrorBody::new(msg, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for HttpServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(self.body())).into_response()
    }
}
