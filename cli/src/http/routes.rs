//! HTTP路由handlers

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Local;
use consilium_core::api::{OrchestrationResult, SpecialistInfo, StartReceipt, StatusView};

use crate::http::{
    models::*,
    state::AppState,
    validation::{clamp_limit, parse_status_filter, validate_start_request, validate_task_id},
};

/// 创建所有路由
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/consultations", post(start_handler))
        .route("/api/v1/consultations/:id/status", get(status_handler))
        .route("/api/v1/consultations/:id/result", get(result_handler))
        .route("/api/v1/tasks", get(list_tasks_handler))
        .route("/api/v1/tasks/:id", delete(evict_task_handler))
        .route("/api/v1/specialists", get(specialists_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// 失败时计入错误统计（NotReady 不算错误）
fn tally<T>(state: &AppState, res: Result<T, HttpServerError>) -> Result<T, HttpServerError> {
    if let Err(e) = &res {
        if !matches!(e, HttpServerError::NotReady { .. }) {
            state.record_error();
        }
    }
    res
}

/// POST /api/v1/consultations - 启动咨询，立即返回 task_id
async fn start_handler(
    State(state): State<AppState>,
    payload: Result<Json<StartConsultationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<StartReceipt>>), HttpServerError> {
    state.record_request("POST /api/v1/consultations");
    let res = start_inner(&state, payload).await;
    tally(&state, res)
}

async fn start_inner(
    state: &AppState,
    payload: Result<Json<StartConsultationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<StartReceipt>>), HttpServerError> {
    let Json(req) = payload.map_err(|e| HttpServerError::InvalidRequest(e.body_text()))?;
    validate_start_request(&req)?;

    let receipt = state.ctx.consultations().start(req.into()).await?;
    if receipt.is_rejected() {
        return Err(HttpServerError::Rejected {
            task_id: receipt.task_id,
            message: receipt.error_message.unwrap_or_default(),
        });
    }
    Ok((StatusCode::ACCEPTED, Json(ApiResponse::ok(receipt))))
}

/// GET /api/v1/consultations/:id/status
async fn status_handler(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<ApiResponse<StatusView>>, HttpServerError> {
    state.record_request("GET /api/v1/consultations/:id/status");
    let res = async {
        validate_task_id(&task_id)?;
        let view = state.ctx.polling().status(&task_id).await?;
        Ok::<_, HttpServerError>(Json(ApiResponse::ok(view)))
    }
    .await;
    tally(&state, res)
}

/// GET /api/v1/consultations/:id/result - 200 完成 / 202 未就绪 / 409 失败
async fn result_handler(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<ApiResponse<OrchestrationResult>>, HttpServerError> {
    state.record_request("GET /api/v1/consultations/:id/result");
    let res = async {
        validate_task_id(&task_id)?;
        let result = state.ctx.polling().result(&task_id).await?;
        Ok::<_, HttpServerError>(Json(ApiResponse::ok(result)))
    }
    .await;
    tally(&state, res)
}

/// GET /api/v1/tasks?status=&limit= - 调试用任务列表（按创建时间倒序）
async fn list_tasks_handler(
    State(state): State<AppState>,
    Query(query): Query<ListTasksQuery>,
) -> Result<Json<ApiResponse<Vec<TaskSummary>>>, HttpServerError> {
    state.record_request("GET /api/v1/tasks");
    let res = async {
        let filter = parse_status_filter(query.status.as_deref())?;
        let limit = clamp_limit(query.limit);
        let tasks = state.ctx.registry().list(filter, Some(limit)).await;
        Ok::<_, HttpServerError>(Json(ApiResponse::ok(
            tasks.iter().map(TaskSummary::from).collect(),
        )))
    }
    .await;
    tally(&state, res)
}

/// DELETE /api/v1/tasks/:id - 仅允许移除终态任务
async fn evict_task_handler(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<ApiResponse<TaskSummary>>, HttpServerError> {
    state.record_request("DELETE /api/v1/tasks/:id");
    let res = async {
        validate_task_id(&task_id)?;
        let registry = state.ctx.registry();
        let task = registry.get(&task_id).await?;
        if !task.status.is_terminal() {
            return Err(HttpServerError::Conflict(format!(
                "task {task_id} is {} and cannot be evicted",
                task.status
            )));
        }
        let removed = registry.evict(&task_id).await?;
        tracing::info!(target: "consilium.http", task_id = %task_id, "task evicted");
        Ok::<_, HttpServerError>(Json(ApiResponse::ok(TaskSummary::from(&removed))))
    }
    .await;
    tally(&state, res)
}

/// GET /api/v1/specialists
async fn specialists_handler(
    State(state): State<AppState>,
) -> Json<ApiResponse<Vec<SpecialistInfo>>> {
    state.record_request("GET /api/v1/specialists");
    Json(ApiResponse::ok(state.ctx.orchestrator().catalog()))
}

/// GET /health - 健康检查
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    state.record_request("GET /health");
    let tasks = state.ctx.registry().stats().await;

    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_seconds: state.stats.uptime_seconds(),
        requests_handled: state.stats.requests_total(),
        errors_total: state.stats.errors_total(),
        requests_by_endpoint: state
            .stats
            .requests_by_endpoint()
            .into_iter()
            .map(|(endpoint, n)| (endpoint.to_string(), n))
            .collect(),
        tasks,
        timestamp: Local::now().to_rfc3339(),
    })
}
