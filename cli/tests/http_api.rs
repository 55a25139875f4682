mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use consilium_cli::http::{build_app, AppState};
use consilium_core::api::{AppContext, TaskStatus};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio::sync::Notify;
use tower::ServiceExt;

fn app(ctx: &AppContext) -> Router {
    build_app(AppState::new(ctx.clone()))
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn start(app: &Router, body: Value) -> (StatusCode, Value) {
    call(app, "POST", "/api/v1/consultations", Some(body)).await
}

#[tokio::test]
async fn test_start_poll_and_fetch_result() {
    let ctx = common::context(Arc::new(Notify::new()));
    let app = app(&ctx);

    let (status, body) = start(
        &app,
        json!({
            "question": "Was the dismissal lawful?",
            "specialists": {"experts": ["medical"], "counsel": ["labor"]}
        }),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["status"], json!("RUNNING"));
    let task_id = body["data"]["task_id"].as_str().unwrap().to_string();

    assert_eq!(common::wait_terminal(&ctx, &task_id).await, TaskStatus::Completed);

    let (status, body) = call(&app, "GET", &format!("/api/v1/consultations/{task_id}/status"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], json!("COMPLETED"));
    assert_eq!(body["data"]["progress_percent"], json!(100));
    assert!(body["data"].get("stage_description").is_none());

    let (status, body) = call(&app, "GET", &format!("/api/v1/consultations/{task_id}/result"), None).await;
    assert_eq!(status, StatusCode::OK);
    let answer = body["data"]["answer"].as_str().unwrap();
    assert!(answer.contains("medical opinion"));
    assert!(answer.contains("labor opinion"));
    assert_eq!(body["data"]["metadata"]["compiler"], json!("digest"));
}

#[tokio::test]
async fn test_validation_failure_is_queryable() {
    let ctx = common::context(Arc::new(Notify::new()));
    let app = app(&ctx);

    let (status, body) = start(&app, json!({"question": "   "})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error_code"], json!("VALIDATION_FAILED"));
    assert_eq!(body["status"], json!("FAILED"));
    let task_id = body["task_id"].as_str().unwrap().to_string();
    let message = body["error"].clone();

    let (status, body) = call(&app, "GET", &format!("/api/v1/consultations/{task_id}/status"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], json!("FAILED"));
    assert_eq!(body["data"]["progress_percent"], json!(0));
    assert_eq!(body["data"]["error_message"], message);

    let (status, body) = call(&app, "GET", &format!("/api/v1/consultations/{task_id}/result"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error_code"], json!("TASK_FAILED"));
    assert_eq!(body["error"], message);
}

#[tokio::test]
async fn test_unknown_specialist_is_rejected() {
    let ctx = common::context(Arc::new(Notify::new()));
    let app = app(&ctx);

    let (status, body) = start(
        &app,
        json!({"question": "q", "specialists": {"counsel": ["maritime"]}}),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("maritime"));
}

#[tokio::test]
async fn test_result_not_ready_while_running() {
    let gate = Arc::new(Notify::new());
    let ctx = common::context(gate.clone());
    let app = app(&ctx);

    let (_, body) = start(
        &app,
        json!({"question": "q", "specialists": {"counsel": ["slow"]}}),
    )
    .await;
    let task_id = body["data"]["task_id"].as_str().unwrap().to_string();

    let (status, body) = call(&app, "GET", &format!("/api/v1/consultations/{task_id}/result"), None).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["error_code"], json!("NOT_READY"));
    assert_eq!(body["status"], json!("RUNNING"));
    assert!(body["progress_percent"].as_u64().unwrap() < 100);

    let (status, body) = call(&app, "DELETE", &format!("/api/v1/tasks/{task_id}"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error_code"], json!("CONFLICT"));

    gate.notify_one();
    assert_eq!(common::wait_terminal(&ctx, &task_id).await, TaskStatus::Completed);

    let (status, _) = call(&app, "DELETE", &format!("/api/v1/tasks/{task_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = call(&app, "GET", &format!("/api/v1/consultations/{task_id}/status"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_code"], json!("TASK_NOT_FOUND"));
}

#[tokio::test]
async fn test_bad_requests() {
    let ctx = common::context(Arc::new(Notify::new()));
    let app = app(&ctx);

    let (status, body) = call(&app, "POST", "/api/v1/consultations", Some(json!({"specialists": {}}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], json!("INVALID_REQUEST"));

    let (status, _) = call(&app, "GET", "/api/v1/consultations/bad%20id/status", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(&app, "GET", "/api/v1/tasks?status=paused", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_specialists_and_health() {
    let ctx = common::context(Arc::new(Notify::new()));
    let app = app(&ctx);

    let (_, body) = start(
        &app,
        json!({"question": "q", "specialists": {"experts": ["medical"]}}),
    )
    .await;
    let task_id = body["data"]["task_id"].as_str().unwrap().to_string();
    common::wait_terminal(&ctx, &task_id).await;
    start(&app, json!({"question": ""})).await;

    let (status, body) = call(&app, "GET", "/api/v1/tasks?status=completed", None).await;
    assert_eq!(status, StatusCode::OK);
    let tasks = body["data"].as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["task_id"], json!(task_id));
    assert_eq!(tasks[0]["question"], json!("q"));

    let (_, body) = call(&app, "GET", "/api/v1/specialists", None).await;
    let ids: Vec<_> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["medical", "labor", "slow"]);

    let (status, body) = call(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("ok"));
    assert_eq!(body["tasks"]["completed"], json!(1));
    assert_eq!(body["tasks"]["failed"], json!(1));
    assert_eq!(
        body["requests_by_endpoint"]["POST /api/v1/consultations"],
        json!(2)
    );
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let ctx = common::context(Arc::new(Notify::new()));
    let req = Request::builder()
        .uri("/health")
        .header("x-request-id", "trace-42")
        .body(Body::empty())
        .unwrap();
    let resp = app(&ctx).oneshot(req).await.unwrap();
    assert_eq!(resp.headers()["x-request-id"], "trace-42");

    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let resp = app(&ctx).oneshot(req).await.unwrap();
    assert!(resp.headers().contains_key("x-request-id"));
}
