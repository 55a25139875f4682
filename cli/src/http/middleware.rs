//! HTTP中间件：CORS、超时、请求ID与访问日志

use axum::{
    body::Body,
    http::{header, HeaderName, HeaderValue, Method, Request},
    middleware::Next,
    response::Response,
};
use std::time::{Duration, Instant};
use tower::layer::util::{Identity, Stack};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// 咨询在后台执行，HTTP 请求本身只做登记与查询
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const LOCAL_ORIGINS: [&str; 4] = [
    "http://localhost",
    "https://localhost",
    "http://127.0.0.1",
    "https://127.0.0.1",
];

pub type MiddlewareStack = Stack<TimeoutLayer, Stack<CorsLayer, Identity>>;

/// CORS（仅本机来源）+ 超时
pub fn create_middleware_stack() -> MiddlewareStack {
    ServiceBuilder::new()
        .layer(cors_layer())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .into_inner()
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(|origin: &HeaderValue, _| {
            origin.to_str().is_ok_and(is_local_origin)
        }))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)])
        .max_age(Duration::from_secs(3600))
}

fn is_local_origin(origin: &str) -> bool {
    LOCAL_ORIGINS.iter().any(|prefix| {
        origin
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(':') || rest.starts_with('/'))
    })
}

/// 沿用调用方的 x-request-id，否则生成一个；写回响应头
fn request_id(req: &Request<Body>) -> HeaderValue {
    req.headers()
        .get(REQUEST_ID_HEADER)
        .filter(|v| !v.is_empty() && v.len() <= 128)
        .cloned()
        .or_else(|| HeaderValue::from_str(&uuid::Uuid::new_v4().to_string()).ok())
        .unwrap_or_else(|| HeaderValue::from_static("unknown"))
}

/// 访问日志：4xx/5xx 记为 warn，其余 info
pub async fn request_logger(req: Request<Body>, next: Next) -> Response {
    let id = request_id(&req);
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let mut response = next.run(req).await;
    let status = response.status().as_u16();
    let elapsed_ms = started.elapsed().as_millis() as u64;
    let id_text = id.to_str().unwrap_or("-").to_string();

    if status >= 400 {
        tracing::warn!(
            target: "consilium.http",
            request_id = %id_text,
            method = %method,
            path = %path,
            status,
            elapsed_ms,
            "request failed"
        );
    } else {
        tracing::info!(
            target: "consilium.http",
            request_id = %id_text,
            method = %method,
            path = %path,
            status,
            elapsed_ms,
            "request served"
        );
    }

    response.headers_mut().insert(REQUEST_ID_HEADER, id);
    response
}
