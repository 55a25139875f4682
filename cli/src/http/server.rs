//! HTTP服务器生命周期管理

use super::{
    middleware::{create_middleware_stack, request_logger},
    routes::create_router,
    AppState,
};
use crate::commands::cli::ServeArgs;
use axum::middleware;
use axum::Router;
use consilium_core::api::{AppContext, CliError, TaskEvent, TaskRegistry};
use std::net::SocketAddr;
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::info;

/// HTTP服务器配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// CLI 参数优先，配置文件作为默认值
    pub fn resolve(args: &ServeArgs, ctx: &AppContext) -> Self {
        let cfg = &ctx.cfg().http_server;
        Self {
            host: args.host.clone().unwrap_or_else(|| cfg.host.clone()),
            port: args.port.unwrap_or(cfg.port),
        }
    }
}

/// 路由 + 中间件，测试中可直接使用
pub fn build_app(state: AppState) -> Router {
    create_router(state)
        .layer(middleware::from_fn(request_logger))
        .layer(TraceLayer::new_for_http())
        .layer(create_middleware_stack())
}

/// 把注册表事件写进日志；注册表本身不记录生命周期日志
pub fn spawn_event_logger(registry: &TaskRegistry) -> JoinHandle<()> {
    let mut events = registry.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(TaskEvent::Created { task_id, .. }) => {
                    tracing::debug!(target: "consilium.registry", task_id = %task_id, "task created");
                }
                Ok(TaskEvent::Progress {
                    task_id,
                    stage,
                    progress_percent,
                    ..
                }) => {
                    tracing::debug!(
                        target: "consilium.registry",
                        task_id = %task_id,
                        progress_percent,
                        stage = %stage,
                        "task progress"
                    );
                }
                Ok(TaskEvent::Completed {
                    task_id,
                    duration_ms,
                    ..
                }) => {
                    tracing::info!(
                        target: "consilium.registry",
                        task_id = %task_id,
                        duration_ms,
                        "task completed"
                    );
                }
                Ok(TaskEvent::Failed { task_id, error, .. }) => {
                    tracing::warn!(
                        target: "consilium.registry",
                        task_id = %task_id,
                        error.message = %error,
                        "task failed"
                    );
                }
                Ok(TaskEvent::Evicted { task_id, .. }) => {
                    tracing::debug!(target: "consilium.registry", task_id = %task_id, "task evicted");
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(target: "consilium.registry", skipped, "event logger lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

/// 处理 serve 命令
pub async fn handle_serve(args: ServeArgs, ctx: AppContext) -> Result<(), CliError> {
    let config = ServerConfig::resolve(&args, &ctx);

    let logger = spawn_event_logger(ctx.registry());
    let sweeper = ctx.spawn_retention_sweeper();

    let state = AppState::new(ctx);
    let served = start_server(config, state).await;

    logger.abort();
    if let Some(handle) = sweeper {
        handle.abort();
    }
    served
}

/// 启动HTTP服务器，直到收到 Ctrl+C / SIGTERM
pub async fn start_server(config: ServerConfig, state: AppState) -> Result<(), CliError> {
    let app = build_app(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| CliError::Config(format!("invalid listen address: {e}")))?;

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(target: "consilium.http", "HTTP server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::select! {
                _ = signal::ctrl_c() => {
                    info!(target: "consilium.http", "Received Ctrl+C signal");
                }
                _ = wait_for_sigterm() => {
                    info!(target: "consilium.http", "Received SIGTERM signal");
                }
            }
            info!(target: "consilium.http", "Starting graceful shutdown...");
        })
        .await?;

    info!(target: "consilium.http", "Server shutdown complete");
    Ok(())
}

/// 等待 SIGTERM 信号（Unix系统）
#[cfg(unix)]
async fn wait_for_sigterm() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            tracing::warn!(target: "consilium.http", "failed to install SIGTERM handler: {}", e);
            std::future::pending::<()>().await
        }
    }
}

/// Windows 系统不支持 SIGTERM，使用空操作
#[cfg(not(unix))]
async fn wait_for_sigterm() {
    std::future::pending::<()>().await
}
