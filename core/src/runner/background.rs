use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::json;

use crate::executor::{panic_message, ConsultationRequest, Orchestrator, ProgressSink};
use crate::state::TaskStore;

/// Runs a future detached from the caller.
pub trait Spawner: Send + Sync {
    fn spawn(&self, task: BoxFuture<'static, ()>);
}

/// Spawns onto the ambient tokio runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSpawner;

impl Spawner for TokioSpawner {
    fn spawn(&self, task: BoxFuture<'static, ()>) {
        tokio::spawn(task);
    }
}

/// Forwards orchestrator progress into the task store.
///
/// A store error never aborts the run; it is logged and the pipeline continues.
pub struct RegistryProgress {
    store: Arc<dyn TaskStore>,
    task_id: String,
}

impl RegistryProgress {
    pub fn new(store: Arc<dyn TaskStore>, task_id: impl Into<String>) -> Self {
        Self {
            store,
            task_id: task_id.into(),
        }
    }
}

#[async_trait]
impl ProgressSink for RegistryProgress {
    async fn report(&self, stage: &str, percent: u8) {
        if let Err(err) = self
            .store
            .update_progress(&self.task_id, stage, i32::from(percent))
            .await
        {
            tracing::warn!(
                target: "consilium.runner",
                task_id = %self.task_id,
                stage = %stage,
                error.kind = "registry.progress",
                error.message = %err,
                "failed to record progress"
            );
        }
    }
}

/// Adapter that turns one orchestration call into registry transitions.
///
/// Holds no pipeline logic. Every outcome, panics included, ends as a
/// `complete` or `fail` on the task record and nothing propagates to the caller.
pub struct BackgroundRunner {
    store: Arc<dyn TaskStore>,
    orchestrator: Arc<Orchestrator>,
}

impl BackgroundRunner {
    pub fn new(store: Arc<dyn TaskStore>, orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            store,
            orchestrator,
        }
    }

    /// Run the orchestration for an existing task to a terminal state.
    pub async fn run(&self, task_id: &str, request: ConsultationRequest) {
        let sink = RegistryProgress::new(self.store.clone(), task_id);
        sink.report("Starting consultation", 0).await;

        let outcome = AssertUnwindSafe(self.orchestrator.run(&request, &sink))
            .catch_unwind()
            .await;

        let recorded = match outcome {
            Ok(Ok(result)) => {
                tracing::info!(
                    target: "consilium.runner",
                    task_id = %task_id,
                    elapsed_ms = result.metadata.elapsed_ms,
                    "consultation completed"
                );
                self.store.complete(task_id, result).await
            }
            Ok(Err(err)) => {
                tracing::warn!(
                    target: "consilium.runner",
                    task_id = %task_id,
                    error.kind = err.kind(),
                    error.message = %err,
                    "consultation failed"
                );
                self.store
                    .fail(task_id, &err.to_string(), Some(json!({ "kind": err.kind() })))
                    .await
            }
            Err(payload) => {
                let detail = panic_message(payload.as_ref());
                tracing::error!(
                    target: "consilium.runner",
                    task_id = %task_id,
                    error.kind = "panic",
                    error.message = %detail,
                    "consultation panicked"
                );
                self.store
                    .fail(
                        task_id,
                        &format!("internal error: {detail}"),
                        Some(json!({ "kind": "panic", "detail": detail })),
                    )
                    .await
            }
        };

        if let Err(err) = recorded {
            tracing::error!(
                target: "consilium.runner",
                task_id = %task_id,
                error.kind = "registry.terminal",
                error.message = %err,
                "failed to record terminal state"
            );
        }
    }

    /// Hand the run to `spawner` and return immediately.
    pub fn dispatch(
        self: &Arc<Self>,
        spawner: &dyn Spawner,
        task_id: String,
        request: ConsultationRequest,
    ) {
        let runner = Arc::clone(self);
        spawner.spawn(Box::pin(async move {
            runner.run(&task_id, request).await;
        }));
    }
}
