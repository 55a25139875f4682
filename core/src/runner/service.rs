use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::error::{OrchestrationError, RegistryError};
use crate::executor::{ConsultationRequest, Orchestrator};
use crate::state::{TaskStatus, TaskStore};

use super::background::{BackgroundRunner, Spawner};

/// What `start` hands back: enough to begin polling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartReceipt {
    pub task_id: String,
    pub status: TaskStatus,
    /// Set when pre-flight validation failed and the task is already terminal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl StartReceipt {
    pub fn is_rejected(&self) -> bool {
        self.status == TaskStatus::Failed
    }
}

/// Entry point for starting consultations. Never waits on orchestration work.
#[derive(Clone)]
pub struct ConsultationService {
    store: Arc<dyn TaskStore>,
    orchestrator: Arc<Orchestrator>,
    runner: Arc<BackgroundRunner>,
    spawner: Arc<dyn Spawner>,
}

impl ConsultationService {
    pub fn new(
        store: Arc<dyn TaskStore>,
        orchestrator: Arc<Orchestrator>,
        spawner: Arc<dyn Spawner>,
    ) -> Self {
        let runner = Arc::new(BackgroundRunner::new(store.clone(), orchestrator.clone()));
        Self {
            store,
            orchestrator,
            runner,
            spawner,
        }
    }

    pub async fn start(&self, request: ConsultationRequest) -> Result<StartReceipt, RegistryError> {
        self.start_with_id(Uuid::new_v4().to_string(), request).await
    }

    /// Like [`start`](Self::start) with a caller-chosen id. `DuplicateTask` if it exists.
    pub async fn start_with_id(
        &self,
        task_id: String,
        request: ConsultationRequest,
    ) -> Result<StartReceipt, RegistryError> {
        self.store.create(&task_id, request.clone()).await?;

        if let Err(err) = self.orchestrator.validate(&request) {
            let message = OrchestrationError::from(err).to_string();
            tracing::info!(
                target: "consilium.runner",
                task_id = %task_id,
                error.kind = "validation",
                error.message = %message,
                "consultation rejected"
            );
            self.store
                .fail(&task_id, &message, Some(json!({ "kind": "validation" })))
                .await?;
            return Ok(StartReceipt {
                task_id,
                status: TaskStatus::Failed,
                error_message: Some(message),
            });
        }

        self.store
            .update_progress(&task_id, "Queued for consultation", 0)
            .await?;

        tracing::info!(
            target: "consilium.runner",
            task_id = %task_id,
            experts = request.specialists.experts.len(),
            counsel = request.specialists.counsel.len(),
            "consultation dispatched"
        );
        self.runner.dispatch(self.spawner.as_ref(), task_id.clone(), request);

        Ok(StartReceipt {
            task_id,
            status: TaskStatus::Running,
            error_message: None,
        })
    }
}
