use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::config::AppConfig;
use crate::error::ServiceError;
use crate::executor::traits::{AnswerCompiler, KnowledgeRetriever, SpecialistRegistry};
use crate::executor::Orchestrator;
use crate::polling::PollingService;
use crate::runner::{ConsultationService, Spawner, TokioSpawner};
use crate::state::{spawn_sweeper, TaskRegistry, TaskStore};

/// Collaborators the orchestrator consumes.
#[derive(Clone)]
pub struct Services {
    pub specialists: Arc<dyn SpecialistRegistry>,
    pub retriever: Arc<dyn KnowledgeRetriever>,
    pub compiler: Arc<dyn AnswerCompiler>,
}

#[async_trait::async_trait]
pub trait ServicesFactory: Send + Sync {
    async fn build_services(&self, cfg: &AppConfig) -> Result<Services, ServiceError>;
}

/// Process-wide handles, built once at startup and passed explicitly.
#[derive(Clone)]
pub struct AppContext {
    cfg: AppConfig,
    registry: TaskRegistry,
    orchestrator: Arc<Orchestrator>,
    consultations: ConsultationService,
    polling: PollingService,
}

impl AppContext {
    pub async fn new(
        cfg: AppConfig,
        services_factory: Arc<dyn ServicesFactory>,
    ) -> Result<Self, ServiceError> {
        let services = services_factory.build_services(&cfg).await?;
        Ok(Self::with_services(cfg, services, Arc::new(TokioSpawner)))
    }

    pub fn with_services(cfg: AppConfig, services: Services, spawner: Arc<dyn Spawner>) -> Self {
        let registry = TaskRegistry::new();
        let store: Arc<dyn TaskStore> = Arc::new(registry.clone());

        let orchestrator = Arc::new(Orchestrator::new(
            services.specialists,
            services.retriever,
            services.compiler,
            cfg.orchestrator.clone(),
        ));
        let consultations = ConsultationService::new(store.clone(), orchestrator.clone(), spawner);
        let polling = PollingService::new(store);

        Self {
            cfg,
            registry,
            orchestrator,
            consultations,
            polling,
        }
    }

    pub fn cfg(&self) -> &AppConfig {
        &self.cfg
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    pub fn orchestrator(&self) -> &Arc<Orchestrator> {
        &self.orchestrator
    }

    pub fn consultations(&self) -> &ConsultationService {
        &self.consultations
    }

    pub fn polling(&self) -> &PollingService {
        &self.polling
    }

    /// Start the retention sweeper if `[registry] sweep_interval_secs` is non-zero.
    pub fn spawn_retention_sweeper(&self) -> Option<JoinHandle<()>> {
        let interval = self.cfg.registry.sweep_interval()?;
        tracing::info!(
            target: "consilium.registry",
            interval_secs = interval.as_secs(),
            max_terminal_age_secs = self.cfg.registry.max_terminal_age_secs,
            keep_recent = self.cfg.registry.keep_recent,
            "retention sweeper started"
        );
        Some(spawn_sweeper(
            self.registry.clone(),
            self.cfg.registry.retention_policy(),
            interval,
        ))
    }
}
