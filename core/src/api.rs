//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `consilium_core::api` instead of reaching into internal modules.

pub use crate::config::{
    apply_env_overrides, load_default, load_from_path, AppConfig, CompilerConfig,
    CompilerProvider, HttpServerConfig, LlmConfig, LoggingConfig, OrchestratorConfig,
    RegistryConfig, RetrievalConfig, SpecialistConfig,
};
pub use crate::context::{AppContext, Services, ServicesFactory};
pub use crate::error::{
    CliError, CompilationError, OrchestrationError, PollError, RegistryError, RetrievalError,
    ServiceError, SpecialistError, ValidationError,
};
pub use crate::executor::traits::{
    AnswerCompiler, KnowledgeRetriever, NoopRetriever, Specialist, SpecialistInfo,
    SpecialistRegistry,
};
pub use crate::executor::{
    band_increments, CategoryReport, ConsultationRequest, ContextSnippet, ExecutionMetadata,
    NoopProgress, Opinion, OrchestrationResult, Orchestrator, OutcomeStatus, ProgressSink,
    SpecialistCategory, SpecialistOutcome, SpecialistSelection,
};
pub use crate::polling::{PollingService, StatusView};
pub use crate::runner::{
    BackgroundRunner, ConsultationService, RegistryProgress, Spawner, StartReceipt, TokioSpawner,
};
pub use crate::state::{
    RetentionPolicy, Task, TaskError, TaskEvent, TaskRegistry, TaskStats, TaskStatus, TaskStore,
};
