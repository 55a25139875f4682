//! Consultation orchestrator
//!
//! Runs one question through a fixed four-stage pipeline and reports real
//! progress through fixed stage bands:
//!
//! ```text
//! ConsultationRequest
//!   ↓
//! Orchestrator::validate()            (pre-flight, fatal)
//!   ↓
//! KnowledgeRetriever::retrieve()      5 → 20   (failure = empty context)
//!   ↓
//! consult_batch(experts)              20 → 50  (skipped when none selected)
//!   ↓
//! consult_batch(counsel)              50 → 80  (skipped when none selected)
//!   ↓
//! AnswerCompiler::compile()           80 → 95  (fatal)
//!   ↓
//! OrchestrationResult                 100 is set by the caller on completion
//! ```

mod engine;
pub mod progress;
mod scheduler;
pub mod traits;
pub mod types;

pub use engine::Orchestrator;
pub use progress::{
    band_for, band_increments, NoopProgress, ProgressSink, StageBand, COMPILATION_BAND,
    COUNSEL_BAND, EXPERT_BAND, PROGRESS_COMPLETE, RETRIEVAL_BAND,
};
pub use scheduler::{consult_batch, BatchOptions, ConsultSlot};
pub(crate) use scheduler::panic_message;
pub use types::{
    CategoryReport, ConsultationRequest, ContextSnippet, ExecutionMetadata, Opinion,
    OrchestrationResult, OutcomeStatus, SpecialistCategory, SpecialistOutcome,
    SpecialistSelection,
};
