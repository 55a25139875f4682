use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use serde_json::json;
use tracing::Instrument;

use crate::config::OrchestratorConfig;
use crate::error::{CompilationError, OrchestrationError, RetrievalError, ValidationError};

use super::progress::{
    band_for, band_increments, ProgressSink, COMPILATION_BAND, RETRIEVAL_BAND,
};
use super::scheduler::{consult_batch, panic_message, BatchOptions, ConsultSlot};
use super::traits::{AnswerCompiler, KnowledgeRetriever, SpecialistInfo, SpecialistRegistry};
use super::types::{
    CategoryReport, ConsultationRequest, ContextSnippet, ExecutionMetadata, OrchestrationResult,
    SpecialistCategory, SpecialistOutcome,
};

/// Runs one consultation: retrieval, expert batch, counsel batch, compilation.
///
/// Holds no per-run state; a single instance is shared by every task.
pub struct Orchestrator {
    specialists: Arc<dyn SpecialistRegistry>,
    retriever: Arc<dyn KnowledgeRetriever>,
    compiler: Arc<dyn AnswerCompiler>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(
        specialists: Arc<dyn SpecialistRegistry>,
        retriever: Arc<dyn KnowledgeRetriever>,
        compiler: Arc<dyn AnswerCompiler>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            specialists,
            retriever,
            compiler,
            config,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn catalog(&self) -> Vec<SpecialistInfo> {
        self.specialists.list_available()
    }

    /// Pre-flight checks. Nothing is retrieved or consulted when this fails.
    pub fn validate(&self, request: &ConsultationRequest) -> Result<(), ValidationError> {
        if request.question.trim().is_empty() {
            return Err(ValidationError::EmptyQuestion);
        }

        for category in SpecialistCategory::ALL {
            let selected = request.specialists.ids(category);
            if selected.is_empty() {
                continue;
            }
            let mut valid = self.specialists.available_ids(category);
            let unknown: Vec<String> = selected
                .iter()
                .filter(|id| !valid.contains(*id))
                .cloned()
                .collect();
            if !unknown.is_empty() {
                valid.sort();
                return Err(ValidationError::UnknownSpecialists {
                    category,
                    unknown,
                    valid,
                });
            }
        }
        Ok(())
    }

    /// Run the full pipeline, reporting stage transitions into `progress`.
    ///
    /// Retrieval and specialist failures are absorbed. Only validation and
    /// compilation errors are returned.
    pub async fn run(
        &self,
        request: &ConsultationRequest,
        progress: &dyn ProgressSink,
    ) -> Result<OrchestrationResult, OrchestrationError> {
        self.validate(request)?;

        let span = tracing::info_span!(
            target: "consilium.executor",
            "consultation",
            experts = request.specialists.experts.len(),
            counsel = request.specialists.counsel.len(),
        );
        self.run_pipeline(request, progress).instrument(span).await
    }

    async fn run_pipeline(
        &self,
        request: &ConsultationRequest,
        progress: &dyn ProgressSink,
    ) -> Result<OrchestrationResult, OrchestrationError> {
        let started = Instant::now();

        let (context, retrieval_failed) = self.retrieve_context(request, progress).await;

        let mut outcomes: Vec<SpecialistOutcome> = Vec::new();
        let mut categories: Vec<CategoryReport> = Vec::new();
        for category in SpecialistCategory::ALL {
            let ids = request.specialists.unique_ids(category);
            if ids.is_empty() {
                tracing::debug!(
                    target: "consilium.executor",
                    category = category.as_str(),
                    "no specialists selected, skipping band"
                );
                continue;
            }
            let batch = self
                .delegate(category, &ids, &context, request, progress)
                .await;
            categories.push(CategoryReport {
                category,
                consulted: ids,
                succeeded: batch.iter().filter(|o| o.is_success()).count(),
            });
            outcomes.extend(batch);
        }

        let answer = self
            .compile(&request.question, &context, &outcomes, progress)
            .await?;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            target: "consilium.executor",
            elapsed_ms = elapsed_ms,
            outcomes = outcomes.len(),
            succeeded = outcomes.iter().filter(|o| o.is_success()).count(),
            context_snippets = context.len(),
            "consultation compiled"
        );

        Ok(OrchestrationResult {
            answer,
            context_document_ids: context.iter().map(|s| s.id.clone()).collect(),
            outcomes,
            metadata: ExecutionMetadata {
                elapsed_ms,
                categories,
                retrieval_failed,
                compiler: self.compiler.name().to_string(),
            },
        })
    }

    async fn retrieve_context(
        &self,
        request: &ConsultationRequest,
        progress: &dyn ProgressSink,
    ) -> (Vec<ContextSnippet>, bool) {
        progress
            .report("Retrieving document context", RETRIEVAL_BAND.start)
            .await;

        let timeout = self.config.retrieval_timeout();
        let call = AssertUnwindSafe(self.retriever.retrieve(
            &request.question,
            self.config.retrieval_top_k,
            request.document_scope.as_deref(),
        ))
        .catch_unwind();

        let res = match tokio::time::timeout(timeout, call).await {
            Ok(Ok(res)) => res,
            Ok(Err(payload)) => Err(RetrievalError::Panicked(panic_message(payload.as_ref()))),
            Err(_) => Err(RetrievalError::Timeout(timeout.as_millis() as u64)),
        };

        let (context, failed) = match res {
            Ok(snippets) => (snippets, false),
            Err(err) => {
                tracing::warn!(
                    target: "consilium.executor",
                    retriever = self.retriever.name(),
                    error = %err,
                    "context retrieval failed, continuing without context"
                );
                (Vec::new(), true)
            }
        };

        progress
            .report(
                &format!("Retrieved {} context snippets", context.len()),
                RETRIEVAL_BAND.end,
            )
            .await;
        (context, failed)
    }

    async fn delegate(
        &self,
        category: SpecialistCategory,
        ids: &[String],
        context: &[ContextSnippet],
        request: &ConsultationRequest,
        progress: &dyn ProgressSink,
    ) -> Vec<SpecialistOutcome> {
        let band = band_for(category);
        let checkpoints = band_increments(ids.len(), band.start, band.end);

        for (id, percent) in ids.iter().zip(&checkpoints) {
            progress
                .report(&format!("Consulting {} {}", category.label(), id), *percent)
                .await;
        }

        let slots: Vec<ConsultSlot> = ids
            .iter()
            .map(|id| ConsultSlot {
                specialist_id: id.clone(),
                specialist: self.specialists.resolve(category, id),
            })
            .collect();
        let metadata = json!({
            "category": category.as_str(),
            "document_scope": request.document_scope,
        });
        let opts = BatchOptions {
            timeout: self.config.consult_timeout(),
            max_concurrency: self.config.max_concurrent_consultations,
        };

        let outcomes = consult_batch(
            category,
            &slots,
            context,
            &request.question,
            Some(&metadata),
            &opts,
        )
        .instrument(tracing::info_span!(
            target: "consilium.executor",
            "delegation",
            category = category.as_str(),
            count = ids.len(),
        ))
        .await;

        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        progress
            .report(
                &format!(
                    "{succeeded} of {} {} consultations succeeded",
                    outcomes.len(),
                    category.label()
                ),
                band.end,
            )
            .await;
        outcomes
    }

    async fn compile(
        &self,
        question: &str,
        context: &[ContextSnippet],
        outcomes: &[SpecialistOutcome],
        progress: &dyn ProgressSink,
    ) -> Result<String, OrchestrationError> {
        progress
            .report("Compiling final answer", COMPILATION_BAND.start)
            .await;

        let answer = self
            .compiler
            .compile(question, context, outcomes)
            .await
            .map_err(|err| {
                tracing::error!(
                    target: "consilium.executor",
                    compiler = self.compiler.name(),
                    error = %err,
                    "compilation failed"
                );
                err
            })?;
        if answer.trim().is_empty() {
            return Err(CompilationError::EmptyAnswer.into());
        }

        progress
            .report("Final answer compiled", COMPILATION_BAND.end)
            .await;
        Ok(answer)
    }
}
