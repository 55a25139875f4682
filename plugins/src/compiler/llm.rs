use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;

use consilium_core::api::{AnswerCompiler, CompilationError, ContextSnippet, SpecialistOutcome};

use super::excerpt;
use crate::llm::LlmClient;

const SYSTEM_PROMPT: &str = "You are the lead attorney compiling a client answer. \
Synthesize the specialist opinions and document excerpts into one coherent answer. \
Resolve disagreements explicitly, cite excerpts by their id, and state open risks. \
Ignore specialists that gave no opinion.";

/// Synthesizes the final answer with the configured chat model.
pub struct LlmCompiler {
    client: Arc<LlmClient>,
    max_context_chars: usize,
}

impl LlmCompiler {
    pub fn new(client: Arc<LlmClient>, max_context_chars: usize) -> Self {
        Self {
            client,
            max_context_chars,
        }
    }

    fn render_prompt(
        &self,
        question: &str,
        context: &[ContextSnippet],
        outcomes: &[SpecialistOutcome],
    ) -> String {
        let mut out = format!("Question: {}\n", question.trim());

        let opinions: Vec<_> = outcomes
            .iter()
            .filter_map(|o| o.opinion().map(|op| (o, op)))
            .collect();
        if opinions.is_empty() {
            out.push_str("\nNo specialist opinions are available.\n");
        } else {
            out.push_str("\nSpecialist opinions:\n");
            for (outcome, op) in opinions {
                let _ = writeln!(
                    out,
                    "- {} {} (confidence {:.2}): {}",
                    outcome.category.label(),
                    outcome.specialist_id,
                    op.confidence,
                    op.opinion_text.trim()
                );
            }
        }

        if !context.is_empty() {
            out.push_str("\nDocument excerpts:\n");
            for snippet in context {
                let _ = writeln!(
                    out,
                    "- [{}] {}",
                    snippet.id,
                    excerpt(snippet, self.max_context_chars)
                );
            }
        }
        out
    }
}

#[async_trait]
impl AnswerCompiler for LlmCompiler {
    fn name(&self) -> &str {
        "llm"
    }

    async fn compile(
        &self,
        question: &str,
        context: &[ContextSnippet],
        outcomes: &[SpecialistOutcome],
    ) -> Result<String, CompilationError> {
        let prompt = self.render_prompt(question, context, outcomes);
        let answer = self
            .client
            .chat(SYSTEM_PROMPT, &prompt, None)
            .await
            .map_err(|err| CompilationError::Failed(err.to_string()))?;
        Ok(answer.trim().to_string())
    }
}
