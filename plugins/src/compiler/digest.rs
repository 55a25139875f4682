use std::fmt::Write as _;

use async_trait::async_trait;

use consilium_core::api::{
    AnswerCompiler, CompilationError, ContextSnippet, SpecialistCategory, SpecialistOutcome,
};

use super::excerpt;

/// Offline compiler: lays out opinions by category followed by the context excerpts.
///
/// Deterministic, so it also serves as the fallback when no LLM is configured.
pub struct DigestCompiler {
    max_context_chars: usize,
}

impl DigestCompiler {
    pub fn new(max_context_chars: usize) -> Self {
        Self { max_context_chars }
    }
}

impl Default for DigestCompiler {
    fn default() -> Self {
        Self::new(2_000)
    }
}

#[async_trait]
impl AnswerCompiler for DigestCompiler {
    fn name(&self) -> &str {
        "digest"
    }

    async fn compile(
        &self,
        question: &str,
        context: &[ContextSnippet],
        outcomes: &[SpecialistOutcome],
    ) -> Result<String, CompilationError> {
        let mut out = String::new();
        let _ = writeln!(out, "Question: {}", question.trim());

        for category in SpecialistCategory::ALL {
            let in_category: Vec<_> = outcomes.iter().filter(|o| o.category == category).collect();
            if in_category.is_empty() {
                continue;
            }
            let _ = writeln!(out, "\n{} opinions:", capitalize(category.label()));
            for outcome in in_category {
                match (outcome.opinion(), outcome.failure_reason()) {
                    (Some(op), _) => {
                        let _ = writeln!(
                            out,
                            "- {} (confidence {:.2}): {}",
                            outcome.specialist_id,
                            op.confidence,
                            op.opinion_text.trim()
                        );
                    }
                    (None, reason) => {
                        let _ = writeln!(
                            out,
                            "- {}: no opinion ({})",
                            outcome.specialist_id,
                            reason.unwrap_or("unknown")
                        );
                    }
                }
            }
        }

        if context.is_empty() {
            if outcomes.is_empty() {
                return Err(CompilationError::Failed(
                    "no opinions and no document context to compile from".to_string(),
                ));
            }
        } else {
            let _ = writeln!(out, "\nRelevant excerpts:");
            for snippet in context {
                let _ = writeln!(
                    out,
                    "- [{}] {}",
                    snippet.id,
                    excerpt(snippet, self.max_context_chars)
                );
            }
        }

        Ok(out.trim_end().to_string())
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
