use thiserror::Error;

use crate::executor::types::SpecialistCategory;

/// Pre-flight validation failures. Fatal, raised before any work starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("question must not be empty")]
    EmptyQuestion,

    #[error("unknown {category} ids: [{}]; valid ids: [{}]", unknown.join(", "), valid.join(", "))]
    UnknownSpecialists {
        category: SpecialistCategory,
        unknown: Vec<String>,
        valid: Vec<String>,
    },
}

/// A single specialist call failed. Absorbed into that specialist's result slot.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpecialistError {
    #[error("timed out after {0} ms")]
    Timeout(u64),

    #[error("specialist not available: {0}")]
    Unavailable(String),

    #[error("consultation failed: {0}")]
    Failed(String),

    #[error("specialist panicked: {0}")]
    Panicked(String),
}

/// Knowledge retrieval failed. Absorbed: the pipeline continues with empty context.
#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("retrieval transport error: {0}")]
    Transport(String),

    #[error("retrieval service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid retrieval response: {0}")]
    Decode(String),

    #[error("retrieval timed out after {0} ms")]
    Timeout(u64),

    #[error("retriever panicked: {0}")]
    Panicked(String),
}

/// Final synthesis failed. Fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompilationError {
    #[error("compiler failed: {0}")]
    Failed(String),

    #[error("compiler returned an empty answer")]
    EmptyAnswer,
}

/// Fatal errors produced by one orchestration run.
#[derive(Error, Debug)]
pub enum OrchestrationError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("compilation error: {0}")]
    Compilation(#[from] CompilationError),
}

impl OrchestrationError {
    /// Stable short code stored in the failed task's diagnostic.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Compilation(_) => "compilation",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_specialists_message_names_ids() {
        let err = OrchestrationError::from(ValidationError::UnknownSpecialists {
            category: SpecialistCategory::Counsel,
            unknown: vec!["maritime".into()],
            valid: vec!["civil".into(), "labor".into()],
        });
        assert_eq!(
            err.to_string(),
            "validation error: unknown domain counsel ids: [maritime]; valid ids: [civil, labor]"
        );
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn test_empty_question_message() {
        let err = OrchestrationError::from(ValidationError::EmptyQuestion);
        assert_eq!(err.to_string(), "validation error: question must not be empty");
    }
}
