use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::request::SpecialistCategory;

/// Opinion returned by a specialist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opinion {
    pub opinion_text: String,
    /// Self-reported confidence in `[0.0, 1.0]`.
    pub confidence: f32,
    pub timestamp: DateTime<Utc>,
}

impl Opinion {
    pub fn new(opinion_text: impl Into<String>, confidence: f32) -> Self {
        Self {
            opinion_text: opinion_text.into(),
            confidence: confidence.clamp(0.0, 1.0),
            timestamp: Utc::now(),
        }
    }
}

/// A ranked snippet returned by the knowledge retrieval service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSnippet {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

/// What happened in one specialist's slot of a delegation batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum OutcomeStatus {
    Success { opinion: Opinion },
    Failure { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialistOutcome {
    pub specialist_id: String,
    pub category: SpecialistCategory,
    #[serde(flatten)]
    pub status: OutcomeStatus,
    pub duration_ms: u64,
}

impl SpecialistOutcome {
    pub fn success(
        specialist_id: impl Into<String>,
        category: SpecialistCategory,
        opinion: Opinion,
        duration_ms: u64,
    ) -> Self {
        Self {
            specialist_id: specialist_id.into(),
            category,
            status: OutcomeStatus::Success { opinion },
            duration_ms,
        }
    }

    pub fn failure(
        specialist_id: impl Into<String>,
        category: SpecialistCategory,
        reason: impl Into<String>,
        duration_ms: u64,
    ) -> Self {
        Self {
            specialist_id: specialist_id.into(),
            category,
            status: OutcomeStatus::Failure {
                reason: reason.into(),
            },
            duration_ms,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, OutcomeStatus::Success { .. })
    }

    pub fn opinion(&self) -> Option<&Opinion> {
        match &self.status {
            OutcomeStatus::Success { opinion } => Some(opinion),
            OutcomeStatus::Failure { .. } => None,
        }
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match &self.status {
            OutcomeStatus::Success { .. } => None,
            OutcomeStatus::Failure { reason } => Some(reason),
        }
    }
}

/// Per-category summary kept in the execution metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryReport {
    pub category: SpecialistCategory,
    pub consulted: Vec<String>,
    pub succeeded: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionMetadata {
    pub elapsed_ms: u64,
    pub categories: Vec<CategoryReport>,
    pub retrieval_failed: bool,
    pub compiler: String,
}

impl ExecutionMetadata {
    pub fn consulted_ids(&self) -> Vec<&str> {
        self.categories
            .iter()
            .flat_map(|c| c.consulted.iter().map(String::as_str))
            .collect()
    }
}

/// Final output of one consultation, stored into a completed task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationResult {
    pub answer: String,
    /// One entry per consulted specialist, experts first, selection order within a category.
    pub outcomes: Vec<SpecialistOutcome>,
    pub context_document_ids: Vec<String>,
    pub metadata: ExecutionMetadata,
}

impl OrchestrationResult {
    pub fn successful_opinions(&self) -> impl Iterator<Item = (&str, &Opinion)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.opinion().map(|op| (o.specialist_id.as_str(), op)))
    }
}
