use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The two independently sizeable specialist panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecialistCategory {
    /// Technical experts (medical, engineering, accounting, ...).
    Expert,
    /// Domain counsel (labor, civil, criminal, ...).
    Counsel,
}

impl SpecialistCategory {
    /// Delegation order: experts first, then counsel.
    pub const ALL: [SpecialistCategory; 2] = [SpecialistCategory::Expert, SpecialistCategory::Counsel];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Expert => "expert",
            Self::Counsel => "counsel",
        }
    }

    /// Human readable label used in stage descriptions.
    pub fn label(self) -> &'static str {
        match self {
            Self::Expert => "technical expert",
            Self::Counsel => "domain counsel",
        }
    }
}

impl fmt::Display for SpecialistCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Specialist ids chosen by the caller, per category, in selection order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialistSelection {
    #[serde(default)]
    pub experts: Vec<String>,
    #[serde(default)]
    pub counsel: Vec<String>,
}

impl SpecialistSelection {
    pub fn new(experts: Vec<String>, counsel: Vec<String>) -> Self {
        Self { experts, counsel }
    }

    pub fn ids(&self, category: SpecialistCategory) -> &[String] {
        match category {
            SpecialistCategory::Expert => &self.experts,
            SpecialistCategory::Counsel => &self.counsel,
        }
    }

    /// Ids of one category with duplicates removed, first occurrence wins.
    pub fn unique_ids(&self, category: SpecialistCategory) -> Vec<String> {
        let mut seen = HashSet::new();
        self.ids(category)
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .cloned()
            .collect()
    }

    pub fn total(&self) -> usize {
        self.experts.len() + self.counsel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Input of one consultation. Stored verbatim on the task record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsultationRequest {
    pub question: String,
    #[serde(default)]
    pub specialists: SpecialistSelection,
    /// Restricts retrieval to these document ids when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_scope: Option<Vec<String>>,
}

impl ConsultationRequest {
    pub fn new(question: impl Into<String>, specialists: SpecialistSelection) -> Self {
        Self {
            question: question.into(),
            specialists,
            document_scope: None,
        }
    }

    pub fn with_document_scope(mut self, scope: Vec<String>) -> Self {
        self.document_scope = Some(scope);
        self
    }
}
