mod catalog;
mod llm;

pub use catalog::CatalogSpecialistRegistry;
pub use llm::{parse_confidence, LlmSpecialist, DEFAULT_CONFIDENCE};
