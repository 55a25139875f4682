use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{bail, Result};

use consilium_core::api::{
    Specialist, SpecialistCategory, SpecialistConfig, SpecialistInfo, SpecialistRegistry,
};

use super::llm::LlmSpecialist;
use crate::llm::LlmClient;

struct Entry {
    info: SpecialistInfo,
    specialist: Arc<dyn Specialist>,
}

/// Fixed catalog of specialists, in configuration order.
pub struct CatalogSpecialistRegistry {
    entries: Vec<Entry>,
}

impl CatalogSpecialistRegistry {
    /// Build from `(display name, specialist)` pairs. Ids must be unique per category.
    pub fn new(specialists: Vec<(String, Arc<dyn Specialist>)>) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(specialists.len());
        for (display_name, specialist) in specialists {
            let id = specialist.id().trim().to_string();
            if id.is_empty() {
                bail!("specialist id must not be empty");
            }
            let category = specialist.category();
            if !seen.insert((category, id.clone())) {
                bail!("duplicate {} id in specialist catalog: {}", category.as_str(), id);
            }
            entries.push(Entry {
                info: SpecialistInfo {
                    id,
                    category,
                    display_name,
                },
                specialist,
            });
        }
        Ok(Self { entries })
    }

    /// One LLM-backed specialist per `[[specialists]]` entry, sharing one client.
    pub fn from_config(specialists: &[SpecialistConfig], client: Arc<LlmClient>) -> Result<Self> {
        let built = specialists
            .iter()
            .map(|cfg| {
                let specialist: Arc<dyn Specialist> =
                    Arc::new(LlmSpecialist::new(cfg, client.clone()));
                (cfg.display_name.clone(), specialist)
            })
            .collect();
        Self::new(built)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SpecialistRegistry for CatalogSpecialistRegistry {
    fn list_available(&self) -> Vec<SpecialistInfo> {
        self.entries.iter().map(|e| e.info.clone()).collect()
    }

    fn resolve(&self, category: SpecialistCategory, id: &str) -> Option<Arc<dyn Specialist>> {
        self.entries
            .iter()
            .find(|e| e.info.category == category && e.info.id == id)
            .map(|e| e.specialist.clone())
    }
}
