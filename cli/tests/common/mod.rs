#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use consilium_core::api::{
    AppConfig, AppContext, ContextSnippet, NoopRetriever, Opinion, Services, Specialist,
    SpecialistCategory, SpecialistError, TaskStatus, TokioSpawner,
};
use consilium_plugins::compiler::DigestCompiler;
use consilium_plugins::specialists::CatalogSpecialistRegistry;
use serde_json::Value;
use tokio::sync::Notify;

/// Answers immediately, or after `gate` is notified.
pub struct StubSpecialist {
    pub id: String,
    pub category: SpecialistCategory,
    pub gate: Option<Arc<Notify>>,
}

#[async_trait]
impl Specialist for StubSpecialist {
    fn id(&self) -> &str {
        &self.id
    }

    fn category(&self) -> SpecialistCategory {
        self.category
    }

    async fn consult(
        &self,
        _context: &[ContextSnippet],
        _question: &str,
        _metadata: Option<&Value>,
    ) -> Result<Opinion, SpecialistError> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        Ok(Opinion::new(format!("{} opinion", self.id), 0.8))
    }
}

fn stub(id: &str, category: SpecialistCategory, gate: Option<Arc<Notify>>) -> (String, Arc<dyn Specialist>) {
    let specialist: Arc<dyn Specialist> = Arc::new(StubSpecialist {
        id: id.to_string(),
        category,
        gate,
    });
    (format!("{id} (stub)"), specialist)
}

/// Catalog: expert `medical`, counsel `labor` and counsel `slow` (blocked on `gate`).
pub fn context(gate: Arc<Notify>) -> AppContext {
    let catalog = CatalogSpecialistRegistry::new(vec![
        stub("medical", SpecialistCategory::Expert, None),
        stub("labor", SpecialistCategory::Counsel, None),
        stub("slow", SpecialistCategory::Counsel, Some(gate)),
    ])
    .unwrap();

    let services = Services {
        specialists: Arc::new(catalog),
        retriever: Arc::new(NoopRetriever),
        compiler: Arc::new(DigestCompiler::default()),
    };
    AppContext::with_services(AppConfig::default(), services, Arc::new(TokioSpawner))
}

pub async fn wait_terminal(ctx: &AppContext, task_id: &str) -> TaskStatus {
    for _ in 0..500 {
        let view = ctx.polling().status(task_id).await.unwrap();
        if view.status.is_terminal() {
            return view.status;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("task {task_id} did not finish");
}
