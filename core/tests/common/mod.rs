#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use consilium_core::api::{
    AnswerCompiler, AppConfig, AppContext, CompilationError, ContextSnippet, KnowledgeRetriever,
    Opinion, ProgressSink, RetrievalError, Services, Specialist, SpecialistCategory,
    SpecialistError, SpecialistInfo, SpecialistOutcome, SpecialistRegistry, StatusView,
    TaskStatus, TokioSpawner,
};

#[derive(Clone)]
pub enum Behavior {
    Answer,
    Fail,
    Sleep(Duration),
    Panic,
}

pub struct MockSpecialist {
    id: String,
    category: SpecialistCategory,
    behavior: Behavior,
    pub calls: Mutex<u32>,
}

impl MockSpecialist {
    pub fn new(id: &str, category: SpecialistCategory, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            category,
            behavior,
            calls: Mutex::new(0),
        })
    }

    pub fn call_count(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl Specialist for MockSpecialist {
    fn id(&self) -> &str {
        &self.id
    }

    fn category(&self) -> SpecialistCategory {
        self.category
    }

    async fn consult(
        &self,
        context: &[ContextSnippet],
        _question: &str,
        _metadata: Option<&Value>,
    ) -> Result<Opinion, SpecialistError> {
        *self.calls.lock().unwrap() += 1;
        match &self.behavior {
            Behavior::Answer => Ok(Opinion::new(
                format!("{} opinion on {} snippets", self.id, context.len()),
                0.8,
            )),
            Behavior::Fail => Err(SpecialistError::Failed(format!("{} unavailable", self.id))),
            Behavior::Sleep(d) => {
                tokio::time::sleep(*d).await;
                Ok(Opinion::new(format!("{} slow opinion", self.id), 0.5))
            }
            Behavior::Panic => panic!("{} crashed", self.id),
        }
    }
}

pub struct MockCatalog {
    specialists: Vec<Arc<MockSpecialist>>,
}

impl MockCatalog {
    pub fn new(specialists: Vec<Arc<MockSpecialist>>) -> Self {
        Self { specialists }
    }
}

impl SpecialistRegistry for MockCatalog {
    fn list_available(&self) -> Vec<SpecialistInfo> {
        self.specialists
            .iter()
            .map(|s| SpecialistInfo {
                id: s.id.clone(),
                category: s.category,
                display_name: s.id.to_uppercase(),
            })
            .collect()
    }

    fn resolve(&self, category: SpecialistCategory, id: &str) -> Option<Arc<dyn Specialist>> {
        self.specialists
            .iter()
            .find(|s| s.category == category && s.id == id)
            .map(|s| s.clone() as Arc<dyn Specialist>)
    }
}

enum RetrieverMode {
    Ok,
    Fail,
    Panic,
    Hang,
}

pub struct MockRetriever {
    mode: RetrieverMode,
}

impl MockRetriever {
    pub fn ok() -> Arc<Self> {
        Arc::new(Self {
            mode: RetrieverMode::Ok,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            mode: RetrieverMode::Fail,
        })
    }

    pub fn panicking() -> Arc<Self> {
        Arc::new(Self {
            mode: RetrieverMode::Panic,
        })
    }

    pub fn hanging() -> Arc<Self> {
        Arc::new(Self {
            mode: RetrieverMode::Hang,
        })
    }
}

#[async_trait]
impl KnowledgeRetriever for MockRetriever {
    fn name(&self) -> &str {
        "mock"
    }

    async fn retrieve(
        &self,
        _question: &str,
        top_k: usize,
        _document_scope: Option<&[String]>,
    ) -> Result<Vec<ContextSnippet>, RetrievalError> {
        match self.mode {
            RetrieverMode::Ok => {}
            RetrieverMode::Fail => {
                return Err(RetrievalError::Transport("connection refused".into()))
            }
            RetrieverMode::Panic => panic!("vector index crashed"),
            RetrieverMode::Hang => std::future::pending::<()>().await,
        }
        Ok((0..top_k.min(2))
            .map(|i| ContextSnippet {
                id: format!("doc-{i}"),
                text: format!("clause {i}"),
                metadata: json!({ "page": i }),
                score: Some(1.0 - i as f32 * 0.1),
            })
            .collect())
    }
}

pub enum CompilerMode {
    Summarize,
    Fail,
    Empty,
    Panic,
}

pub struct MockCompiler {
    mode: CompilerMode,
}

impl MockCompiler {
    pub fn new(mode: CompilerMode) -> Arc<Self> {
        Arc::new(Self { mode })
    }
}

#[async_trait]
impl AnswerCompiler for MockCompiler {
    fn name(&self) -> &str {
        "mock"
    }

    async fn compile(
        &self,
        _question: &str,
        context: &[ContextSnippet],
        outcomes: &[SpecialistOutcome],
    ) -> Result<String, CompilationError> {
        match self.mode {
            CompilerMode::Summarize => Ok(format!(
                "{} opinions, {} snippets",
                outcomes.iter().filter(|o| o.is_success()).count(),
                context.len()
            )),
            CompilerMode::Fail => Err(CompilationError::Failed("model refused".into())),
            CompilerMode::Empty => Ok("   ".into()),
            CompilerMode::Panic => panic!("compiler bug"),
        }
    }
}

/// Records every progress report in order.
#[derive(Default)]
pub struct RecordingProgress {
    pub reports: Mutex<Vec<(String, u8)>>,
}

impl RecordingProgress {
    pub fn percents(&self) -> Vec<u8> {
        self.reports.lock().unwrap().iter().map(|(_, p)| *p).collect()
    }

    pub fn stages(&self) -> Vec<String> {
        self.reports
            .lock()
            .unwrap()
            .iter()
            .map(|(s, _)| s.clone())
            .collect()
    }
}

#[async_trait]
impl ProgressSink for RecordingProgress {
    async fn report(&self, stage: &str, percent: u8) {
        self.reports
            .lock()
            .unwrap()
            .push((stage.to_string(), percent));
    }
}

/// Standard panel: medical/engineering experts, labor/civil counsel.
pub fn standard_panel() -> Vec<Arc<MockSpecialist>> {
    vec![
        MockSpecialist::new("medical", SpecialistCategory::Expert, Behavior::Answer),
        MockSpecialist::new("engineering", SpecialistCategory::Expert, Behavior::Answer),
        MockSpecialist::new("labor", SpecialistCategory::Counsel, Behavior::Answer),
        MockSpecialist::new("civil", SpecialistCategory::Counsel, Behavior::Answer),
    ]
}

pub fn services(
    panel: Vec<Arc<MockSpecialist>>,
    retriever: Arc<MockRetriever>,
    compiler: Arc<MockCompiler>,
) -> Services {
    Services {
        specialists: Arc::new(MockCatalog::new(panel)),
        retriever,
        compiler,
    }
}

pub fn test_config(consult_timeout_ms: u64) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.orchestrator.consult_timeout_ms = consult_timeout_ms;
    cfg
}

pub fn app(services: Services, consult_timeout_ms: u64) -> AppContext {
    AppContext::with_services(
        test_config(consult_timeout_ms),
        services,
        Arc::new(TokioSpawner),
    )
}

/// Poll `status` until terminal, returning every observed snapshot.
pub async fn poll_until_terminal(ctx: &AppContext, task_id: &str) -> Vec<StatusView> {
    let mut seen = Vec::new();
    for _ in 0..10_000 {
        let view = ctx.polling().status(task_id).await.unwrap();
        let done = matches!(view.status, TaskStatus::Completed | TaskStatus::Failed);
        seen.push(view);
        if done {
            return seen;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("task {task_id} never reached a terminal state");
}
