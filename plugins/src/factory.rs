use std::sync::Arc;

use anyhow::Result;

use consilium_core::api::{
    AnswerCompiler, AppConfig, CompilerProvider, KnowledgeRetriever, NoopRetriever,
    SpecialistRegistry,
};

use crate::compiler::{DigestCompiler, LlmCompiler};
use crate::llm::LlmClient;
use crate::retrieval::HttpKnowledgeRetriever;
use crate::specialists::CatalogSpecialistRegistry;

pub fn build_llm_client(cfg: &AppConfig) -> Result<Arc<LlmClient>> {
    Ok(Arc::new(LlmClient::new(&cfg.llm)?))
}

pub fn build_specialists(
    cfg: &AppConfig,
    client: Arc<LlmClient>,
) -> Result<Arc<dyn SpecialistRegistry>> {
    let catalog = cfg.specialist_catalog();
    let registry = CatalogSpecialistRegistry::from_config(&catalog, client)?;
    tracing::info!(
        target: "consilium.plugins",
        specialists = registry.len(),
        "specialist catalog loaded"
    );
    Ok(Arc::new(registry))
}

pub fn build_retriever(cfg: &AppConfig) -> Result<Arc<dyn KnowledgeRetriever>> {
    if !cfg.retrieval.enabled {
        tracing::info!(target: "consilium.plugins", "retrieval disabled, using noop retriever");
        return Ok(Arc::new(NoopRetriever));
    }
    Ok(Arc::new(HttpKnowledgeRetriever::new(&cfg.retrieval)?))
}

pub fn build_compiler(cfg: &AppConfig, client: Arc<LlmClient>) -> Arc<dyn AnswerCompiler> {
    let max_chars = cfg.compiler.max_context_chars;
    match cfg.compiler.provider {
        CompilerProvider::Llm => Arc::new(LlmCompiler::new(client, max_chars)),
        CompilerProvider::Digest => Arc::new(DigestCompiler::new(max_chars)),
    }
}
