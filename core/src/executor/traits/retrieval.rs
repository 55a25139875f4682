use async_trait::async_trait;

use crate::error::RetrievalError;
use crate::executor::types::ContextSnippet;

/// 知识检索插件（向量检索服务的边界）
#[async_trait]
pub trait KnowledgeRetriever: Send + Sync {
    fn name(&self) -> &str;

    /// 返回按相关度排序的上下文片段
    async fn retrieve(
        &self,
        question: &str,
        top_k: usize,
        document_scope: Option<&[String]>,
    ) -> Result<Vec<ContextSnippet>, RetrievalError>;
}

/// 不返回任何上下文的检索器
pub struct NoopRetriever;

#[async_trait]
impl KnowledgeRetriever for NoopRetriever {
    fn name(&self) -> &str {
        "none"
    }

    async fn retrieve(
        &self,
        _question: &str,
        _top_k: usize,
        _document_scope: Option<&[String]>,
    ) -> Result<Vec<ContextSnippet>, RetrievalError> {
        Ok(Vec::new())
    }
}
