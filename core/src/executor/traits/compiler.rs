use async_trait::async_trait;

use crate::error::CompilationError;
use crate::executor::types::{ContextSnippet, SpecialistOutcome};

/// 答案汇编插件：合并检索上下文与专家意见
#[async_trait]
pub trait AnswerCompiler: Send + Sync {
    fn name(&self) -> &str;

    /// `outcomes` 包含失败条目，实现自行决定是否提及
    async fn compile(
        &self,
        question: &str,
        context: &[ContextSnippet],
        outcomes: &[SpecialistOutcome],
    ) -> Result<String, CompilationError>;
}
