use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SpecialistError;
use crate::executor::types::{ContextSnippet, Opinion, SpecialistCategory};

/// 专家插件（技术专家或领域律师）
#[async_trait]
pub trait Specialist: Send + Sync {
    /// 唯一标识
    fn id(&self) -> &str;

    fn category(&self) -> SpecialistCategory;

    /// 基于检索上下文回答问题
    async fn consult(
        &self,
        context: &[ContextSnippet],
        question: &str,
        metadata: Option<&serde_json::Value>,
    ) -> Result<Opinion, SpecialistError>;
}

/// 可用专家的描述信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialistInfo {
    pub id: String,
    pub category: SpecialistCategory,
    pub display_name: String,
}

/// 专家目录（仅用于预检校验和解析实例）
pub trait SpecialistRegistry: Send + Sync {
    fn list_available(&self) -> Vec<SpecialistInfo>;

    fn resolve(&self, category: SpecialistCategory, id: &str) -> Option<Arc<dyn Specialist>>;

    /// 某一类别下的全部可用 id
    fn available_ids(&self, category: SpecialistCategory) -> Vec<String> {
        self.list_available()
            .into_iter()
            .filter(|info| info.category == category)
            .map(|info| info.id)
            .collect()
    }
}
