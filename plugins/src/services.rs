//! ServicesFactory 实现：从配置构建 specialists / retriever / compiler，供 CLI 复用。
use async_trait::async_trait;
use consilium_core::api::{AppConfig, ServiceError, Services, ServicesFactory};

use crate::factory;

#[derive(Default)]
pub struct PluginServicesFactory;

#[async_trait]
impl ServicesFactory for PluginServicesFactory {
    async fn build_services(&self, cfg: &AppConfig) -> Result<Services, ServiceError> {
        let client = factory::build_llm_client(cfg).map_err(ServiceError::Plugin)?;
        let specialists =
            factory::build_specialists(cfg, client.clone()).map_err(ServiceError::Plugin)?;
        let retriever = factory::build_retriever(cfg).map_err(ServiceError::Plugin)?;
        let compiler = factory::build_compiler(cfg, client);
        Ok(Services {
            specialists,
            retriever,
            compiler,
        })
    }
}
