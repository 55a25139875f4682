use async_trait::async_trait;
use consilium_core::api::{
    AppContext, ConsultationRequest, OrchestrationResult, SpecialistInfo, StartReceipt,
    StatusView,
};

use super::{ClientError, ConsultationClient};

/// 进程内客户端：直接调用 AppContext 中的服务
#[derive(Clone)]
pub struct LocalClient {
    ctx: AppContext,
}

impl LocalClient {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ConsultationClient for LocalClient {
    async fn start(&self, request: &ConsultationRequest) -> Result<StartReceipt, ClientError> {
        Ok(self.ctx.consultations().start(request.clone()).await?)
    }

    async fn status(&self, task_id: &str) -> Result<StatusView, ClientError> {
        Ok(self.ctx.polling().status(task_id).await?)
    }

    async fn result(&self, task_id: &str) -> Result<OrchestrationResult, ClientError> {
        Ok(self.ctx.polling().result(task_id).await?)
    }

    async fn specialists(&self) -> Result<Vec<SpecialistInfo>, ClientError> {
        Ok(self.ctx.orchestrator().catalog())
    }
}
