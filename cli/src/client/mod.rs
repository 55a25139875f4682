//! 咨询客户端：进程内（local）与远程 HTTP（remote）两种实现共享同一接口。

mod local;
mod remote;

pub use local::LocalClient;
pub use remote::RemoteClient;

use async_trait::async_trait;
use consilium_core::api::{
    CliError, ConsultationRequest, OrchestrationResult, PollError, RegistryError, SpecialistInfo,
    StartReceipt, StatusView,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Poll(#[from] PollError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("server returned {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl From<ClientError> for CliError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Registry(e) => CliError::Registry(e),
            other => CliError::Command(other.to_string()),
        }
    }
}

/// start / status / result，与核心轮询契约一一对应
#[async_trait]
pub trait ConsultationClient: Send + Sync {
    async fn start(&self, request: &ConsultationRequest) -> Result<StartReceipt, ClientError>;

    async fn status(&self, task_id: &str) -> Result<StatusView, ClientError>;

    async fn result(&self, task_id: &str) -> Result<OrchestrationResult, ClientError>;

    async fn specialists(&self) -> Result<Vec<SpecialistInfo>, ClientError>;
}
