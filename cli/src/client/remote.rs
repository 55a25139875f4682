//! 远程客户端 - 通过 HTTP 调用 `consilium serve`

use std::time::Duration;

use async_trait::async_trait;
use consilium_core::api::{
    ConsultationRequest, OrchestrationResult, PollError, SpecialistInfo, StartReceipt,
    StatusView, TaskStatus,
};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;

use super::{ClientError, ConsultationClient};
use crate::http::models::{ApiResponse, ErrorBody, StartConsultationRequest};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct RemoteClient {
    client: Client,
    server_url: String,
}

impl RemoteClient {
    pub fn new(server_url: &str) -> Result<Self, ClientError> {
        let server_url = server_url.trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ClientError::Transport {
                url: server_url.clone(),
                message: e.to_string(),
            })?;
        Ok(Self { client, server_url })
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.server_url, path)
    }

    async fn send(&self, req: reqwest::RequestBuilder, url: &str) -> Result<Response, ClientError> {
        tracing::debug!(target: "consilium.client", url = %url, "sending request");
        req.send().await.map_err(|e| ClientError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    async fn decode<T: DeserializeOwned>(resp: Response, url: &str) -> Result<T, ClientError> {
        resp.json::<T>().await.map_err(|e| ClientError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    async fn api_error(resp: Response, url: &str) -> ClientError {
        let status = resp.status().as_u16();
        match Self::decode::<ErrorBody>(resp, url).await {
            Ok(body) => ClientError::Api {
                status,
                code: body.error_code,
                message: body.error,
            },
            Err(e) => e,
        }
    }
}

#[async_trait]
impl ConsultationClient for RemoteClient {
    async fn start(&self, request: &ConsultationRequest) -> Result<StartReceipt, ClientError> {
        let url = self.url("/api/v1/consultations");
        let body = StartConsultationRequest::from(request);
        let resp = self.send(self.client.post(&url).json(&body), &url).await?;

        match resp.status() {
            s if s.is_success() => {
                Ok(Self::decode::<ApiResponse<StartReceipt>>(resp, &url).await?.data)
            }
            StatusCode::UNPROCESSABLE_ENTITY => {
                let body: ErrorBody = Self::decode(resp, &url).await?;
                let task_id = body.task_id.ok_or_else(|| ClientError::Decode {
                    url: url.clone(),
                    message: "rejection without task_id".to_string(),
                })?;
                Ok(StartReceipt {
                    task_id,
                    status: TaskStatus::Failed,
                    error_message: Some(body.error),
                })
            }
            _ => Err(Self::api_error(resp, &url).await),
        }
    }

    async fn status(&self, task_id: &str) -> Result<StatusView, ClientError> {
        let url = self.url(&format!("/api/v1/consultations/{task_id}/status"));
        let resp = self.send(self.client.get(&url), &url).await?;

        match resp.status() {
            StatusCode::OK => Ok(Self::decode::<ApiResponse<StatusView>>(resp, &url).await?.data),
            StatusCode::NOT_FOUND => Err(PollError::NotFound(task_id.to_string()).into()),
            _ => Err(Self::api_error(resp, &url).await),
        }
    }

    async fn result(&self, task_id: &str) -> Result<OrchestrationResult, ClientError> {
        let url = self.url(&format!("/api/v1/consultations/{task_id}/result"));
        let resp = self.send(self.client.get(&url), &url).await?;

        match resp.status() {
            StatusCode::OK => {
                Ok(Self::decode::<ApiResponse<OrchestrationResult>>(resp, &url)
                    .await?
                    .data)
            }
            StatusCode::ACCEPTED => {
                let body: ErrorBody = Self::decode(resp, &url).await?;
                Err(PollError::NotReady {
                    task_id: task_id.to_string(),
                    status: body.status.unwrap_or(TaskStatus::Running),
                    progress_percent: body.progress_percent.unwrap_or(0),
                }
                .into())
            }
            StatusCode::CONFLICT => {
                let body: ErrorBody = Self::decode(resp, &url).await?;
                Err(PollError::Failed {
                    task_id: task_id.to_string(),
                    message: body.error,
                }
                .into())
            }
            StatusCode::NOT_FOUND => Err(PollError::NotFound(task_id.to_string()).into()),
            _ => Err(Self::api_error(resp, &url).await),
        }
    }

    async fn specialists(&self) -> Result<Vec<SpecialistInfo>, ClientError> {
        let url = self.url("/api/v1/specialists");
        let resp = self.send(self.client.get(&url), &url).await?;
        if !resp.status().is_success() {
            return Err(Self::api_error(resp, &url).await);
        }
        Ok(Self::decode::<ApiResponse<Vec<SpecialistInfo>>>(resp, &url)
            .await?
            .data)
    }
}
