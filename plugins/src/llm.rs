//! Minimal OpenAI-compatible chat-completions client.

use serde::Serialize;
use serde_json::Value;

use consilium_core::api::LlmConfig;

use crate::http::{build_client, post_json, with_auth, HttpCallError};

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Clone)]
pub struct LlmClient {
    api_key: String,
    http: reqwest::Client,
    url_chat: String,
    model: String,
    temperature: f32,
    timeout_ms: u64,
}

impl LlmClient {
    pub fn new(cfg: &LlmConfig) -> anyhow::Result<Self> {
        let http = build_client(cfg.timeout_ms)?;
        let normalized = cfg.base_url.trim_end_matches('/');
        Ok(Self {
            api_key: cfg.api_key.clone(),
            http,
            url_chat: format!("{}/chat/completions", normalized),
            model: cfg.model.clone(),
            temperature: cfg.temperature,
            timeout_ms: cfg.timeout_ms,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// One system + user exchange. Returns the first choice's message content.
    pub async fn chat(
        &self,
        system: &str,
        user: &str,
        model_override: Option<&str>,
    ) -> Result<String, HttpCallError> {
        let url = &self.url_chat;
        let model = model_override.unwrap_or(&self.model);
        let payload = ChatRequest {
            model,
            temperature: self.temperature,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };

        tracing::debug!(
            target: "consilium.llm",
            stage = "llm.chat.in",
            url = %url,
            model = %model,
            prompt_len = user.len()
        );
        let req = with_auth(self.http.post(url), &self.api_key);
        let (status, body) = post_json(req, url, &payload).await?;
        let content = extract_content(&body).ok_or_else(|| {
            HttpCallError::shape_error(status, url, "choices[0].message.content")
        })?;
        tracing::debug!(
            target: "consilium.llm",
            stage = "llm.chat.out",
            status = status,
            answer_len = content.len()
        );
        Ok(content)
    }
}

fn extract_content(body: &Value) -> Option<String> {
    body.get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
        .map(str::to_string)
}
