//! Shared reqwest plumbing for the retrieval and LLM collaborators.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

const BODY_PREVIEW_LIMIT: usize = 512;

/// Coarse classification callers branch on (timeouts and refused connections differ
/// from a service that answered badly).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpErrorKind {
    Timeout,
    Connect,
    Transport,
    Status,
    Decode,
}

impl fmt::Display for HttpErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Timeout => "timeout",
            Self::Connect => "connect",
            Self::Transport => "transport",
            Self::Status => "status",
            Self::Decode => "decode",
        })
    }
}

#[derive(Debug, Error)]
pub enum HttpCallError {
    #[error("http error kind={kind} url={url}: {source}")]
    Transport {
        kind: HttpErrorKind,
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("http error kind=status status={status} url={url}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },
    #[error("http error kind=decode status={status} url={url}: {reason}")]
    Decode {
        status: u16,
        url: String,
        reason: String,
    },
}

impl HttpCallError {
    pub fn kind(&self) -> HttpErrorKind {
        match self {
            Self::Transport { kind, .. } => *kind,
            Self::Status { .. } => HttpErrorKind::Status,
            Self::Decode { .. } => HttpErrorKind::Decode,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { source, .. } => source.status().map(|s| s.as_u16()),
            Self::Status { status, .. } | Self::Decode { status, .. } => Some(*status),
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Self::Transport { url, .. } | Self::Status { url, .. } | Self::Decode { url, .. } => {
                url
            }
        }
    }

    /// Body preview for status errors; the reason otherwise.
    pub fn message(&self) -> String {
        match self {
            Self::Transport { source, .. } => source.to_string(),
            Self::Status { body, .. } => body.clone(),
            Self::Decode { reason, .. } => reason.clone(),
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error, url: &str) -> Self {
        let kind = if err.is_timeout() {
            HttpErrorKind::Timeout
        } else if err.is_connect() {
            HttpErrorKind::Connect
        } else {
            HttpErrorKind::Transport
        };
        Self::Transport {
            kind,
            url: url.to_string(),
            source: err,
        }
    }

    /// Response parsed as JSON but did not have the expected shape.
    pub(crate) fn shape_error(status: u16, url: &str, what: &str) -> Self {
        Self::Decode {
            status,
            url: url.to_string(),
            reason: format!("unexpected response shape: {what}"),
        }
    }
}

pub(crate) fn preview_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }
    match trimmed.char_indices().nth(BODY_PREVIEW_LIMIT) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

pub(crate) fn build_client(timeout_ms: u64) -> anyhow::Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .build()?)
}

/// Bearer auth unless the key is blank.
pub(crate) fn with_auth(req: reqwest::RequestBuilder, api_key: &str) -> reqwest::RequestBuilder {
    match api_key.trim() {
        "" => req,
        key => req.bearer_auth(key),
    }
}

/// POST `payload` as JSON. An empty 2xx body decodes to `Value::Null`.
pub(crate) async fn post_json<T: Serialize + ?Sized>(
    req: reqwest::RequestBuilder,
    url: &str,
    payload: &T,
) -> Result<(u16, Value), HttpCallError> {
    let resp = req
        .json(payload)
        .send()
        .await
        .map_err(|err| HttpCallError::from_reqwest(err, url))?;

    let status = resp.status().as_u16();
    let ok = resp.status().is_success();
    let body = resp
        .text()
        .await
        .map_err(|err| HttpCallError::from_reqwest(err, url))?;

    if !ok {
        return Err(HttpCallError::Status {
            status,
            url: url.to_string(),
            body: preview_body(&body),
        });
    }
    if body.trim().is_empty() {
        return Ok((status, Value::Null));
    }
    serde_json::from_str::<Value>(&body)
        .map(|v| (status, v))
        .map_err(|err| HttpCallError::Decode {
            status,
            url: url.to_string(),
            reason: format!(
                "failed to decode response body: {err} | body={}",
                preview_body(&body)
            ),
        })
}
