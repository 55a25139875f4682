use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use consilium_core::api::{ContextSnippet, KnowledgeRetriever, RetrievalConfig, RetrievalError};

use crate::http::{build_client, post_json, with_auth, HttpCallError, HttpErrorKind};

#[derive(Debug, Serialize)]
struct SearchPayload<'a> {
    question: &'a str,
    top_k: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    document_scope: Option<&'a [String]>,
}

/// Search service response: either a bare array or `{ "results": [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SearchResponse {
    Bare(Vec<ContextSnippet>),
    Wrapped { results: Vec<ContextSnippet> },
}

/// Vector search service reached over HTTP.
pub struct HttpKnowledgeRetriever {
    api_key: String,
    http: reqwest::Client,
    url_search: String,
}

impl HttpKnowledgeRetriever {
    pub fn new(cfg: &RetrievalConfig) -> anyhow::Result<Self> {
        let http = build_client(cfg.timeout_ms)?;
        let normalized = cfg.base_url.trim_end_matches('/');
        Ok(Self {
            api_key: cfg.api_key.clone(),
            http,
            url_search: format!("{}/v1/search", normalized),
        })
    }
}

fn to_retrieval_error(err: HttpCallError) -> RetrievalError {
    match (err.kind(), err.status()) {
        (HttpErrorKind::Status, Some(status)) => RetrievalError::Status {
            status,
            body: err.message(),
        },
        (HttpErrorKind::Decode, _) => RetrievalError::Decode(err.to_string()),
        _ => RetrievalError::Transport(err.to_string()),
    }
}

#[async_trait]
impl KnowledgeRetriever for HttpKnowledgeRetriever {
    fn name(&self) -> &str {
        "http"
    }

    async fn retrieve(
        &self,
        question: &str,
        top_k: usize,
        document_scope: Option<&[String]>,
    ) -> Result<Vec<ContextSnippet>, RetrievalError> {
        let url = &self.url_search;
        tracing::debug!(
            target: "consilium.retrieval",
            stage = "retrieval.http.search.in",
            url = %url,
            question_len = question.len(),
            top_k = top_k,
            scoped = document_scope.is_some()
        );

        let payload = SearchPayload {
            question,
            top_k,
            document_scope,
        };
        let req = with_auth(self.http.post(url), &self.api_key);
        let (status, body) = post_json(req, url, &payload)
            .await
            .map_err(to_retrieval_error)?;

        let mut snippets = match body {
            Value::Null => Vec::new(),
            other => match serde_json::from_value::<SearchResponse>(other) {
                Ok(SearchResponse::Bare(items)) => items,
                Ok(SearchResponse::Wrapped { results }) => results,
                Err(err) => return Err(RetrievalError::Decode(err.to_string())),
            },
        };
        snippets.truncate(top_k);

        tracing::debug!(
            target: "consilium.retrieval",
            stage = "retrieval.http.search.out",
            status = status,
            snippets = snippets.len()
        );
        Ok(snippets)
    }
}
