use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use consilium_core::api::{
    ContextSnippet, Opinion, Specialist, SpecialistCategory, SpecialistConfig, SpecialistError,
};

use crate::http::{HttpCallError, HttpErrorKind};
use crate::llm::LlmClient;

/// Confidence assumed when the model omits a `CONFIDENCE:` line.
pub const DEFAULT_CONFIDENCE: f32 = 0.5;

const CONFIDENCE_INSTRUCTION: &str =
    "Finish with a final line of the form `CONFIDENCE: <number between 0 and 1>`.";

/// A specialist backed by a chat-completions model and a persona prompt.
pub struct LlmSpecialist {
    id: String,
    category: SpecialistCategory,
    persona: String,
    model: Option<String>,
    client: Arc<LlmClient>,
}

impl LlmSpecialist {
    pub fn new(cfg: &SpecialistConfig, client: Arc<LlmClient>) -> Self {
        let persona = if cfg.persona.trim().is_empty() {
            format!("You are {}, a {}.", cfg.display_name, cfg.category.label())
        } else {
            cfg.persona.clone()
        };
        Self {
            id: cfg.id.clone(),
            category: cfg.category,
            persona,
            model: cfg.model.clone(),
            client,
        }
    }

    fn system_prompt(&self) -> String {
        format!(
            "{}\nAnswer only within your discipline, cite the numbered excerpts you rely on. {}",
            self.persona, CONFIDENCE_INSTRUCTION
        )
    }

    fn map_error(&self, err: HttpCallError) -> SpecialistError {
        match err.kind() {
            HttpErrorKind::Timeout => SpecialistError::Timeout(self.client.timeout_ms()),
            HttpErrorKind::Connect => SpecialistError::Unavailable(format!("{}: {}", self.id, err)),
            _ => SpecialistError::Failed(err.to_string()),
        }
    }
}

pub(crate) fn render_context(context: &[ContextSnippet]) -> String {
    if context.is_empty() {
        return "No document excerpts were retrieved.\n".to_string();
    }
    let mut out = String::from("Document excerpts:\n");
    for (i, snippet) in context.iter().enumerate() {
        let _ = writeln!(out, "[{}] ({}) {}", i + 1, snippet.id, snippet.text.trim());
    }
    out
}

/// Split a trailing `CONFIDENCE: x` line off the model output.
///
/// Returns the remaining text and the parsed value clamped to `[0, 1]`. Percentages
/// such as `85%` are accepted. Without a parsable line the text is returned untouched.
pub fn parse_confidence(raw: &str) -> (String, Option<f32>) {
    let trimmed = raw.trim_end();
    let (body, last) = trimmed.rsplit_once('\n').unwrap_or(("", trimmed));

    let line = last.trim().trim_matches('*').trim();
    let Some(value) = line
        .strip_prefix("CONFIDENCE:")
        .or_else(|| line.strip_prefix("Confidence:"))
    else {
        return (raw.trim().to_string(), None);
    };

    let value = value.trim();
    let parsed = match value.strip_suffix('%') {
        Some(pct) => pct.trim().parse::<f32>().ok().map(|v| v / 100.0),
        None => value.parse::<f32>().ok(),
    };
    match parsed {
        Some(v) if v.is_finite() => (body.trim().to_string(), Some(v.clamp(0.0, 1.0))),
        _ => (raw.trim().to_string(), None),
    }
}

#[async_trait]
impl Specialist for LlmSpecialist {
    fn id(&self) -> &str {
        &self.id
    }

    fn category(&self) -> SpecialistCategory {
        self.category
    }

    async fn consult(
        &self,
        context: &[ContextSnippet],
        question: &str,
        _metadata: Option<&Value>,
    ) -> Result<Opinion, SpecialistError> {
        let user = format!("{}\nQuestion: {}", render_context(context), question.trim());
        let raw = self
            .client
            .chat(&self.system_prompt(), &user, self.model.as_deref())
            .await
            .map_err(|err| self.map_error(err))?;

        let (text, confidence) = parse_confidence(&raw);
        if text.is_empty() {
            return Err(SpecialistError::Failed(format!(
                "{} returned an empty opinion",
                self.id
            )));
        }
        Ok(Opinion::new(text, confidence.unwrap_or(DEFAULT_CONFIDENCE)))
    }
}
