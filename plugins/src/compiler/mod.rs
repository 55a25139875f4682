mod digest;
mod llm;

pub use digest::DigestCompiler;
pub use llm::LlmCompiler;

use consilium_core::api::ContextSnippet;

/// Snippet text cut to `max_chars` characters, with an ellipsis when truncated.
pub(crate) fn excerpt(snippet: &ContextSnippet, max_chars: usize) -> String {
    let text = snippet.text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push('…');
    out
}
