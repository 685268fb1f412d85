//! Intent routing — one LLM call decides visualization vs query.
//!
//! DESIGN
//! ======
//! The classifier prompt asks for a single word. Only a reply that is
//! exactly `visualization` after trimming and lowercasing takes the plot
//! path; every other reply, including malformed output that ignored the
//! one-word constraint, falls through to the query path. No retry.

use std::sync::Arc;

use tracing::info;

use super::llm_max_tokens;
use crate::llm::LlmChat;
use crate::llm::types::{LlmError, Message};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Visualization,
    Query,
}

/// Classify one user message.
///
/// # Errors
///
/// Returns an [`LlmError`] if the classification call itself fails.
pub async fn classify(llm: &Arc<dyn LlmChat>, message: &str) -> Result<Intent, LlmError> {
    let response = llm
        .chat(llm_max_tokens(), "", &[Message::user(intent_prompt(message))])
        .await?;
    let intent = route(&response.text);
    info!(raw = %response.text.trim(), ?intent, "intent classified");
    Ok(intent)
}

/// Exact-match routing on the normalized reply.
fn route(raw: &str) -> Intent {
    if raw.trim().to_lowercase() == "visualization" { Intent::Visualization } else { Intent::Query }
}

fn intent_prompt(message: &str) -> String {
    format!(
        r#"Analyze the user's message to determine if it's a request for a data visualization.

- If the user asks for a chart, graph, plot, or visual representation, respond with "visualization".
- If the user asks for a summary, analysis, or data information in text format, respond with "query".
- Respond with only a single word.

User message: "{message}""#
    )
}

#[cfg(test)]
#[path = "intent_test.rs"]
mod tests;
