//! Dataset Q&A and executive insights — whole-dataset LLM prompts.
//!
//! DESIGN
//! ======
//! Both operations serialize the entire dataset as a fenced JSON array into
//! a single prompt. There is no truncation or token budgeting; oversized
//! datasets surface as a provider-side error on the chat call. Each call
//! re-reads nothing itself — callers load the dataset and pass it in.

use std::sync::Arc;

use tracing::info;

use super::llm_max_tokens;
use crate::dataset::{Dataset, DatasetError};
use crate::llm::LlmChat;
use crate::llm::types::{LlmError, Message};

/// Fixed analyst persona for the query path.
pub const SYSTEM_INSTRUCTION: &str = "Act as a highly skilled data analyst. Respond to user queries based on the \
     provided dataset. If the question is not about the data, answer it as a general conversational AI. If the \
     question is vulgar, harmful, or inappropriate, refuse to answer politely. Provide concise, brief answers in \
     short paragraphs or lines to keep the chat fluid.";

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("dataset error: {0}")]
    Dataset(#[from] DatasetError),
}

/// Answer a free-text question about the dataset.
///
/// # Errors
///
/// Returns a [`QueryError`] if serialization or the chat call fails.
pub async fn answer(llm: &Arc<dyn LlmChat>, dataset: &Dataset, message: &str) -> Result<String, QueryError> {
    let dataset_json = dataset.to_json_pretty()?;
    let response = llm
        .chat(llm_max_tokens(), SYSTEM_INSTRUCTION, &[Message::user(query_prompt(&dataset_json, message))])
        .await?;
    info!(output_tokens = response.output_tokens, "query answered");
    Ok(response.text)
}

/// Produce an executive summary of the dataset.
///
/// # Errors
///
/// Returns a [`QueryError`] if serialization or the chat call fails.
pub async fn summarize(llm: &Arc<dyn LlmChat>, dataset: &Dataset) -> Result<String, QueryError> {
    let dataset_json = dataset.to_json_pretty()?;
    let response = llm
        .chat(llm_max_tokens(), SYSTEM_INSTRUCTION, &[Message::user(insights_prompt(&dataset_json))])
        .await?;
    info!(output_tokens = response.output_tokens, "insights generated");
    Ok(response.text)
}

fn query_prompt(dataset_json: &str, message: &str) -> String {
    format!(
        "Analyze the following dataset provided in JSON format and answer my query. If my query is not related to \
         the dataset, please answer it generally. Do not answer vulgar or inappropriate questions.\n\n\
         Dataset:\n```json\n{dataset_json}\n```\n\nMy query: \"{message}\""
    )
}

fn insights_prompt(dataset_json: &str) -> String {
    format!(
        "You are an expert data analyst. Analyze the dataset provided below and generate a professional, concise, \
         and easy-to-understand summary for a non-technical audience.\n\n\
         Your summary should include:\n\
         1. High-level trends in the data (e.g., distributions, common values, ranges for numeric fields).\n\
         2. Diversity and variety in categorical fields.\n\
         3. Patterns, correlations, or interesting observations.\n\
         4. Key takeaways that help understand the dataset meaningfully.\n\
         5. Actionable suggestions or recommendations based on the insights.\n\
         6. Avoid focusing on missing values, formatting errors, or data cleaning issues.\n\
         The dataset is in JSON format:\n\n```json\n{dataset_json}\n```"
    )
}

#[cfg(test)]
#[path = "query_test.rs"]
mod tests;
