//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own the LLM prompting and pipeline orchestration so route
//! handlers stay focused on request/response translation and error mapping.

pub mod intent;
pub mod pipeline;
pub mod plot;
pub mod query;

use std::sync::OnceLock;

use crate::config::env_parse;

const DEFAULT_LLM_MAX_TOKENS: u32 = 512;

/// Completion budget for every LLM call, tunable via `LLM_MAX_TOKENS`.
pub(crate) fn llm_max_tokens() -> u32 {
    static VALUE: OnceLock<u32> = OnceLock::new();
    *VALUE.get_or_init(|| env_parse("LLM_MAX_TOKENS", DEFAULT_LLM_MAX_TOKENS))
}
