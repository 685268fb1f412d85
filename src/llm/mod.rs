//! LLM — Groq-backed chat client for intent routing, plot specs, and
//! dataset Q&A.
//!
//! DESIGN
//! ======
//! One provider (Groq's OpenAI-compatible endpoint), configured from
//! environment variables. Everything downstream depends on the [`LlmChat`]
//! trait so tests can script responses without network access.

pub mod config;
pub mod groq;
pub mod types;

use config::LlmConfig;
pub use types::LlmChat;
use types::{ChatResponse, LlmError, Message};

/// Concrete LLM client bound to a model name.
///
/// Configured from environment variables by [`LlmClient::from_env`].
pub struct LlmClient {
    inner: groq::GroqClient,
    model: String,
}

impl LlmClient {
    /// Build an LLM client from environment variables (see [`LlmConfig::from_env`]).
    ///
    /// # Errors
    ///
    /// Returns an error if `GROQ_API_KEY` is missing or the HTTP client
    /// fails to build.
    pub fn from_env() -> Result<Self, LlmError> {
        Self::from_config(LlmConfig::from_env()?)
    }

    /// Build an LLM client from a parsed typed config.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn from_config(config: LlmConfig) -> Result<Self, LlmError> {
        let inner = groq::GroqClient::new(config.api_key, config.base_url, config.timeouts)?;
        Ok(Self { inner, model: config.model })
    }

    /// The configured model name (e.g. `"llama-3.1-8b-instant"`).
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait::async_trait]
impl LlmChat for LlmClient {
    async fn chat(&self, max_tokens: u32, system: &str, messages: &[Message]) -> Result<ChatResponse, LlmError> {
        self.inner.chat(&self.model, max_tokens, system, messages).await
    }
}
