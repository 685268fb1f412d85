//! Groq API client — OpenAI-compatible `/chat/completions` over `reqwest`.
//!
//! DESIGN
//! ======
//! Groq serves the OpenAI chat-completions wire format, so the request body
//! is typed and the response is parsed leniently out of `serde_json::Value`.
//! Both request and connect timeouts are set on the client; a hung provider
//! fails the call instead of wedging the request handler.

use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use super::config::LlmTimeouts;
use super::types::{ChatResponse, LlmError, Message};

pub struct GroqClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GroqClient {
    /// Build a client for the given endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::HttpClientBuild`] if the HTTP client cannot be
    /// constructed.
    pub fn new(api_key: String, base_url: String, timeouts: LlmTimeouts) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| LlmError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, api_key, base_url: base_url.trim_end_matches('/').to_string() })
    }

    /// Send one chat-completions request.
    ///
    /// # Errors
    ///
    /// Returns an [`LlmError`] on transport failure, non-200 status, or an
    /// unparseable body.
    pub async fn chat(
        &self,
        model: &str,
        max_tokens: u32,
        system: &str,
        messages: &[Message],
    ) -> Result<ChatResponse, LlmError> {
        let msgs = build_messages(system, messages);
        let body = ChatRequest { model, max_tokens, messages: &msgs };
        let text = self.send_json("/chat/completions", &body).await?;
        parse_chat_response(&text)
    }

    async fn send_json(&self, path: &str, body: &impl Serialize) -> Result<String, LlmError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| LlmError::ApiRequest(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| LlmError::ApiRequest(e.to_string()))?;
        if status != 200 {
            return Err(LlmError::ApiResponse { status, body: text });
        }
        Ok(text)
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: &'a [WireMessage<'a>],
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

fn build_messages<'a>(system: &'a str, messages: &'a [Message]) -> Vec<WireMessage<'a>> {
    let mut out = Vec::with_capacity(messages.len() + 1);
    if !system.trim().is_empty() {
        out.push(WireMessage { role: "system", content: system });
    }
    for message in messages {
        out.push(WireMessage { role: &message.role, content: &message.content });
    }
    out
}

// =============================================================================
// RESPONSE PARSING
// =============================================================================

pub(crate) fn parse_chat_response(json_text: &str) -> Result<ChatResponse, LlmError> {
    let root: Value = serde_json::from_str(json_text).map_err(|e| LlmError::ApiParse(e.to_string()))?;
    let model = root
        .get("model")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .unwrap_or_default();
    let input_tokens = root
        .get("usage")
        .and_then(|u| u.get("prompt_tokens"))
        .and_then(Value::as_u64)
        .unwrap_or(0);
    let output_tokens = root
        .get("usage")
        .and_then(|u| u.get("completion_tokens"))
        .and_then(Value::as_u64)
        .unwrap_or(0);

    let Some(choice) = root
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|arr| arr.first())
    else {
        return Err(LlmError::ApiParse("chat_completions: missing choices[0]".to_string()));
    };
    let text = choice
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Ok(ChatResponse { text, model, input_tokens, output_tokens })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_text_response() {
        let json = serde_json::json!({
            "model": "llama-3.1-8b-instant",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": "visualization" },
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 12, "completion_tokens": 1 }
        })
        .to_string();
        let resp = parse_chat_response(&json).unwrap();
        assert_eq!(resp.text, "visualization");
        assert_eq!(resp.model, "llama-3.1-8b-instant");
        assert_eq!(resp.input_tokens, 12);
        assert_eq!(resp.output_tokens, 1);
    }

    #[test]
    fn parse_missing_choices_is_error() {
        let json = serde_json::json!({ "model": "llama-3.1-8b-instant", "choices": [] }).to_string();
        assert!(matches!(parse_chat_response(&json).unwrap_err(), LlmError::ApiParse(_)));
    }

    #[test]
    fn parse_null_content_is_empty_text() {
        let json = serde_json::json!({
            "model": "m",
            "choices": [{ "message": { "role": "assistant", "content": null } }]
        })
        .to_string();
        let resp = parse_chat_response(&json).unwrap();
        assert!(resp.text.is_empty());
    }

    #[test]
    fn parse_garbage_is_error() {
        assert!(parse_chat_response("not json").is_err());
    }

    #[test]
    fn build_messages_prepends_system() {
        let msgs = vec![Message::user("hi")];
        let wire = build_messages("be helpful", &msgs);
        assert_eq!(wire.len(), 2);
        assert_eq!(wire[0].role, "system");
        assert_eq!(wire[1].role, "user");
    }

    #[test]
    fn build_messages_skips_blank_system() {
        let msgs = vec![Message::user("hi")];
        let wire = build_messages("  ", &msgs);
        assert_eq!(wire.len(), 1);
    }
}
