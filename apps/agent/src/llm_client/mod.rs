//! Chat transport — the single point of entry for all LLM calls in the agent.
//!
//! ARCHITECTURAL RULE: no other module may talk to the chat endpoint directly.
//! The orchestrator depends on the [`ChatTransport`] trait so tests can script
//! replies without a network.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::config::{AgentConfig, SamplingParameters};

/// Errors from a chat round-trip. All variants are fatal to the invocation:
/// the agent treats the chat endpoint as a required, synchronously-available
/// dependency and deliberately never retries.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("failed to reach the chat endpoint (is the Ollama server running?): {0}")]
    Http(#[from] reqwest::Error),

    #[error("chat endpoint returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("JSON serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// One role-tagged message of a chat conversation.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

/// One synchronous request/response cycle against a chat-completion endpoint.
///
/// Implemented by [`OllamaClient`] in production and by scripted mocks in
/// the orchestrator tests.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Sends the messages and returns the assistant reply text, empty string
    /// if the response carried no content.
    async fn chat(
        &self,
        config: &AgentConfig,
        messages: &[ChatMessage],
    ) -> Result<String, ChatError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: SamplingParameters,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    message: Option<AssistantMessage>,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: String,
}

/// `reqwest`-backed transport for an Ollama-style `/api/chat` endpoint.
#[derive(Clone, Default)]
pub struct OllamaClient {
    http: Client,
}

impl OllamaClient {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatTransport for OllamaClient {
    async fn chat(
        &self,
        config: &AgentConfig,
        messages: &[ChatMessage],
    ) -> Result<String, ChatError> {
        let body = ChatRequest {
            model: &config.model,
            messages,
            stream: false,
            options: config.sampling(),
        };

        let url = format!("{}/api/chat", config.base_url.trim_end_matches('/'));
        let response = self
            .http
            .post(&url)
            .timeout(config.timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ChatError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let reply: ChatResponse = response.json().await?;
        let content = reply.message.map(|m| m.content).unwrap_or_default();
        debug!("chat reply received: {} chars", content.len());
        Ok(content)
    }
}

/// Best-effort recovery of a JSON object from free-form model text.
///
/// Strict parse first; on failure, parse the substring between the first `{`
/// and the last `}` inclusive. Anything else degrades to an empty map — this
/// function never fails, because the pipeline must stay total in the face of
/// an unreliable generator.
pub fn extract_json(raw: &str) -> Map<String, Value> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Map::new();
    }
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(raw) {
        return map;
    }
    if let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) {
        if end > start {
            if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&raw[start..=end]) {
                return map;
            }
        }
    }
    Map::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_json_direct_object() {
        let map = extract_json(r#"{"a": 1}"#);
        assert_eq!(map.get("a"), Some(&json!(1)));
    }

    #[test]
    fn test_extract_json_wrapped_in_prose() {
        let map = extract_json("here is json: {\"a\":1} thanks");
        assert_eq!(map.get("a"), Some(&json!(1)));
    }

    #[test]
    fn test_extract_json_code_fenced() {
        let map = extract_json("```json\n{\"tool_calls\": []}\n```");
        assert_eq!(map.get("tool_calls"), Some(&json!([])));
    }

    #[test]
    fn test_extract_json_no_json_returns_empty() {
        assert!(extract_json("no json here").is_empty());
    }

    #[test]
    fn test_extract_json_empty_input_returns_empty() {
        assert!(extract_json("   ").is_empty());
    }

    #[test]
    fn test_extract_json_nested_braces_survive_brace_scan() {
        let map = extract_json("reply: {\"outer\": {\"inner\": 2}} done");
        assert_eq!(map.get("outer"), Some(&json!({"inner": 2})));
    }

    #[test]
    fn test_extract_json_non_object_returns_empty() {
        assert!(extract_json("[1, 2, 3]").is_empty());
        assert!(extract_json("42").is_empty());
    }

    #[test]
    fn test_extract_json_unparseable_braces_returns_empty() {
        assert!(extract_json("{not json}").is_empty());
    }

    #[test]
    fn test_chat_request_wire_shape() {
        let config = AgentConfig::default();
        let messages = vec![ChatMessage::system("sys"), ChatMessage::user("hi")];
        let body = ChatRequest {
            model: &config.model,
            messages: &messages,
            stream: false,
            options: config.sampling(),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["model"], "llama3.1:8b");
        assert_eq!(value["stream"], false);
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "hi");
        assert_eq!(value["options"]["num_predict"], 700);
        assert!(value["options"]["temperature"].is_number());
        assert!(value["options"]["top_p"].is_number());
    }

    #[test]
    fn test_chat_response_missing_message_yields_empty_content() {
        let reply: ChatResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(reply.message.map(|m| m.content).unwrap_or_default(), "");
    }
}
