/// LLM Client: the single point of entry for all chat-completion calls.
///
/// ARCHITECTURAL RULE: No other module may call the remote model directly.
/// All LLM interactions MUST go through this module.
///
/// One attempt per call. Callers own the fallback; nothing here retries.
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::LlmConfig;

pub mod prompts;

/// Matches the first fenced block, with or without a `json` tag.
static FENCED_BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").expect("Invalid fence regex"));

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("no API key configured")]
    MissingCredentials,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("reply is neither JSON nor a fenced JSON block: {0}")]
    MalformedReply(String),
}

impl LlmError {
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, LlmError::Api { status: 401 | 403, .. })
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, LlmError::Api { status: 429, .. })
    }

    /// The endpoint answered, but not with usable JSON.
    pub fn is_malformed_reply(&self) -> bool {
        matches!(
            self,
            LlmError::Parse(_) | LlmError::MalformedReply(_) | LlmError::EmptyContent
        )
    }
}

/// One system + user exchange.
#[derive(Debug, Clone, Copy)]
pub struct ChatRequest<'a> {
    pub system: &'a str,
    pub prompt: &'a str,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Chat-completion client bound to one endpoint, model and timeout.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Sends one chat-completion request and returns the first choice's text.
    ///
    /// Fails fast with `MissingCredentials` before any network I/O when no key is set.
    pub async fn chat(&self, request: ChatRequest<'_>) -> Result<String, LlmError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(LlmError::MissingCredentials)?;

        let body = CompletionRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: request.system,
                },
                ChatMessage {
                    role: "user",
                    content: request.prompt,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorEnvelope>(&raw)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("status code {}", status.as_u16()));
            log_status_failure(status, &message);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let completion: CompletionResponse = response.json().await?;
        if let Some(usage) = &completion.usage {
            debug!(
                "LLM call succeeded: model={}, prompt_tokens={}, completion_tokens={}",
                self.config.model, usage.prompt_tokens, usage.completion_tokens
            );
        }

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(LlmError::EmptyContent)
    }

    /// Calls the model and decodes the reply as JSON, accepting a fenced block.
    pub async fn chat_json<T: DeserializeOwned>(
        &self,
        request: ChatRequest<'_>,
    ) -> Result<T, LlmError> {
        let text = self.chat(request).await?;
        decode_json_reply(&text)
    }
}

fn log_status_failure(status: StatusCode, message: &str) {
    match status.as_u16() {
        401 | 403 => warn!("LLM API rejected the credentials ({status}); check GROQ_API_KEY"),
        429 => warn!("LLM API rate limit exceeded ({status})"),
        _ => warn!("LLM API error ({status}): {message}"),
    }
}

/// Two-stage decode: the whole reply as JSON, then the first fenced block.
pub fn decode_json_reply<T: DeserializeOwned>(text: &str) -> Result<T, LlmError> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok(value);
    }

    let block = fenced_block(trimmed).ok_or_else(|| LlmError::MalformedReply(preview(trimmed)))?;
    serde_json::from_str(block).map_err(|_| LlmError::MalformedReply(preview(trimmed)))
}

/// Returns the body of the first ``` fence, if any.
fn fenced_block(text: &str) -> Option<&str> {
    FENCED_BLOCK_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn preview(text: &str) -> String {
    text.chars().take(80).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_decode_plain_json() {
        let v: Value = decode_json_reply("{\"key\": \"value\"}").unwrap();
        assert_eq!(v["key"], "value");
    }

    #[test]
    fn test_decode_json_fence_with_tag() {
        let input = "Here you go:\n```json\n{\"key\": \"value\"}\n```\nThanks";
        let v: Value = decode_json_reply(input).unwrap();
        assert_eq!(v["key"], "value");
    }

    #[test]
    fn test_decode_json_fence_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        let v: Value = decode_json_reply(input).unwrap();
        assert_eq!(v["key"], "value");
    }

    #[test]
    fn test_decode_prose_is_malformed() {
        let err = decode_json_reply::<Value>("Sorry, I cannot help with that.").unwrap_err();
        assert!(matches!(err, LlmError::MalformedReply(_)));
    }

    #[test]
    fn test_decode_broken_fence_is_malformed() {
        let err = decode_json_reply::<Value>("```json\n{not json}\n```").unwrap_err();
        assert!(matches!(err, LlmError::MalformedReply(_)));
    }

    #[test]
    fn test_error_classification() {
        let auth = LlmError::Api {
            status: 403,
            message: String::new(),
        };
        let limited = LlmError::Api {
            status: 429,
            message: String::new(),
        };
        assert!(auth.is_auth_failure());
        assert!(!auth.is_rate_limited());
        assert!(limited.is_rate_limited());
        assert!(!LlmError::EmptyContent.is_auth_failure());
        assert!(LlmError::EmptyContent.is_malformed_reply());
        assert!(LlmError::MalformedReply("prose".into()).is_malformed_reply());
        assert!(!auth.is_malformed_reply());
        assert!(!LlmError::MissingCredentials.is_malformed_reply());
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_network() {
        let client = LlmClient::new(LlmConfig {
            api_key: None,
            // Unroutable on purpose: the call must not get this far.
            api_url: "http://127.0.0.1:9/unused".to_string(),
            model: "test-model".to_string(),
            timeout: std::time::Duration::from_secs(1),
        })
        .unwrap();

        let err = client
            .chat(ChatRequest {
                system: "s",
                prompt: "p",
                temperature: 0.1,
                max_tokens: 10,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::MissingCredentials));
    }
}
