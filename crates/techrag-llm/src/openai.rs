//! OpenAI-compatible chat-completions transformer
//!
//! Sends the extraction instructions as the system message and the chunk
//! text as the user message, and returns the first choice's content.
//!
//! # Features
//!
//! - Async HTTP communication via `reqwest`
//! - Configurable base URL, model and request timeout
//! - Bounded retry with exponential backoff on 429 / 5xx / connection errors
//!
//! # Examples
//!
//! ```no_run
//! use techrag_llm::OpenAiTransformer;
//! use std::time::Duration;
//!
//! let transformer = OpenAiTransformer::new(
//!     "https://api.openai.com/v1",
//!     "sk-...",
//!     "gpt-5-nano",
//!     Duration::from_secs(60),
//! ).unwrap();
//! ```

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use techrag_domain::{TextTransformer, TransformError};
use tracing::{debug, warn};

/// Default OpenAI API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default number of attempts per transform call
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Chat-completions transformer for OpenAI-compatible endpoints
#[derive(Debug, Clone)]
pub struct OpenAiTransformer {
    endpoint: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
    max_attempts: u32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiTransformer {
    /// Create a new transformer
    ///
    /// # Parameters
    ///
    /// - `base_url`: API base (e.g., "https://api.openai.com/v1")
    /// - `api_key`: bearer token
    /// - `model`: model name (e.g., "gpt-5-nano")
    /// - `timeout`: per-request HTTP timeout
    pub fn new(
        base_url: impl AsRef<str>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TransformError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(TransformError::Other("missing API key".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransformError::Other(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: format!("{}/chat/completions", base_url.as_ref().trim_end_matches('/')),
            api_key,
            model: model.into(),
            client,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        })
    }

    /// Set the maximum number of attempts per call (at least one)
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Endpoint requests are posted to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send_once(&self, instructions: &str, input: &str) -> Result<String, Attempt> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage { role: "system", content: instructions },
                ChatMessage { role: "user", content: input },
            ],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                let retryable = e.is_timeout() || e.is_connect() || e.is_request();
                Attempt::new(TransformError::Communication(format!("Request failed: {}", e)), retryable)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            let error = if status == StatusCode::TOO_MANY_REQUESTS {
                TransformError::RateLimited
            } else {
                TransformError::Communication(format!("HTTP {}: {}", status, body))
            };
            let retryable = status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
            return Err(Attempt::new(error, retryable));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            Attempt::new(
                TransformError::InvalidResponse(format!("Failed to parse response: {}", e)),
                false,
            )
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| {
                Attempt::new(
                    TransformError::InvalidResponse("response has no message content".to_string()),
                    false,
                )
            })
    }
}

/// Exponential backoff after failed attempt `attempt` (1-based): 1s, 2s, 4s, etc.
fn retry_delay(attempt: u32) -> Duration {
    Duration::from_secs(2u64.saturating_pow(attempt.saturating_sub(1)))
}

/// A failed attempt and whether it is worth repeating
struct Attempt {
    error: TransformError,
    retryable: bool,
}

impl Attempt {
    fn new(error: TransformError, retryable: bool) -> Self {
        Self { error, retryable }
    }
}

#[async_trait]
impl TextTransformer for OpenAiTransformer {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn transform(&self, instructions: &str, input: &str) -> Result<String, TransformError> {
        let mut attempt = 1;
        loop {
            match self.send_once(instructions, input).await {
                Ok(content) => {
                    debug!(model = %self.model, chars = content.len(), "Transform completed");
                    return Ok(content);
                }
                Err(failed) if failed.retryable && attempt < self.max_attempts => {
                    let delay = retry_delay(attempt);
                    warn!(attempt, ?delay, error = %failed.error, "Transform failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(failed) => return Err(failed.error),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transformer_creation() {
        let transformer =
            OpenAiTransformer::new(DEFAULT_BASE_URL, "key", "gpt-5-nano", Duration::from_secs(5))
                .unwrap();
        assert_eq!(transformer.endpoint(), "https://api.openai.com/v1/chat/completions");
        assert_eq!(transformer.model_name(), "gpt-5-nano");
        assert_eq!(transformer.max_attempts, DEFAULT_MAX_ATTEMPTS);
    }

    #[test]
    fn test_retry_delay_doubles_and_saturates() {
        assert_eq!(retry_delay(1), Duration::from_secs(1));
        assert_eq!(retry_delay(3), Duration::from_secs(4));
        assert_eq!(retry_delay(100), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let transformer =
            OpenAiTransformer::new("http://localhost:8000/v1/", "key", "m", Duration::from_secs(5))
                .unwrap();
        assert_eq!(transformer.endpoint(), "http://localhost:8000/v1/chat/completions");
    }

    #[test]
    fn test_missing_api_key_is_rejected() {
        let result = OpenAiTransformer::new(DEFAULT_BASE_URL, "  ", "m", Duration::from_secs(5));
        assert!(matches!(result, Err(TransformError::Other(_))));
    }

    #[test]
    fn test_max_attempts_is_at_least_one() {
        let transformer = OpenAiTransformer::new(DEFAULT_BASE_URL, "key", "m", Duration::from_secs(5))
            .unwrap()
            .with_max_attempts(0);
        assert_eq!(transformer.max_attempts, 1);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_communication_error() {
        let transformer =
            OpenAiTransformer::new("http://127.0.0.1:9", "key", "m", Duration::from_secs(2))
                .unwrap()
                .with_max_attempts(1);

        let result = transformer.transform("instructions", "input").await;
        assert!(matches!(result, Err(TransformError::Communication(_))));
    }
}
