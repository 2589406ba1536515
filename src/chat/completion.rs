//! Remote chat-completion client
//!
//! Speaks the OpenAI chat-completion wire format to any compatible endpoint
//! (OpenAI, Ollama, vLLM, LM Studio, etc.). One request per call, no retries:
//! the orchestrator treats any failure as a signal to answer locally.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::OpenAiSettings;
use crate::error::{Error, Result};

/// Returned when a successful response carries no usable completion.
pub const NO_RESPONSE: &str = "No response received";

/// Used when a failed response does not say what went wrong.
const DEFAULT_FAILURE: &str = "API request failed";

// ─────────────────────────────────────────────────────────────────
// Remote Error
// ─────────────────────────────────────────────────────────────────

/// Why a remote completion did not produce text.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RemoteError {
    /// Non-2xx response, with the service's own error message when present
    #[error("Completion service returned {status}: {message}")]
    Status { status: u16, message: String },

    /// No response within the configured timeout
    #[error("Completion request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// Connection, TLS or protocol failure
    #[error("Completion request failed: {0}")]
    Transport(String),

    /// 2xx response whose body could not be decoded
    #[error("Malformed completion response: {0}")]
    Malformed(String),
}

// ─────────────────────────────────────────────────────────────────
// Completion Client
// ─────────────────────────────────────────────────────────────────

/// Anything that can turn a system prompt and a user message into a reply.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Issue a single completion request authorized by `api_key`.
    async fn complete(
        &self,
        api_key: &str,
        system_prompt: &str,
        user_message: &str,
    ) -> std::result::Result<String, RemoteError>;
}

// ─────────────────────────────────────────────────────────────────
// OpenAI API types (request/response)
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

// ─────────────────────────────────────────────────────────────────
// OpenAI Client
// ─────────────────────────────────────────────────────────────────

/// OpenAI-compatible completion client
pub struct OpenAiCompletionClient {
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    timeout_secs: u64,
    client: Client,
}

impl OpenAiCompletionClient {
    /// Create a client from the `[openai]` configuration section
    pub fn new(settings: &OpenAiSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;

        debug!(
            base_url = %settings.base_url,
            model = %settings.model,
            "Completion client created"
        );

        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            timeout_secs: settings.timeout_secs,
            client,
        })
    }

    fn auth_header(api_key: &str) -> String {
        format!("Bearer {}", api_key)
    }

    fn transport_error(&self, e: reqwest::Error) -> RemoteError {
        if e.is_timeout() {
            RemoteError::Timeout {
                timeout_secs: self.timeout_secs,
            }
        } else {
            RemoteError::Transport(e.to_string())
        }
    }

    /// Check that the endpoint accepts `api_key` (GET /models).
    pub async fn test_connection(&self, api_key: &str) -> std::result::Result<(), RemoteError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", Self::auth_header(api_key))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status.is_success() {
            info!(url = %url, "Completion service reachable");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(RemoteError::Status {
            status: status.as_u16(),
            message: error_message(&body),
        })
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompletionClient {
    async fn complete(
        &self,
        api_key: &str,
        system_prompt: &str,
        user_message: &str,
    ) -> std::result::Result<String, RemoteError> {
        let request_body = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_message,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let url = format!("{}/chat/completions", self.base_url);
        debug!(url = %url, model = %self.model, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", Self::auth_header(api_key))
            .json(&request_body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(RemoteError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|e| RemoteError::Malformed(e.to_string()))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.is_empty())
            .unwrap_or_else(|| NO_RESPONSE.to_string());

        debug!(chars = text.len(), "Completion received");
        Ok(text)
    }
}

/// The service's `error.message`, or a generic description.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .and_then(|e| e.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_FAILURE.to_string())
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
