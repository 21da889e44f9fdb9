//! Chat-completion provider client used by the generation endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Failure talking to the chat-completion provider.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Provider returned status {status}")]
    Status { status: u16, body: String },

    #[error("Provider call timed out")]
    Timeout,

    #[error("Provider transport error: {0}")]
    Transport(String),

    #[error("Provider response is not JSON: {0}")]
    Decode(String),
}

/// Chat message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Non-streaming chat-completion request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub stream: bool,
}

impl ChatCompletionRequest {
    pub fn new(model: impl Into<String>, temperature: f32, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature,
            stream: false,
        }
    }
}

/// Successful provider reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// JSON body; normally an OpenAI-compatible chat completion.
    Json(Value),
    /// Body served without a JSON content type. Some gateways answer
    /// `text/plain`, sometimes with JSON inside.
    Text(String),
}

impl Completion {
    /// The reply as a JSON payload, parsing a text body when it holds JSON.
    pub fn into_payload(self) -> Result<Value, UpstreamError> {
        match self {
            Completion::Json(payload) => Ok(payload),
            Completion::Text(text) => {
                serde_json::from_str(&text).map_err(|e| UpstreamError::Decode(e.to_string()))
            }
        }
    }
}

/// Backend seam for the endpoint handlers. [`completion_text`] extracts the
/// message content from a JSON payload.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(&self, request: &ChatCompletionRequest) -> Result<Completion, UpstreamError>;
}

/// Text of the first choice. Content may be a plain string or an array of
/// `{ text }` parts, which are joined with newlines. Returns an empty string
/// when there is no usable content.
pub fn completion_text(payload: &Value) -> String {
    let content = &payload["choices"][0]["message"]["content"];
    match content {
        Value::String(text) => text.clone(),
        Value::Array(parts) => parts
            .iter()
            .map(|part| part["text"].as_str().unwrap_or(""))
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string(),
        _ => String::new(),
    }
}

const PROVIDER_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const ERROR_BODY_PREVIEW_CHARS: usize = 500;

/// OpenAI-compatible provider: `POST {api_base}/v1/chat/completions` with
/// bearer auth.
pub struct ChatCompletionClient {
    client: Client,
    api_base: String,
    api_key: String,
}

impl ChatCompletionClient {
    pub fn new(api_base: &str, api_key: impl Into<String>) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .connect_timeout(PROVIDER_CONNECT_TIMEOUT)
            .build()
            .map_err(|e| UpstreamError::Transport(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn url(&self) -> String {
        format!("{}/v1/chat/completions", self.api_base)
    }
}

fn map_http_error(error: reqwest::Error) -> UpstreamError {
    if error.is_timeout() {
        UpstreamError::Timeout
    } else if error.is_decode() {
        UpstreamError::Decode(error.to_string())
    } else {
        UpstreamError::Transport(error.to_string())
    }
}

#[async_trait]
impl ChatCompletion for ChatCompletionClient {
    async fn complete(&self, request: &ChatCompletionRequest) -> Result<Completion, UpstreamError> {
        let url = self.url();
        debug!(url = %url, model = %request.model, "Calling chat-completion provider");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(request)
            .send()
            .await
            .map_err(map_http_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body: body.chars().take(ERROR_BODY_PREVIEW_CHARS).collect(),
            });
        }

        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("application/json"));
        let text = response.text().await.map_err(map_http_error)?;
        if !is_json {
            debug!(bytes = text.len(), "Provider answered without a JSON content type");
            return Ok(Completion::Text(text));
        }
        serde_json::from_str(&text)
            .map(Completion::Json)
            .map_err(|e| UpstreamError::Decode(e.to_string()))
    }
}
