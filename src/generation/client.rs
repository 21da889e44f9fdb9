//! Generation endpoint client
//!
//! The orchestrator talks to the generation endpoint through
//! [`GenerationClient`]; [`HttpGenerationClient`] is the reqwest-backed
//! implementation. Clients only move bytes: deadlines and retries belong to
//! the orchestrator's retry policy, and body shapes to `payload`.

use crate::error::{ApiError, GenerationError};
use crate::types::{BaseCreative, Persona};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Request body posted to the generation endpoint.
#[derive(Debug, Serialize)]
pub struct PersonaRequest<'a> {
    pub idx: usize,
    pub persona: &'a Persona,
    pub base: &'a BaseCreative,
}

#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Request variants for one persona and return the decoded JSON body.
    async fn request_variants(
        &self,
        idx: usize,
        persona: &Persona,
        base: &BaseCreative,
    ) -> Result<Value, GenerationError>;
}

const ENDPOINT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const ERROR_BODY_PREVIEW_CHARS: usize = 500;

/// POSTs `{ idx, persona, base }` to the configured endpoint URL.
pub struct HttpGenerationClient {
    client: Client,
    endpoint: String,
}

impl HttpGenerationClient {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .no_proxy()
            .connect_timeout(ENDPOINT_CONNECT_TIMEOUT)
            .build()
            .map_err(|e| ApiError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn map_http_error(error: reqwest::Error) -> GenerationError {
    if error.is_timeout() {
        GenerationError::Transport(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        GenerationError::Transport(format!("Connection error: {}", error))
    } else if error.is_decode() {
        GenerationError::MalformedResponse(format!("Undecodable body: {}", error))
    } else {
        GenerationError::Transport(format!("HTTP error: {}", error))
    }
}

#[async_trait]
impl GenerationClient for HttpGenerationClient {
    async fn request_variants(
        &self,
        idx: usize,
        persona: &Persona,
        base: &BaseCreative,
    ) -> Result<Value, GenerationError> {
        debug!(idx, endpoint = %self.endpoint, "Posting persona generation request");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&PersonaRequest {
                idx,
                persona,
                base,
            })
            .send()
            .await
            .map_err(map_http_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::UpstreamStatus {
                status: status.as_u16(),
                body: body.chars().take(ERROR_BODY_PREVIEW_CHARS).collect(),
            });
        }

        let text = response.text().await.map_err(map_http_error)?;
        serde_json::from_str(&text)
            .map_err(|e| GenerationError::MalformedResponse(format!("Body is not JSON: {}", e)))
    }
}
