//! Generation endpoint server
//!
//! An axum service in front of an OpenAI-compatible chat-completion provider.
//! It turns completions into the `{variants}` / `{raw}` bodies the fan-out
//! client normalizes, and maps provider failures onto 502 / 504 / 500.
//!
//! Routes:
//! - `POST /api/generate-persona` `{idx, persona, base}`
//! - `POST /api/generate` `{personas, base}` (batch; also answers `OPTIONS`)

pub mod prompt;
pub mod upstream;

use crate::config::{validation_failure, ProxyConfig};
use crate::error::ApiError;
use crate::types::{BaseCreative, Persona};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};
use upstream::{
    completion_text, ChatCompletion, ChatCompletionClient, ChatCompletionRequest, Completion,
    UpstreamError,
};

pub const PERSONA_ROUTE: &str = "/api/generate-persona";
pub const BATCH_ROUTE: &str = "/api/generate";

/// Endpoint-level failures, each mapped to a status and `{error}` body.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Use POST")]
    MethodNotAllowed,

    #[error("{0}")]
    BadRequest(String),

    #[error("Upstream returned status {status}")]
    Upstream { idx: Option<usize>, status: u16 },

    #[error("Upstream timed out")]
    Timeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProxyError {
    fn from_upstream(idx: Option<usize>, err: UpstreamError) -> Self {
        match err {
            UpstreamError::Status { status, body } => {
                error!(?idx, status, detail = %body, "Provider call failed");
                ProxyError::Upstream { idx, status }
            }
            UpstreamError::Timeout => {
                warn!(?idx, "Provider call timed out");
                ProxyError::Timeout
            }
            other => {
                error!(?idx, error = %other, "Provider call error");
                ProxyError::Internal(other.to_string())
            }
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ProxyError::MethodNotAllowed => {
                (StatusCode::METHOD_NOT_ALLOWED, json!({ "error": "Use POST" }))
            }
            ProxyError::BadRequest(message) => (StatusCode::BAD_REQUEST, json!({ "error": message })),
            ProxyError::Upstream { idx, status } => {
                let mut body = json!({ "error": "upstream_failed", "status": status });
                if let Some(idx) = idx {
                    body["idx"] = json!(idx);
                }
                (StatusCode::BAD_GATEWAY, body)
            }
            ProxyError::Timeout => (StatusCode::GATEWAY_TIMEOUT, json!({ "error": "timeout" })),
            ProxyError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "server_error" }),
            ),
        };
        (status, Json(body)).into_response()
    }
}

/// Shared handler state, built once from a validated [`ProxyConfig`].
pub struct ProxyState {
    backend: Arc<dyn ChatCompletion>,
    model: String,
    temperature: f32,
    upstream_timeout: Duration,
}

impl ProxyState {
    pub fn new(backend: Arc<dyn ChatCompletion>, config: &ProxyConfig) -> Self {
        Self {
            backend,
            model: config.model.clone(),
            temperature: config.temperature,
            upstream_timeout: Duration::from_millis(config.upstream_timeout_ms),
        }
    }

    /// Validate `config` and connect the reqwest-backed provider client.
    pub fn from_config(config: &ProxyConfig) -> Result<Self, ApiError> {
        config.validate().map_err(|errors| validation_failure(&errors))?;
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| ApiError::ConfigError("proxy.api_key is required".to_string()))?;
        let client = ChatCompletionClient::new(&config.api_base, api_key)
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;
        Ok(Self::new(Arc::new(client), config))
    }

    async fn complete(
        &self,
        idx: Option<usize>,
        messages: Vec<upstream::ChatMessage>,
    ) -> Result<Completion, ProxyError> {
        let request = ChatCompletionRequest::new(self.model.clone(), self.temperature, messages);
        match tokio::time::timeout(self.upstream_timeout, self.backend.complete(&request)).await {
            Ok(result) => result.map_err(|e| ProxyError::from_upstream(idx, e)),
            Err(_) => Err(ProxyError::from_upstream(idx, UpstreamError::Timeout)),
        }
    }
}

pub fn router(state: Arc<ProxyState>) -> Router {
    Router::new()
        .route(
            PERSONA_ROUTE,
            post(generate_persona).fallback(method_not_allowed),
        )
        .route(
            BATCH_ROUTE,
            post(generate_batch)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .with_state(state)
}

/// Serve on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: Arc<ProxyState>, shutdown: F) -> Result<(), ApiError>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "Generation endpoint listening");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ApiError::ServerError(e.to_string()))
}

async fn method_not_allowed() -> ProxyError {
    ProxyError::MethodNotAllowed
}

async fn preflight() -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [(header::ACCESS_CONTROL_ALLOW_METHODS, "POST,OPTIONS")],
    )
}

#[derive(Debug, Deserialize)]
struct PersonaGenerationRequest {
    #[serde(default)]
    idx: Option<usize>,
    #[serde(default)]
    persona: Persona,
    base: BaseCreative,
}

async fn generate_persona(
    State(state): State<Arc<ProxyState>>,
    body: Bytes,
) -> Result<Json<Value>, ProxyError> {
    let request: PersonaGenerationRequest = serde_json::from_slice(&body)
        .map_err(|e| ProxyError::BadRequest(format!("Invalid request body: {}", e)))?;
    let idx = request.idx;
    debug!(?idx, persona = %request.persona.name, channel = %request.base.channel, "Persona generation request");

    let payload = state
        .complete(idx, prompt::persona_messages(&request.persona, &request.base))
        .await?
        .into_payload()
        .map_err(|e| ProxyError::from_upstream(idx, e))?;
    let text = completion_text(&payload);

    let body = match serde_json::from_str::<Value>(&text) {
        Ok(parsed) => {
            let variants = match parsed.get("variants") {
                Some(variants) if !variants.is_null() => variants.clone(),
                _ => json!([]),
            };
            json!({ "idx": idx, "variants": variants })
        }
        Err(_) => json!({ "idx": idx, "raw": text }),
    };
    Ok(Json(body))
}

async fn generate_batch(
    State(state): State<Arc<ProxyState>>,
    body: Bytes,
) -> Result<Json<Value>, ProxyError> {
    let request: Value = serde_json::from_slice(&body)
        .map_err(|_| ProxyError::BadRequest("Invalid JSON body".to_string()))?;

    let personas = &request["personas"];
    let base = &request["base"];
    if !personas.is_array() || base["channel"].is_null() {
        return Err(ProxyError::BadRequest(
            "Bad request: expected { personas: Persona[], base: { channel, ... } }".to_string(),
        ));
    }
    debug!(
        personas = personas.as_array().map_or(0, Vec::len),
        "Batch generation request"
    );

    let payload = match state
        .complete(None, prompt::batch_messages(personas, base))
        .await?
    {
        Completion::Json(payload) => payload,
        Completion::Text(text) => {
            return Ok(Json(
                serde_json::from_str::<Value>(&text).unwrap_or_else(|_| json!({ "raw": text })),
            ));
        }
    };
    let text = completion_text(&payload);
    if text.is_empty() {
        return Ok(Json(json!({ "upstream": payload })));
    }

    Ok(Json(
        serde_json::from_str::<Value>(&text).unwrap_or_else(|_| json!({ "raw": text })),
    ))
}
