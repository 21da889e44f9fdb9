//! Error types for persona copy generation.

use std::time::Duration;
use thiserror::Error;

/// Failure of a single remote generation attempt.
///
/// Every variant is recoverable: the orchestrator retries once and then
/// substitutes local variants. None of these reach the end user directly.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    #[error("Attempt timed out after {0:?}")]
    Timeout(Duration),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Endpoint returned status {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Unrecognized response shape: {0}")]
    UnrecognizedShape(String),
}

/// Session state errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("At most {max} personas are allowed")]
    PersonaLimit { max: usize },

    #[error("Persona index {0} is out of range")]
    PersonaOutOfRange(usize),

    #[error("A session must keep at least one persona")]
    LastPersona,
}

/// Crate-level errors surfaced to the CLI and server entry points.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Export failed: {0}")]
    ExportFailed(String),

    #[error("Invalid session file {path}: {message}")]
    InvalidSessionFile { path: String, message: String },

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
