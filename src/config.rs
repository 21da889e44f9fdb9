//! Configuration System
//!
//! Layered configuration built on the `config` crate. Later layers win:
//!
//! 1. Built-in defaults (serde defaults on every section)
//! 2. Global file: `$XDG_CONFIG_HOME/persona-sim/config.toml` (or `~/.config/...`)
//! 3. Working directory file: `./persona-sim.toml`
//! 4. Explicit `--config <file>` (replaces layers 2 and 3)
//! 5. Environment: `PERSONA_SIM_<SECTION>__<KEY>`, e.g. `PERSONA_SIM_RETRY__MAX_ATTEMPTS=3`

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use config::{Config, ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const APP_DIR_NAME: &str = "persona-sim";
pub const WORKING_CONFIG_FILE: &str = "persona-sim.toml";
pub const ENV_PREFIX: &str = "PERSONA_SIM";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Generation endpoint the orchestrator posts to
    #[serde(default)]
    pub endpoint: EndpointConfig,

    /// Per-persona retry budget
    #[serde(default)]
    pub retry: RetryConfig,

    /// Generation endpoint server settings (`serve` only)
    #[serde(default)]
    pub proxy: ProxyConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    #[serde(default = "default_endpoint_url")]
    pub url: String,
}

fn default_endpoint_url() -> String {
    "http://127.0.0.1:8787/api/generate-persona".to_string()
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: default_endpoint_url(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per persona, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_attempt_timeout_ms")]
    pub attempt_timeout_ms: u64,

    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,

    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,
}

fn default_max_attempts() -> u32 {
    2
}

fn default_attempt_timeout_ms() -> u64 {
    18_000
}

fn default_backoff_ms() -> u64 {
    250
}

fn default_jitter_ms() -> u64 {
    50
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            attempt_timeout_ms: default_attempt_timeout_ms(),
            backoff_ms: default_backoff_ms(),
            jitter_ms: default_jitter_ms(),
        }
    }
}

/// Settings for the generation endpoint server. Built once at startup and
/// handed to the handlers; nothing downstream reads the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Base URL of the OpenAI-compatible provider, without `/v1/...`
    #[serde(default = "default_api_base")]
    pub api_base: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Provider call deadline. Kept below the client's attempt timeout so the
    /// server answers 504 before the client gives up.
    #[serde(default = "default_upstream_timeout_ms")]
    pub upstream_timeout_ms: u64,
}

fn default_bind() -> String {
    "127.0.0.1:8787".to_string()
}

fn default_api_base() -> String {
    "https://api.openai.com".to_string()
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_temperature() -> f32 {
    0.6
}

fn default_upstream_timeout_ms() -> u64 {
    15_000
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            api_base: default_api_base(),
            api_key: None,
            model: default_model(),
            temperature: default_temperature(),
            upstream_timeout_ms: default_upstream_timeout_ms(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    Endpoint(String),
    Retry(String),
    Proxy(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Endpoint(msg) => write!(f, "Endpoint: {}", msg),
            ValidationError::Retry(msg) => write!(f, "Retry: {}", msg),
            ValidationError::Proxy(msg) => write!(f, "Proxy: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Collapse validation errors into one `ApiError::ConfigError`.
pub fn validation_failure(errors: &[ValidationError]) -> ApiError {
    let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    ApiError::ConfigError(format!(
        "Configuration validation failed:\n{}",
        messages.join("\n")
    ))
}

fn check_http_url(url: &str) -> Result<(), String> {
    let parsed = reqwest::Url::parse(url).map_err(|e| format!("invalid URL '{}': {}", url, e))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("URL '{}' must use http or https, not {}", url, other)),
    }
}

impl RetryConfig {
    pub const MAX_ATTEMPTS: u32 = 10;
    pub const MAX_ATTEMPT_TIMEOUT_MS: u64 = 600_000;
    pub const MAX_DELAY_MS: u64 = 60_000;

    pub fn validate(&self) -> Result<(), String> {
        if !(1..=Self::MAX_ATTEMPTS).contains(&self.max_attempts) {
            return Err(format!(
                "max_attempts must be between 1 and {}",
                Self::MAX_ATTEMPTS
            ));
        }
        if !(1..=Self::MAX_ATTEMPT_TIMEOUT_MS).contains(&self.attempt_timeout_ms) {
            return Err(format!(
                "attempt_timeout_ms must be between 1 and {}",
                Self::MAX_ATTEMPT_TIMEOUT_MS
            ));
        }
        if self.backoff_ms > Self::MAX_DELAY_MS || self.jitter_ms > Self::MAX_DELAY_MS {
            return Err(format!(
                "backoff_ms and jitter_ms must be at most {}",
                Self::MAX_DELAY_MS
            ));
        }
        Ok(())
    }
}

impl ProxyConfig {
    /// Validate everything `serve` needs, reporting all problems at once.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.bind.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::Proxy(format!(
                "bind address '{}' is not a socket address",
                self.bind
            )));
        }
        if let Err(e) = check_http_url(&self.api_base) {
            errors.push(ValidationError::Proxy(format!("api_base: {}", e)));
        }
        if self.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            errors.push(ValidationError::Proxy(
                "api_key is required (set proxy.api_key or OPENAI_API_KEY)".to_string(),
            ));
        }
        if self.model.trim().is_empty() {
            errors.push(ValidationError::Proxy("model cannot be empty".to_string()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            errors.push(ValidationError::Proxy(format!(
                "temperature {} must be between 0 and 2",
                self.temperature
            )));
        }
        if self.upstream_timeout_ms == 0 {
            errors.push(ValidationError::Proxy(
                "upstream_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl AppConfig {
    /// Validate the client-side configuration. Proxy settings are validated
    /// separately by `serve`, since generation never needs them.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = check_http_url(&self.endpoint.url) {
            errors.push(ValidationError::Endpoint(e));
        }
        if let Err(e) = self.retry.validate() {
            errors.push(ValidationError::Retry(e));
        }
        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Copy with secrets masked, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.proxy.api_key.is_some() {
            copy.proxy.api_key = Some("***".to_string());
        }
        copy
    }
}

/// Path to the global config file, honoring `XDG_CONFIG_HOME`.
pub fn global_config_path() -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))?;
    Some(base.join(APP_DIR_NAME).join("config.toml"))
}

/// Resolves the configuration layers and deserializes them into [`AppConfig`].
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    global_file: Option<PathBuf>,
    working_dir: Option<PathBuf>,
    explicit_file: Option<PathBuf>,
}

impl ConfigLoader {
    /// Standard discovery: global file plus `persona-sim.toml` in `working_dir`.
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            global_file: global_config_path(),
            working_dir: Some(working_dir.into()),
            explicit_file: None,
        }
    }

    /// Use only `path` as the file layer.
    pub fn with_file(path: impl Into<PathBuf>) -> Self {
        Self {
            global_file: None,
            working_dir: None,
            explicit_file: Some(path.into()),
        }
    }

    /// Override the global file location (`None` disables it).
    pub fn global_file(mut self, path: Option<PathBuf>) -> Self {
        self.global_file = path;
        self
    }

    /// Load with standard discovery from `working_dir`.
    pub fn load(working_dir: &Path) -> Result<AppConfig, ApiError> {
        Self::new(working_dir).build()
    }

    /// Load an explicit config file plus environment overrides.
    pub fn load_from_file(path: &Path) -> Result<AppConfig, ApiError> {
        if !path.exists() {
            return Err(ApiError::ConfigError(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        Self::with_file(path).build()
    }

    pub fn build(&self) -> Result<AppConfig, ApiError> {
        let mut builder: ConfigBuilder<config::builder::DefaultState> = Config::builder();

        if let Some(explicit) = &self.explicit_file {
            builder = builder.add_source(File::from(explicit.as_path()).required(true));
        } else {
            if let Some(global) = self.global_file.as_ref().filter(|p| p.exists()) {
                debug!(config_path = %global.display(), "Loading global configuration");
                builder = builder.add_source(File::from(global.as_path()).required(false));
            }
            if let Some(dir) = &self.working_dir {
                let local = dir.join(WORKING_CONFIG_FILE);
                if local.exists() {
                    debug!(config_path = %local.display(), "Loading working directory configuration");
                    builder = builder.add_source(File::from(local).required(false));
                }
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let mut config: AppConfig = builder.build()?.try_deserialize()?;
        if config.proxy.api_key.is_none() {
            config.proxy.api_key = std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty());
        }
        Ok(config)
    }
}
