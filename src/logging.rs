//! Logging System
//!
//! Structured logging via `tracing`. Level, format and destination come from
//! the `[logging]` config section, overridden by `PERSONA_SIM_LOG*`
//! environment variables and then by CLI flags. Logs default to stderr so
//! command output on stdout stays machine-readable.

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

pub const ENV_LOG: &str = "PERSONA_SIM_LOG";
pub const ENV_LOG_FORMAT: &str = "PERSONA_SIM_LOG_FORMAT";
pub const ENV_LOG_OUTPUT: &str = "PERSONA_SIM_LOG_OUTPUT";
pub const ENV_LOG_MODULES: &str = "PERSONA_SIM_LOG_MODULES";

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Disable all logging (`--quiet`)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level: trace, debug, info, warn, error, off
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: json, text
    #[serde(default = "default_format")]
    pub format: String,

    /// Output destination: stdout, stderr, file
    #[serde(default = "default_output")]
    pub output: String,

    /// Log file path, required when output is "file"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,

    /// Enable colored output (text format, terminal outputs only)
    #[serde(default = "default_true")]
    pub color: bool,

    /// Module-specific log levels
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

fn default_output() -> String {
    "stderr".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: default_format(),
            output: default_output(),
            file: None,
            color: true,
            modules: HashMap::new(),
        }
    }
}

const LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

impl LoggingConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !LEVELS.contains(&self.level.as_str()) {
            return Err(format!("Invalid log level: {}", self.level));
        }
        if self.format != "json" && self.format != "text" {
            return Err(format!(
                "Invalid log format: {} (must be 'json' or 'text')",
                self.format
            ));
        }
        let output = parse_output(&self.output)?;
        if output == Output::File && self.file.is_none() {
            return Err("Log output 'file' requires logging.file".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Output {
    Stdout,
    Stderr,
    File,
}

fn parse_output(output: &str) -> Result<Output, String> {
    match output {
        "stdout" => Ok(Output::Stdout),
        "stderr" => Ok(Output::Stderr),
        "file" => Ok(Output::File),
        other => Err(format!(
            "Invalid log output: {} (must be 'stdout', 'stderr' or 'file')",
            other
        )),
    }
}

/// Initialize the global subscriber.
///
/// Priority order (highest to lowest):
/// 1. CLI arguments (already folded into `config` by the binary)
/// 2. Environment variables (PERSONA_SIM_LOG, PERSONA_SIM_LOG_FORMAT, ...)
/// 3. Configuration file
/// 4. Defaults
pub fn init_logging(config: Option<&LoggingConfig>) -> Result<(), ApiError> {
    let defaults = LoggingConfig::default();
    let config = config.unwrap_or(&defaults);
    if !config.enabled {
        return Ok(());
    }

    let filter = build_env_filter(config)?;
    let format = determine_format(config)?;
    let output = determine_output(config)?;

    let (writer, ansi) = match output {
        Output::Stdout => (BoxMakeWriter::new(std::io::stdout), config.color),
        Output::Stderr => (BoxMakeWriter::new(std::io::stderr), config.color),
        Output::File => {
            let path = config.file.clone().ok_or_else(|| {
                ApiError::ConfigError("Log output 'file' requires a log file path".to_string())
            })?;
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| {
                    ApiError::ConfigError(format!("Failed to create log directory: {}", e))
                })?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|e| {
                    ApiError::ConfigError(format!("Failed to open log file {:?}: {}", path, e))
                })?;
            (BoxMakeWriter::new(std::sync::Mutex::new(file)), false)
        }
    };

    let registry = Registry::default().with(filter);
    let result = if format == "json" {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(writer),
            )
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(ansi)
                    .with_writer(writer),
            )
            .try_init()
    };

    result.map_err(|e| ApiError::ConfigError(format!("Failed to initialize logging: {}", e)))
}

/// Build environment filter from config or environment variables
fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter, ApiError> {
    if let Ok(filter) = EnvFilter::try_from_env(ENV_LOG) {
        return Ok(filter);
    }

    if config.level == "off" {
        return Ok(EnvFilter::new("off"));
    }

    let mut filter = EnvFilter::new(&config.level);
    for (module, module_level) in &config.modules {
        filter = filter.add_directive(parse_directive(module, module_level)?);
    }

    if let Ok(modules_str) = std::env::var(ENV_LOG_MODULES) {
        for module_spec in modules_str.split(',') {
            if let Some((module, level)) = module_spec.split_once('=') {
                filter = filter.add_directive(parse_directive(module.trim(), level.trim())?);
            }
        }
    }

    Ok(filter)
}

fn parse_directive(
    module: &str,
    level: &str,
) -> Result<tracing_subscriber::filter::Directive, ApiError> {
    format!("{}={}", module, level)
        .parse()
        .map_err(|e| ApiError::ConfigError(format!("Invalid log directive: {}", e)))
}

fn determine_format(config: &LoggingConfig) -> Result<String, ApiError> {
    if let Ok(format) = std::env::var(ENV_LOG_FORMAT) {
        if format == "json" || format == "text" {
            return Ok(format);
        }
    }

    if config.format != "json" && config.format != "text" {
        return Err(ApiError::ConfigError(format!(
            "Invalid log format: {} (must be 'json' or 'text')",
            config.format
        )));
    }
    Ok(config.format.clone())
}

fn determine_output(config: &LoggingConfig) -> Result<Output, ApiError> {
    let output = std::env::var(ENV_LOG_OUTPUT).unwrap_or_else(|_| config.output.clone());
    parse_output(&output).map_err(ApiError::ConfigError)
}
