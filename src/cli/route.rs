//! CLI route: single route table and run context. Dispatches to domain services and presentation.

use crate::cli::help::command_name;
use crate::cli::parse::{Commands, OutputFormat};
use crate::cli::presentation::{format_round_json, format_round_text};
use crate::config::{validation_failure, AppConfig, ConfigLoader};
use crate::error::ApiError;
use crate::export::write_export;
use crate::generation::{
    run_local, CancellationFlag, FanOutOrchestrator, GenerationRound, HttpGenerationClient,
    RetryPolicy, RoundEvent, VariantSource,
};
use crate::proxy::{self, ProxyState};
use crate::session::Session;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Runtime context for CLI execution: the effective configuration.
pub struct RunContext {
    config: AppConfig,
}

impl RunContext {
    /// Load configuration from `config_path` if given, otherwise by discovery
    /// from the current directory, and validate it.
    pub fn new(config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = match config_path {
            Some(ref path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&std::env::current_dir()?)?,
        };
        Self::from_config(config)
    }

    pub fn from_config(config: AppConfig) -> Result<Self, ApiError> {
        config
            .validate()
            .map_err(|errors| validation_failure(&errors))?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        let started = Instant::now();
        let name = command_name(command);
        info!(command = name, "Command started");

        let result = match command {
            Commands::Generate {
                session,
                local,
                endpoint,
                format,
                export,
            } => self.handle_generate(
                session,
                *local,
                endpoint.as_deref(),
                *format,
                export.as_deref(),
            ),
            Commands::Sample => {
                let file = Session::sample().to_file();
                Ok(serde_json::to_string_pretty(&file)?)
            }
            Commands::Serve { bind } => self.handle_serve(bind.as_deref()),
            Commands::Config => toml::to_string_pretty(&self.config.redacted())
                .map_err(|e| ApiError::ConfigError(format!("Failed to render config: {}", e))),
        };

        info!(
            command = name,
            ok = result.is_ok(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        result
    }

    fn handle_generate(
        &self,
        session_path: &Path,
        local: bool,
        endpoint: Option<&str>,
        format: OutputFormat,
        export_dir: Option<&Path>,
    ) -> Result<String, ApiError> {
        let mut session = Session::load(session_path)?;

        let round = if local {
            run_local(session.personas(), session.base())
        } else {
            let endpoint = endpoint.unwrap_or(&self.config.endpoint.url);
            let rt = tokio::runtime::Runtime::new()
                .map_err(|e| ApiError::ConfigError(format!("Failed to create runtime: {}", e)))?;
            rt.block_on(self.generate_remote(&session, endpoint))?
        };
        session.apply_round(round);

        let round = session
            .round()
            .ok_or_else(|| ApiError::ExportFailed("no generated results".to_string()))?;
        let mut output = match format {
            OutputFormat::Text => format_round_text(&session, round),
            OutputFormat::Json => format_round_json(&session, round)?,
        };

        if let Some(dir) = export_dir {
            let path = write_export(&session, dir)?;
            if format == OutputFormat::Text {
                output.push_str(&format!("\n\nExported to {}", path.display()));
            }
        }
        Ok(output)
    }

    async fn generate_remote(
        &self,
        session: &Session,
        endpoint: &str,
    ) -> Result<GenerationRound, ApiError> {
        let client = HttpGenerationClient::new(endpoint)?;
        let policy = RetryPolicy::from(&self.config.retry);
        info!(
            endpoint,
            personas = session.personas().len(),
            worst_case_ms = round_budget_ms(&policy, session.personas().len()),
            "Starting remote generation"
        );

        let cancellation = CancellationFlag::new();
        let on_interrupt = cancellation.clone();
        let interrupt = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted; remaining personas use local variants");
                on_interrupt.cancel();
            }
        });

        let (tx, mut rx) = mpsc::unbounded_channel();
        let progress = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if let RoundEvent::PersonaCompleted { idx, source, .. } = event {
                    match source {
                        VariantSource::Fallback => warn!(idx, "Persona settled with local fallback"),
                        _ => info!(idx, ?source, "Persona settled"),
                    }
                }
            }
        });

        let orchestrator = FanOutOrchestrator::new(client, policy)
            .with_cancellation(cancellation)
            .with_progress(tx);
        let round = orchestrator
            .run_generation(session.personas(), session.base())
            .await;

        drop(orchestrator);
        interrupt.abort();
        let _ = progress.await;
        Ok(round)
    }

    fn handle_serve(&self, bind: Option<&str>) -> Result<String, ApiError> {
        let mut proxy_config = self.config.proxy.clone();
        if let Some(bind) = bind {
            proxy_config.bind = bind.to_string();
        }
        let state = Arc::new(ProxyState::from_config(&proxy_config)?);

        let rt = tokio::runtime::Runtime::new()
            .map_err(|e| ApiError::ConfigError(format!("Failed to create runtime: {}", e)))?;
        rt.block_on(async {
            let listener = tokio::net::TcpListener::bind(&proxy_config.bind)
                .await
                .map_err(|e| {
                    ApiError::ServerError(format!("Failed to bind {}: {}", proxy_config.bind, e))
                })?;
            proxy::serve(listener, state, async {
                let _ = tokio::signal::ctrl_c().await;
                info!("Shutdown signal received");
            })
            .await
        })?;

        Ok("Generation endpoint stopped".to_string())
    }
}

/// Worst-case round duration in milliseconds, saturating at `u64::MAX`.
fn round_budget_ms(policy: &RetryPolicy, personas: usize) -> u64 {
    let per_persona = u64::try_from(policy.persona_budget().as_millis()).unwrap_or(u64::MAX);
    per_persona.saturating_mul(personas as u64)
}
