//! `persona-sim` binary: parses flags, sets up tracing, and hands the
//! command to the route table.

use clap::Parser;
use persona_sim::cli::{map_error, Cli, RunContext};
use persona_sim::config::ConfigLoader;
use persona_sim::error::ApiError;
use persona_sim::logging::{init_logging, LoggingConfig};
use std::process::ExitCode;
use tracing::{error, info};

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(Some(&logging_for(&cli))) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }
    info!(version = env!("CARGO_PKG_VERSION"), "persona-sim starting");

    let outcome = RunContext::new(cli.config.clone()).and_then(|ctx| ctx.execute(&cli.command));
    match outcome {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => report(e),
    }
}

fn report(e: ApiError) -> ExitCode {
    error!(error = %e, "persona-sim failed");
    eprintln!("{}", map_error(&e));
    ExitCode::FAILURE
}

/// Logging section of the effective config, with command-line flags on top.
fn logging_for(cli: &Cli) -> LoggingConfig {
    let mut logging = configured_logging(cli);
    apply_flags(&mut logging, cli);
    logging
}

/// The `[logging]` table from the same layers `RunContext` will load. A
/// config that fails to load falls back to defaults here; the command itself
/// reports the error.
fn configured_logging(cli: &Cli) -> LoggingConfig {
    let loaded = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path),
        None => std::env::current_dir()
            .map_err(ApiError::from)
            .and_then(|dir| ConfigLoader::load(&dir)),
    };
    loaded.map(|config| config.logging).unwrap_or_default()
}

fn apply_flags(logging: &mut LoggingConfig, cli: &Cli) {
    logging.enabled &= !cli.quiet;
    if cli.verbose {
        logging.level = "debug".into();
    }
    if let Some(level) = &cli.log_level {
        logging.level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        logging.format = format.clone();
    }
    // --log-file alone means "write there"; an explicit --log-output still wins.
    if let Some(file) = &cli.log_file {
        logging.file = Some(file.clone());
        logging.output = "file".into();
    }
    if let Some(output) = &cli.log_output {
        logging.output = output.clone();
    }
}
