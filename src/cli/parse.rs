//! CLI parse: clap types for persona-sim. No behavior; definitions only.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// persona-sim - persona-tailored marketing copy generation
#[derive(Parser)]
#[command(name = "persona-sim")]
#[command(about = "Generate persona- and tone-differentiated marketing copy")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (replaces global and working-directory files)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, short, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long, global = true)]
    pub log_output: Option<String>,

    /// Log file path (used when output is "file")
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a generation round for a session file
    Generate {
        /// Session JSON file: { personas, base }
        #[arg(long)]
        session: PathBuf,
        /// Use the local generator only (no endpoint calls)
        #[arg(long)]
        local: bool,
        /// Generation endpoint URL (overrides endpoint.url)
        #[arg(long)]
        endpoint: Option<String>,
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
        /// Write an export document into this directory
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Print the built-in sample session as JSON
    Sample,
    /// Serve the generation endpoint
    Serve {
        /// Bind address (overrides proxy.bind)
        #[arg(long)]
        bind: Option<String>,
    },
    /// Print the effective configuration as TOML (secrets masked)
    Config,
}
