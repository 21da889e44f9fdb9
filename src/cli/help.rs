//! Command-name contract for logging.

use crate::cli::parse::Commands;

/// Command name string used in log records (e.g. "generate", "serve").
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Generate { local: true, .. } => "generate.local",
        Commands::Generate { .. } => "generate",
        Commands::Sample => "sample",
        Commands::Serve { .. } => "serve",
        Commands::Config => "config",
    }
}
