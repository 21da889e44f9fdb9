//! CLI domain: parse, route, help, output, and presentation only.
//! Generation, serving and export live in their own modules; the route table
//! only wires them to commands.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::command_name;
pub use output::map_error;
pub use parse::{Cli, Commands, OutputFormat};
pub use presentation::{format_round_json, format_round_text};
pub use route::RunContext;
