//! Command-line interface.

pub mod commands;
pub mod context;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::progress::ProgressArgs;
use commands::serve::ServeArgs;

/// Top-level arguments.
#[derive(Parser, Debug)]
#[command(name = "dayloop")]
#[command(about = "Dayloop - daily habit progress and streak engine", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    /// Command to run.
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Read configuration from this file instead of .dayloop/
    #[arg(short, long, global = true, env = "DAYLOOP_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP API (and the daily reset scheduler when enabled)
    Serve(ServeArgs),

    /// Inspect or change one user's progress
    Progress(ProgressArgs),

    /// Clear every user's checklist for the day, keeping streaks
    Sweep,
}

/// Print `err` in the selected output mode and exit with status 1.
pub fn handle_error(err: &anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let body = serde_json::json!({ "error": format!("{err:#}") });
        eprintln!("{body}");
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1)
}
