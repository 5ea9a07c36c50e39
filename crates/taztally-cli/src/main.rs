//! TazTally CLI - Command-line interface
//!
//! Orchestrates a tabulation run: load zones, load a destination layer,
//! normalize its CRS, tabulate against the zone register, export.

mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use cli::Cli;

fn main() -> Result<()> {
    // Initialize tracing. Logs go to stderr so stdout stays clean for
    // --json output.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    commands::execute(cli)
}
