//! Command implementations

mod common;
mod count;
mod inspect;
mod presence;

use crate::cli::{Cli, Commands};
use crate::output::OutputWriter;
use anyhow::Result;

/// Execute a CLI command
pub fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Count(args) => count::execute(args, &output, config),
        Commands::Presence(args) => presence::execute(args, &output, config),
        Commands::Inspect(args) => inspect::execute(args, &output, config),
    }
}
