use std::path::Path;

use anyhow::Result;
use taztally_core::aggregate::presence_by_zone;
use taztally_core::export::write_table;

use crate::cli::TabulateArgs;
use crate::commands::common;
use crate::output::OutputWriter;

pub fn execute(args: TabulateArgs, output: &OutputWriter, config: Option<&Path>) -> Result<()> {
    let run = common::prepare(&args.layer, config)?;
    if run.features.features.is_empty() {
        output.warning("Destination layer is empty; every zone tabulates to zero");
    }

    let mut tabulation = presence_by_zone(&run.register, &run.zones, &run.features, run.policy)?;
    if let Some(column) = &args.column {
        tabulation.set_column(column);
    }

    write_table(&tabulation, &args.out)?;

    let present: u64 = tabulation.rows().iter().map(|row| row.value).sum();
    output.success(format!(
        "Wrote {} zone rows ({} with a destination) to {}",
        tabulation.len(),
        present,
        args.out.display()
    ));
    Ok(())
}
