//! Inspection view: the count tabulation joined back to zone attributes

use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use tabled::Tabled;
use taztally_core::aggregate::count_by_zone;

use crate::cli::InspectArgs;
use crate::commands::common;
use crate::output::OutputWriter;

#[derive(Tabled, Serialize)]
struct InspectRow {
    taz_id: i64,
    region: String,
    n: u64,
}

pub fn execute(args: InspectArgs, output: &OutputWriter, config: Option<&Path>) -> Result<()> {
    let run = common::prepare(&args.layer, config)?;

    let tabulation = count_by_zone(&run.register, &run.zones, &run.features, run.policy)?;

    let rows: Vec<InspectRow> = tabulation
        .rows()
        .iter()
        .take(args.limit)
        .map(|row| InspectRow {
            taz_id: row.taz_id,
            region: run
                .zones
                .get(row.taz_id)
                .and_then(|zone| zone.region.clone())
                .unwrap_or_default(),
            n: row.value,
        })
        .collect();

    let shown = rows.len();
    output.table(rows);
    if shown < tabulation.len() {
        output.info(format!(
            "Showing first {} of {} zones (raise --limit to see more)",
            shown,
            tabulation.len()
        ));
    }

    Ok(())
}
