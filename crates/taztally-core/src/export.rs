//! Flat-table export
//!
//! One tabulation becomes one two-column delimited file: `taz_id` and the
//! tabulation's value column. Rows follow the register order, so repeated
//! runs over identical inputs produce byte-identical files.

use std::path::Path;

use crate::error::{Result, TazTallyError};
use crate::models::ZoneTabulation;

/// Write a tabulation as a delimited flat file
pub fn write_table(tabulation: &ZoneTabulation, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;

    writer
        .write_record(["taz_id", tabulation.column()])
        .map_err(csv_error)?;

    for row in tabulation.rows() {
        writer
            .write_record([row.taz_id.to_string(), row.value.to_string()])
            .map_err(csv_error)?;
    }

    writer.flush()?;
    Ok(())
}

fn csv_error(e: csv::Error) -> TazTallyError {
    TazTallyError::FormatError {
        format: "CSV".to_string(),
        message: e.to_string(),
    }
}
