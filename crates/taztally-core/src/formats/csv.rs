//! Lon/lat CSV reader
//!
//! Healthcare facility exports arrive as plain CSV with raw longitude and
//! latitude columns. Rows become WGS 84 point features; reprojection to the
//! zone CRS happens downstream and is enforced by the CRS-mismatch check,
//! because intersecting raw lon/lat against projected zones returns nothing
//! without erroring.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TazTallyError};
use crate::formats::{LayerReader, RawFeature, VectorDataset};

/// Column names for lon/lat CSV input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvColumns {
    /// Longitude column name
    pub lon: String,

    /// Latitude column name
    pub lat: String,

    /// Optional id column; the row index is used when absent
    pub id: Option<String>,
}

impl Default for CsvColumns {
    fn default() -> Self {
        Self {
            lon: "longitude".to_string(),
            lat: "latitude".to_string(),
            id: None,
        }
    }
}

/// CSV point-layer reader
pub struct CsvPointReader {
    columns: CsvColumns,
}

impl CsvPointReader {
    pub fn new(columns: CsvColumns) -> Self {
        Self { columns }
    }
}

impl LayerReader for CsvPointReader {
    fn read(&self, path: &Path) -> Result<VectorDataset> {
        let mut reader = csv::Reader::from_path(path).map_err(csv_error)?;

        let headers = reader.headers().map_err(csv_error)?.clone();
        let lon_idx = column_index(&headers, &self.columns.lon)?;
        let lat_idx = column_index(&headers, &self.columns.lat)?;
        let id_idx = match &self.columns.id {
            Some(name) => Some(column_index(&headers, name)?),
            None => None,
        };

        let mut features = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let record = record.map_err(csv_error)?;

            let lon = parse_coordinate(&record, lon_idx, &self.columns.lon, row)?;
            let lat = parse_coordinate(&record, lat_idx, &self.columns.lat, row)?;

            let id = id_idx
                .and_then(|idx| record.get(idx))
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| row.to_string());

            let properties: HashMap<String, serde_json::Value> = headers
                .iter()
                .zip(record.iter())
                .map(|(name, value)| {
                    (name.to_string(), serde_json::Value::String(value.to_string()))
                })
                .collect();

            features.push(RawFeature {
                id,
                geometry: Some(geo::Geometry::Point(geo::Point::new(lon, lat))),
                properties,
            });
        }

        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unnamed")
            .to_string();

        // Raw coordinate input is geographic lon/lat by definition
        Ok(VectorDataset { name, crs: 4326, features })
    }

    fn supported_extensions(&self) -> &[&str] {
        &["csv"]
    }

    fn format_name(&self) -> &str {
        "CSV"
    }
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|header| header.eq_ignore_ascii_case(name))
        .ok_or_else(|| TazTallyError::FormatError {
            format: "CSV".to_string(),
            message: format!("Missing column '{}'", name),
        })
}

fn parse_coordinate(
    record: &csv::StringRecord,
    idx: usize,
    column: &str,
    row: usize,
) -> Result<f64> {
    let raw = record.get(idx).unwrap_or("").trim();
    raw.parse::<f64>().map_err(|_| TazTallyError::FormatError {
        format: "CSV".to_string(),
        message: format!("Row {}: column '{}' value '{}' is not a coordinate", row + 1, column, raw),
    })
}

fn csv_error(e: csv::Error) -> TazTallyError {
    TazTallyError::FormatError {
        format: "CSV".to_string(),
        message: e.to_string(),
    }
}
