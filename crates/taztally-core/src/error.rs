//! Error types for TazTally

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TazTallyError {
    // Zone layer errors
    #[error("Duplicate zone id {taz_id} in zone layer")]
    DuplicateZoneId { taz_id: i64 },

    #[error("Zone id field '{field}' missing or non-integer on feature {feature_id}")]
    ZoneIdField { field: String, feature_id: String },

    // Spatial errors
    #[error("CRS mismatch: feature layer has {layer_crs}, zone layer expects {zone_crs}")]
    CrsMismatch { layer_crs: String, zone_crs: String },

    #[error("Invalid geometry at feature {feature_id}: {reason}")]
    InvalidGeometry { feature_id: String, reason: String },

    #[error("Projection from {from} to {to} failed: {reason}")]
    ProjectionFailed {
        from: String,
        to: String,
        reason: String,
    },

    // Tabulation errors
    #[error("Tabulation row references zone id {taz_id} absent from the zone register")]
    ZoneNotFound { taz_id: i64 },

    // Format errors
    #[error("{format} error: {message}")]
    FormatError { format: String, message: String },

    #[error("Invalid path {path}: {reason}")]
    InvalidPath { path: PathBuf, reason: String },

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TazTallyError>;
