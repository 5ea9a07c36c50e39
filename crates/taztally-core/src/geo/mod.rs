//! Spatial operations: CRS transforms, validation, indexing, intersection

pub mod index;
pub mod spatial;
pub mod transform;
pub mod validation;

// Re-export key types for convenience
pub use index::{IndexedZone, ZoneIndex};
pub use spatial::{zone_matches, ZoneMatch};
pub use transform::{check_crs_match, crs_match, normalize_layer, reproject_geometry};
pub use validation::{validate_geometry, ValidationError, ValidationResult};
