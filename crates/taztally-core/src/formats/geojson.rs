//! GeoJSON reader
//!
//! RFC 7946 dropped the `crs` member, but the zone and destination exports
//! this tool consumes still carry the legacy named-CRS object, so it is
//! honored when present and WGS 84 is assumed otherwise.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{Result, TazTallyError};
use crate::formats::{LayerReader, RawFeature, VectorDataset};

/// GeoJSON format reader
pub struct GeoJsonReader;

impl LayerReader for GeoJsonReader {
    fn read(&self, path: &Path) -> Result<VectorDataset> {
        let content = fs::read_to_string(path).map_err(TazTallyError::Io)?;

        let geojson: geojson::GeoJson =
            content.parse().map_err(|e| TazTallyError::FormatError {
                format: "GeoJSON".to_string(),
                message: format!("Failed to parse GeoJSON: {}", e),
            })?;

        let geojson::GeoJson::FeatureCollection(collection) = geojson else {
            return Err(TazTallyError::FormatError {
                format: "GeoJSON".to_string(),
                message: "Expected a FeatureCollection at the top level".to_string(),
            });
        };

        let crs = collection
            .foreign_members
            .as_ref()
            .and_then(|fm| fm.get("crs"))
            .and_then(extract_epsg_from_crs)
            .unwrap_or(4326);

        let features = collection
            .features
            .iter()
            .enumerate()
            .map(|(idx, feature)| convert_feature(feature, idx))
            .collect::<Result<Vec<_>>>()?;

        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unnamed")
            .to_string();

        Ok(VectorDataset { name, crs, features })
    }

    fn supported_extensions(&self) -> &[&str] {
        &["json", "geojson"]
    }

    fn format_name(&self) -> &str {
        "GeoJSON"
    }
}

/// Convert a GeoJSON feature, using the index as id when none is present
fn convert_feature(feature: &geojson::Feature, idx: usize) -> Result<RawFeature> {
    let id = feature
        .id
        .as_ref()
        .map(|id| match id {
            geojson::feature::Id::String(s) => s.clone(),
            geojson::feature::Id::Number(n) => n.to_string(),
        })
        .unwrap_or_else(|| idx.to_string());

    let geometry = feature
        .geometry
        .as_ref()
        .map(|geom| {
            geo::Geometry::<f64>::try_from(geom).map_err(|e| TazTallyError::InvalidGeometry {
                feature_id: id.clone(),
                reason: format!("Unconvertible GeoJSON geometry: {}", e),
            })
        })
        .transpose()?;

    let properties: HashMap<String, serde_json::Value> = feature
        .properties
        .as_ref()
        .map(|props| props.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        .unwrap_or_default();

    Ok(RawFeature { id, geometry, properties })
}

/// Extract an EPSG code from a legacy named-CRS object
fn extract_epsg_from_crs(crs: &serde_json::Value) -> Option<u32> {
    let name = crs.get("properties")?.get("name")?.as_str()?;

    // OGC CRS84 is axis-flipped WGS 84; coordinates are lon/lat either way
    if name.contains("CRS84") {
        return Some(4326);
    }

    // "EPSG:32615" or "urn:ogc:def:crs:EPSG::32615"
    let start = name.find("EPSG")?;
    let digits: String = name[start..]
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}
