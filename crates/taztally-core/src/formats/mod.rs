//! Format abstraction layer for vector layer input
//!
//! Each supported format implements the `LayerReader` trait; the
//! `FormatRegistry` dispatches on file extension. Readers return a raw
//! `VectorDataset`, which is then shaped into a zone layer or destination
//! layer depending on its role in the run.

use std::collections::HashMap;
use std::path::Path;

use geo::MultiPolygon;

use crate::error::{Result, TazTallyError};
use crate::models::{Crs, Destination, DestinationLayer, Zone, ZoneId, ZoneLayer};

pub mod csv;
pub mod geojson;
pub mod shapefile;

pub use self::csv::{CsvColumns, CsvPointReader};
pub use self::geojson::GeoJsonReader;
pub use self::shapefile::ShapefileReader;

/// Feature as read from a format, before model conversion
#[derive(Debug, Clone)]
pub struct RawFeature {
    /// Feature identifier
    pub id: String,

    /// Geometry, if the record carries one
    pub geometry: Option<geo::Geometry>,

    /// Attribute values keyed by field name
    pub properties: HashMap<String, serde_json::Value>,
}

/// Layer-level result of a format read
#[derive(Debug, Clone)]
pub struct VectorDataset {
    /// Dataset name, usually the file stem
    pub name: String,

    /// CRS EPSG code declared by (or defaulted for) the source
    pub crs: u32,

    pub features: Vec<RawFeature>,
}

/// Format reader trait that all format implementations must implement
pub trait LayerReader {
    /// Read a dataset from the given path
    fn read(&self, path: &Path) -> Result<VectorDataset>;

    /// Supported file extensions (e.g., ["shp"])
    fn supported_extensions(&self) -> &[&str];

    /// Human-readable format name (e.g., "Shapefile")
    fn format_name(&self) -> &str;
}

/// Central registry for format readers
pub struct FormatRegistry {
    readers: Vec<Box<dyn LayerReader>>,
}

impl FormatRegistry {
    /// Create a new empty format registry
    pub fn new() -> Self {
        Self { readers: Vec::new() }
    }

    /// Registry with the standard readers: Shapefile, GeoJSON, lon/lat CSV
    pub fn with_defaults(csv_columns: CsvColumns) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(ShapefileReader));
        registry.register(Box::new(GeoJsonReader));
        registry.register(Box::new(CsvPointReader::new(csv_columns)));
        registry
    }

    /// Register a format reader
    pub fn register(&mut self, reader: Box<dyn LayerReader>) {
        self.readers.push(reader);
    }

    /// Detect format by file extension and return the matching reader
    pub fn detect_format(&self, path: &Path) -> Result<&dyn LayerReader> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .ok_or_else(|| TazTallyError::InvalidPath {
                path: path.to_path_buf(),
                reason: "No file extension to detect the format from".to_string(),
            })?;

        self.readers
            .iter()
            .find(|reader| reader.supported_extensions().contains(&extension.as_str()))
            .map(|reader| reader.as_ref())
            .ok_or_else(|| TazTallyError::InvalidPath {
                path: path.to_path_buf(),
                reason: format!("Unsupported format: .{}", extension),
            })
    }

    /// Detect the format and read the dataset
    pub fn read(&self, path: &Path) -> Result<VectorDataset> {
        self.detect_format(path)?.read(path)
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults(CsvColumns::default())
    }
}

/// Build a zone layer from a dataset using the configured id and region
/// field names.
///
/// Every record must carry a polygon geometry and an integer value in the
/// id field; duplicate ids are rejected.
pub fn into_zone_layer(
    dataset: VectorDataset,
    id_field: &str,
    region_field: &str,
) -> Result<ZoneLayer> {
    let crs = Crs::new(dataset.crs);
    let mut zones = Vec::with_capacity(dataset.features.len());

    for feature in dataset.features {
        let taz_id = feature
            .properties
            .get(id_field)
            .and_then(json_to_zone_id)
            .ok_or_else(|| TazTallyError::ZoneIdField {
                field: id_field.to_string(),
                feature_id: feature.id.clone(),
            })?;

        let region = feature.properties.get(region_field).and_then(json_to_attribute);

        let geometry = match feature.geometry {
            Some(geo::Geometry::Polygon(poly)) => MultiPolygon::new(vec![poly]),
            Some(geo::Geometry::MultiPolygon(mp)) => mp,
            Some(other) => {
                return Err(TazTallyError::InvalidGeometry {
                    feature_id: feature.id,
                    reason: format!("Expected polygon geometry, found {}", geometry_kind(&other)),
                })
            }
            None => {
                return Err(TazTallyError::InvalidGeometry {
                    feature_id: feature.id,
                    reason: "Zone record has no geometry".to_string(),
                })
            }
        };

        zones.push(Zone { taz_id, region, geometry });
    }

    ZoneLayer::new(crs, zones)
}

/// Build a destination layer from a dataset.
///
/// Records without geometry are an error: a destination that cannot be
/// located cannot participate in the intersection.
pub fn into_destination_layer(dataset: VectorDataset) -> Result<DestinationLayer> {
    let crs = Crs::new(dataset.crs);
    let mut features = Vec::with_capacity(dataset.features.len());

    for feature in dataset.features {
        let geometry = feature.geometry.ok_or_else(|| TazTallyError::InvalidGeometry {
            feature_id: feature.id.clone(),
            reason: "Destination record has no geometry".to_string(),
        })?;
        features.push(Destination { id: feature.id, geometry });
    }

    Ok(DestinationLayer { name: dataset.name, crs, features })
}

/// Zone ids arrive as dBase numerics (f64), JSON numbers, or strings
fn json_to_zone_id(value: &serde_json::Value) -> Option<ZoneId> {
    match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Region attributes are compared as strings; numeric flags like 1.0 are
/// rendered without the fraction so they match a `--region 1` filter
fn json_to_attribute(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.trim().to_string()),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(f) = n.as_f64() {
                if f.fract() == 0.0 {
                    Some((f as i64).to_string())
                } else {
                    Some(f.to_string())
                }
            } else {
                None
            }
        }
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn geometry_kind(geometry: &geo::Geometry) -> &'static str {
    match geometry {
        geo::Geometry::Point(_) => "Point",
        geo::Geometry::Line(_) => "Line",
        geo::Geometry::LineString(_) => "LineString",
        geo::Geometry::Polygon(_) => "Polygon",
        geo::Geometry::MultiPoint(_) => "MultiPoint",
        geo::Geometry::MultiLineString(_) => "MultiLineString",
        geo::Geometry::MultiPolygon(_) => "MultiPolygon",
        geo::Geometry::GeometryCollection(_) => "GeometryCollection",
        geo::Geometry::Rect(_) => "Rect",
        geo::Geometry::Triangle(_) => "Triangle",
    }
}
