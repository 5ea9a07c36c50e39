//! Shapefile reader
//!
//! Shapefiles consist of multiple component files (.shp, .shx, .dbf, .prj)
//! and the required ones must all be present. The CRS comes from the .prj
//! WKT; without one the layer is assumed WGS 84, which the log flags because
//! a wrong assumption here surfaces only as an empty tabulation later.

use std::collections::HashMap;
use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use shapefile::dbase::FieldValue as DbaseFieldValue;
use shapefile::{PolygonRing, Reader, Shape};

use crate::error::{Result, TazTallyError};
use crate::formats::{LayerReader, RawFeature, VectorDataset};

/// Shapefile format reader
pub struct ShapefileReader;

impl LayerReader for ShapefileReader {
    fn read(&self, path: &Path) -> Result<VectorDataset> {
        self.verify_components(path)?;

        let mut reader = Reader::from_path(path).map_err(|e| TazTallyError::FormatError {
            format: "Shapefile".to_string(),
            message: format!("Failed to open Shapefile: {}", e),
        })?;

        let crs = self.extract_crs(path)?;
        let features = self.read_features(&mut reader)?;

        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unnamed")
            .to_string();

        Ok(VectorDataset { name, crs, features })
    }

    fn supported_extensions(&self) -> &[&str] {
        &["shp"]
    }

    fn format_name(&self) -> &str {
        "Shapefile"
    }
}

impl ShapefileReader {
    /// Base path of the component set (no extension)
    fn shapefile_base(&self, path: &Path) -> Result<PathBuf> {
        let is_shp = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("shp"))
            .unwrap_or(false);

        if !is_shp {
            return Err(TazTallyError::InvalidPath {
                path: path.to_path_buf(),
                reason: "Not a Shapefile (.shp)".to_string(),
            });
        }

        Ok(path.with_extension(""))
    }

    /// Verify that all required component files exist
    fn verify_components(&self, path: &Path) -> Result<()> {
        let base = self.shapefile_base(path)?;
        let mut missing = Vec::new();

        for ext in ["shp", "shx", "dbf"] {
            if !base.with_extension(ext).exists() {
                missing.push(format!(".{}", ext));
            }
        }

        if !missing.is_empty() {
            return Err(TazTallyError::FormatError {
                format: "Shapefile".to_string(),
                message: format!("Missing required component files: {}", missing.join(", ")),
            });
        }

        Ok(())
    }

    /// Extract the EPSG code from the .prj file, defaulting to 4326
    fn extract_crs(&self, path: &Path) -> Result<u32> {
        let base = self.shapefile_base(path)?;
        let prj_path = base.with_extension("prj");

        if !prj_path.exists() {
            tracing::warn!(
                path = %path.display(),
                "No .prj file; assuming EPSG:4326"
            );
            return Ok(4326);
        }

        let prj_content =
            fs::read_to_string(&prj_path).map_err(|e| TazTallyError::FormatError {
                format: "Shapefile".to_string(),
                message: format!("Failed to read .prj file: {}", e),
            })?;

        if let Some(epsg) = parse_epsg_from_wkt(&prj_content) {
            return Ok(epsg);
        }

        // The WKT parsed but carried no recognizable authority code
        if wkt::Wkt::<f64>::from_str(&prj_content).is_ok() {
            tracing::warn!(
                path = %prj_path.display(),
                "No EPSG authority in .prj WKT; assuming EPSG:4326"
            );
        } else {
            tracing::warn!(
                path = %prj_path.display(),
                "Unparseable .prj content; assuming EPSG:4326"
            );
        }

        Ok(4326)
    }

    /// Read all shapes and attribute records
    fn read_features(
        &self,
        reader: &mut Reader<BufReader<fs::File>, BufReader<fs::File>>,
    ) -> Result<Vec<RawFeature>> {
        let mut features = Vec::new();

        for result in reader.iter_shapes_and_records() {
            let (shape, record) = result.map_err(|e| TazTallyError::FormatError {
                format: "Shapefile".to_string(),
                message: format!("Failed to read feature: {}", e),
            })?;

            let geometry = convert_shape(&shape)?;

            let mut properties = HashMap::new();
            for (name, value) in record.clone() {
                properties.insert(name, convert_dbase_value(&value));
            }

            let id = features.len().to_string();
            features.push(RawFeature { id, geometry, properties });
        }

        Ok(features)
    }
}

/// Scan a .prj WKT string for an EPSG code
fn parse_epsg_from_wkt(wkt: &str) -> Option<u32> {
    // AUTHORITY["EPSG","4326"]: take the last occurrence, which names the
    // whole CRS rather than a nested datum or axis authority.
    if let Some(start) = wkt.rfind("AUTHORITY[\"EPSG\",\"") {
        let code_start = start + "AUTHORITY[\"EPSG\",\"".len();
        let digits: String = wkt[code_start..]
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        if let Ok(code) = digits.parse::<u32>() {
            return Some(code);
        }
    }

    // EPSG:32615 style content
    if let Some(start) = wkt.find("EPSG:") {
        let code_start = start + "EPSG:".len();
        let digits: String = wkt[code_start..]
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        if let Ok(code) = digits.parse::<u32>() {
            return Some(code);
        }
    }

    None
}

/// Convert a shapefile shape to a geo geometry; NullShape converts to None
fn convert_shape(shape: &Shape) -> Result<Option<geo::Geometry>> {
    let geometry = match shape {
        Shape::NullShape => return Ok(None),
        Shape::Point(p) => geo::Geometry::Point(geo::Point::new(p.x, p.y)),
        Shape::PointZ(p) => geo::Geometry::Point(geo::Point::new(p.x, p.y)),
        Shape::PointM(p) => geo::Geometry::Point(geo::Point::new(p.x, p.y)),
        Shape::Polyline(pl) => polyline_geometry(pl.parts().iter().map(|part| {
            part.iter().map(|p| geo::Coord { x: p.x, y: p.y }).collect()
        })),
        Shape::PolylineZ(pl) => polyline_geometry(pl.parts().iter().map(|part| {
            part.iter().map(|p| geo::Coord { x: p.x, y: p.y }).collect()
        })),
        Shape::PolylineM(pl) => polyline_geometry(pl.parts().iter().map(|part| {
            part.iter().map(|p| geo::Coord { x: p.x, y: p.y }).collect()
        })),
        Shape::Polygon(polygon) => rings_to_multipolygon(polygon.rings().iter().map(|ring| {
            let coords = ring
                .points()
                .iter()
                .map(|p| geo::Coord { x: p.x, y: p.y })
                .collect::<Vec<_>>();
            (matches!(ring, PolygonRing::Outer(_)), coords)
        })),
        Shape::PolygonZ(polygon) => rings_to_multipolygon(polygon.rings().iter().map(|ring| {
            let coords = ring
                .points()
                .iter()
                .map(|p| geo::Coord { x: p.x, y: p.y })
                .collect::<Vec<_>>();
            (matches!(ring, PolygonRing::Outer(_)), coords)
        })),
        Shape::PolygonM(polygon) => rings_to_multipolygon(polygon.rings().iter().map(|ring| {
            let coords = ring
                .points()
                .iter()
                .map(|p| geo::Coord { x: p.x, y: p.y })
                .collect::<Vec<_>>();
            (matches!(ring, PolygonRing::Outer(_)), coords)
        })),
        Shape::Multipoint(mp) => geo::Geometry::MultiPoint(geo::MultiPoint::new(
            mp.points().iter().map(|p| geo::Point::new(p.x, p.y)).collect(),
        )),
        Shape::MultipointZ(mp) => geo::Geometry::MultiPoint(geo::MultiPoint::new(
            mp.points().iter().map(|p| geo::Point::new(p.x, p.y)).collect(),
        )),
        Shape::MultipointM(mp) => geo::Geometry::MultiPoint(geo::MultiPoint::new(
            mp.points().iter().map(|p| geo::Point::new(p.x, p.y)).collect(),
        )),
        Shape::Multipatch(_) => {
            return Err(TazTallyError::FormatError {
                format: "Shapefile".to_string(),
                message: "Multipatch geometry type is not supported".to_string(),
            })
        }
    };

    Ok(Some(geometry))
}

fn polyline_geometry(parts: impl Iterator<Item = Vec<geo::Coord>>) -> geo::Geometry {
    let mut lines: Vec<geo::LineString> = parts.map(geo::LineString::new).collect();
    if lines.len() == 1 {
        geo::Geometry::LineString(lines.remove(0))
    } else {
        geo::Geometry::MultiLineString(geo::MultiLineString::new(lines))
    }
}

/// Assemble polygons from a ring sequence. Per the shapefile spec inner
/// rings follow the outer ring they belong to.
fn rings_to_multipolygon(rings: impl Iterator<Item = (bool, Vec<geo::Coord>)>) -> geo::Geometry {
    let mut polygons: Vec<(geo::LineString, Vec<geo::LineString>)> = Vec::new();

    for (is_outer, coords) in rings {
        let ring = geo::LineString::new(coords);
        if is_outer || polygons.is_empty() {
            polygons.push((ring, Vec::new()));
        } else if let Some(last) = polygons.last_mut() {
            last.1.push(ring);
        }
    }

    geo::Geometry::MultiPolygon(geo::MultiPolygon::new(
        polygons
            .into_iter()
            .map(|(exterior, interiors)| geo::Polygon::new(exterior, interiors))
            .collect(),
    ))
}

/// Convert a dBase field value to a JSON value
fn convert_dbase_value(value: &DbaseFieldValue) -> serde_json::Value {
    let number = |f: f64| {
        serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    };

    match value {
        DbaseFieldValue::Character(Some(s)) => serde_json::Value::String(s.clone()),
        DbaseFieldValue::Memo(s) => serde_json::Value::String(s.clone()),
        DbaseFieldValue::Numeric(Some(n)) => number(*n),
        DbaseFieldValue::Float(Some(f)) => number(*f as f64),
        DbaseFieldValue::Double(d) => number(*d),
        DbaseFieldValue::Currency(c) => number(*c),
        DbaseFieldValue::Integer(i) => serde_json::Value::Number((*i).into()),
        DbaseFieldValue::Logical(Some(b)) => serde_json::Value::Bool(*b),
        DbaseFieldValue::Date(Some(date)) => serde_json::Value::String(format!(
            "{:04}-{:02}-{:02}",
            date.year(),
            date.month(),
            date.day()
        )),
        DbaseFieldValue::DateTime(dt) => serde_json::Value::String(format!(
            "{:04}-{:02}-{:02}",
            dt.date().year(),
            dt.date().month(),
            dt.date().day()
        )),
        DbaseFieldValue::Character(None)
        | DbaseFieldValue::Numeric(None)
        | DbaseFieldValue::Float(None)
        | DbaseFieldValue::Logical(None)
        | DbaseFieldValue::Date(None) => serde_json::Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_extensions() {
        let reader = ShapefileReader;
        assert_eq!(reader.supported_extensions(), &["shp"]);
        assert_eq!(reader.format_name(), "Shapefile");
    }

    #[test]
    fn test_parse_epsg_from_wkt() {
        let wkt1 = r#"GEOGCS["WGS 84",AUTHORITY["EPSG","4326"]]"#;
        assert_eq!(parse_epsg_from_wkt(wkt1), Some(4326));

        // The outermost authority wins over nested datum authorities
        let wkt2 = r#"PROJCS["NAD83 / UTM 15N",GEOGCS["NAD83",AUTHORITY["EPSG","4269"]],AUTHORITY["EPSG","26915"]]"#;
        assert_eq!(parse_epsg_from_wkt(wkt2), Some(26915));

        assert_eq!(parse_epsg_from_wkt("EPSG:32615"), Some(32615));
        assert_eq!(parse_epsg_from_wkt("no authority here"), None);
    }

    #[test]
    fn test_missing_components_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let shp = dir.path().join("zones.shp");
        std::fs::write(&shp, b"").unwrap();

        let err = ShapefileReader.read(&shp).unwrap_err();
        let message = err.to_string();
        assert!(message.contains(".shx"));
        assert!(message.contains(".dbf"));
    }

    #[test]
    fn test_non_shp_path_rejected() {
        let err = ShapefileReader.read(Path::new("zones.gpkg")).unwrap_err();
        assert!(matches!(err, TazTallyError::InvalidPath { .. }));
    }

    #[test]
    fn test_rings_to_multipolygon_groups_holes() {
        let square = |x0: f64, size: f64| {
            vec![
                geo::Coord { x: x0, y: 0.0 },
                geo::Coord { x: x0 + size, y: 0.0 },
                geo::Coord { x: x0 + size, y: size },
                geo::Coord { x: x0, y: size },
                geo::Coord { x: x0, y: 0.0 },
            ]
        };

        let rings = vec![
            (true, square(0.0, 10.0)),
            (false, square(4.0, 2.0)),
            (true, square(20.0, 10.0)),
        ];
        let geometry = rings_to_multipolygon(rings.into_iter());
        let geo::Geometry::MultiPolygon(mp) = geometry else {
            panic!("expected a multipolygon");
        };
        assert_eq!(mp.0.len(), 2);
        assert_eq!(mp.0[0].interiors().len(), 1);
        assert_eq!(mp.0[1].interiors().len(), 0);
    }
}
