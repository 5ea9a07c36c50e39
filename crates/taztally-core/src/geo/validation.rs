//! Geometry validation ahead of intersection
//!
//! Invalid inputs (non-finite coordinates, open rings, empty collections)
//! abort the run before any spatial predicate sees them.

use geo::{Geometry, LineString, MultiPolygon, Point, Polygon};

use crate::error::{Result, TazTallyError};

/// Validation result with details
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

/// Validation error with location details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub location: String,
    pub reason: String,
}

impl ValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        Self { is_valid: true, errors: Vec::new() }
    }

    /// Add an error to the result
    pub fn add_error(&mut self, location: String, reason: String) {
        self.is_valid = false;
        self.errors.push(ValidationError { location, reason });
    }

    fn merge(&mut self, prefix: &str, other: ValidationResult) {
        for error in other.errors {
            self.add_error(format!("{}.{}", prefix, error.location), error.reason);
        }
    }
}

/// Validate a geometry
pub fn validate_geometry(geometry: &Geometry) -> ValidationResult {
    match geometry {
        Geometry::Point(p) => validate_point(p),
        Geometry::LineString(ls) => validate_linestring(ls),
        Geometry::Polygon(poly) => validate_polygon(poly),
        Geometry::MultiPoint(mp) => {
            let mut result = ValidationResult::valid();
            for (i, point) in mp.0.iter().enumerate() {
                result.merge(&format!("MultiPoint[{}]", i), validate_point(point));
            }
            result
        }
        Geometry::MultiLineString(mls) => {
            let mut result = ValidationResult::valid();
            for (i, ls) in mls.0.iter().enumerate() {
                result.merge(&format!("MultiLineString[{}]", i), validate_linestring(ls));
            }
            result
        }
        Geometry::MultiPolygon(mp) => validate_multipolygon(mp),
        Geometry::GeometryCollection(gc) => {
            let mut result = ValidationResult::valid();
            if gc.0.is_empty() {
                result.add_error(
                    "GeometryCollection".to_string(),
                    "Empty geometry collection".to_string(),
                );
                return result;
            }
            for (i, geom) in gc.0.iter().enumerate() {
                result.merge(&format!("GeometryCollection[{}]", i), validate_geometry(geom));
            }
            result
        }
        Geometry::Line(line) => {
            let mut result = ValidationResult::valid();
            for coord in [line.start, line.end] {
                if !coord.x.is_finite() || !coord.y.is_finite() {
                    result.add_error("Line".to_string(), "Coordinates must be finite".to_string());
                }
            }
            result
        }
        Geometry::Rect(rect) => validate_polygon(&rect.to_polygon()),
        Geometry::Triangle(tri) => validate_polygon(&tri.to_polygon()),
    }
}

/// Validate a zone multipolygon
pub fn validate_multipolygon(multipolygon: &MultiPolygon) -> ValidationResult {
    let mut result = ValidationResult::valid();

    if multipolygon.0.is_empty() {
        result.add_error(
            "MultiPolygon".to_string(),
            "MultiPolygon must contain at least one polygon".to_string(),
        );
        return result;
    }

    for (i, polygon) in multipolygon.0.iter().enumerate() {
        result.merge(&format!("MultiPolygon[{}]", i), validate_polygon(polygon));
    }

    result
}

fn validate_point(point: &Point) -> ValidationResult {
    let mut result = ValidationResult::valid();
    if !point.x().is_finite() || !point.y().is_finite() {
        result.add_error(
            format!("Point({}, {})", point.x(), point.y()),
            "Coordinates must be finite".to_string(),
        );
    }
    result
}

fn validate_linestring(linestring: &LineString) -> ValidationResult {
    let mut result = ValidationResult::valid();

    if linestring.0.len() < 2 {
        result.add_error(
            "LineString".to_string(),
            format!("LineString must have at least 2 points, found {}", linestring.0.len()),
        );
        return result;
    }

    for (i, coord) in linestring.0.iter().enumerate() {
        if !coord.x.is_finite() || !coord.y.is_finite() {
            result
                .add_error(format!("LineString[{}]", i), "Coordinates must be finite".to_string());
        }
    }

    result
}

fn validate_polygon(polygon: &Polygon) -> ValidationResult {
    let mut result = ValidationResult::valid();

    let exterior = polygon.exterior();
    if exterior.0.len() < 4 {
        result.add_error(
            "Polygon exterior".to_string(),
            format!("Polygon exterior must have at least 4 points, found {}", exterior.0.len()),
        );
    }

    if let (Some(first), Some(last)) = (exterior.0.first(), exterior.0.last()) {
        if first != last {
            result.add_error(
                "Polygon exterior".to_string(),
                "Polygon exterior must be closed (first point == last point)".to_string(),
            );
        }
    }

    for coord in exterior.0.iter() {
        if !coord.x.is_finite() || !coord.y.is_finite() {
            result.add_error(
                "Polygon exterior".to_string(),
                "Coordinates must be finite".to_string(),
            );
            break;
        }
    }

    for (i, interior) in polygon.interiors().iter().enumerate() {
        if interior.0.len() < 4 {
            result.add_error(
                format!("Polygon interior[{}]", i),
                format!("Polygon interior must have at least 4 points, found {}", interior.0.len()),
            );
        }

        if let (Some(first), Some(last)) = (interior.0.first(), interior.0.last()) {
            if first != last {
                result.add_error(
                    format!("Polygon interior[{}]", i),
                    "Polygon interior must be closed (first point == last point)".to_string(),
                );
            }
        }
    }

    result
}

/// Fail with `InvalidGeometry` on an invalid feature geometry
pub fn ensure_valid(feature_id: &str, geometry: &Geometry) -> Result<()> {
    let validation = validate_geometry(geometry);
    if validation.is_valid {
        return Ok(());
    }
    Err(invalid_geometry(feature_id, validation))
}

/// Fail with `InvalidGeometry` on an invalid zone geometry
pub fn ensure_valid_zone(taz_id: i64, geometry: &MultiPolygon) -> Result<()> {
    let validation = validate_multipolygon(geometry);
    if validation.is_valid {
        return Ok(());
    }
    Err(invalid_geometry(&format!("zone {}", taz_id), validation))
}

fn invalid_geometry(feature_id: &str, validation: ValidationResult) -> TazTallyError {
    let reason = validation
        .errors
        .first()
        .map(|e| format!("{}: {}", e.location, e.reason))
        .unwrap_or_else(|| "Invalid geometry".to_string());
    TazTallyError::InvalidGeometry { feature_id: feature_id.to_string(), reason }
}
