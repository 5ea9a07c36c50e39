//! CRS normalization
//!
//! Destination layers must be reprojected to the zone layer's CRS before
//! any intersection. A geographic-coordinate layer intersected against
//! projected zone polygons matches nothing without raising an error, so the
//! mismatch check runs before intersection rather than after.

use geo::algorithm::map_coords::MapCoords;
use geo::Geometry;
use proj::Proj;

use crate::error::{Result, TazTallyError};
use crate::models::{Crs, Destination, DestinationLayer};

/// Check if two CRS are the same
pub fn crs_match(a: &Crs, b: &Crs) -> bool {
    a.epsg == b.epsg
}

/// Error with `CrsMismatch` if a feature layer does not share the zone
/// layer's CRS
pub fn check_crs_match(layer_crs: &Crs, zone_crs: &Crs) -> Result<()> {
    if !crs_match(layer_crs, zone_crs) {
        return Err(TazTallyError::CrsMismatch {
            layer_crs: layer_crs.to_string(),
            zone_crs: zone_crs.to_string(),
        });
    }
    Ok(())
}

/// Reproject a geometry between two known CRS
pub fn reproject_geometry(geometry: &Geometry, from: &Crs, to: &Crs) -> Result<Geometry> {
    // Same CRS, no transformation needed
    if crs_match(from, to) {
        return Ok(geometry.clone());
    }

    let proj = Proj::new_known_crs(&from.to_string(), &to.to_string(), None).map_err(|e| {
        TazTallyError::ProjectionFailed {
            from: from.to_string(),
            to: to.to_string(),
            reason: e.to_string(),
        }
    })?;

    geometry
        .try_map_coords(|coord| {
            proj.convert((coord.x, coord.y)).map(|(x, y)| geo::Coord { x, y })
        })
        .map_err(|e| TazTallyError::ProjectionFailed {
            from: from.to_string(),
            to: to.to_string(),
            reason: e.to_string(),
        })
}

/// Reproject every feature of a destination layer to the target CRS
pub fn normalize_layer(layer: &DestinationLayer, target: &Crs) -> Result<DestinationLayer> {
    if crs_match(&layer.crs, target) {
        return Ok(layer.clone());
    }

    tracing::debug!(
        layer = %layer.name,
        from = %layer.crs,
        to = %target,
        "reprojecting destination layer"
    );

    let features = layer
        .features
        .iter()
        .map(|feature| {
            reproject_geometry(&feature.geometry, &layer.crs, target).map(|geometry| Destination {
                id: feature.id.clone(),
                geometry,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(DestinationLayer {
        name: layer.name.clone(),
        crs: *target,
        features,
    })
}
