//! Zone/feature intersection
//!
//! The single intersection primitive behind both tabulation variants. The
//! predicate is `Intersects`, so a point lying exactly on a shared zone
//! boundary matches every zone carrying that boundary and yields one pair
//! per zone; how those multiple pairs are counted is the aggregator's
//! boundary policy.

use geo::algorithm::intersects::Intersects;

use crate::error::Result;
use crate::geo::index::ZoneIndex;
use crate::geo::transform::check_crs_match;
use crate::geo::validation;
use crate::models::{DestinationLayer, ZoneId, ZoneLayer};

/// A single (zone, feature) intersection hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneMatch {
    pub taz_id: ZoneId,

    /// Position of the feature in the destination layer
    pub feature_idx: usize,
}

/// Compute all (zone, feature) intersection pairs between a zone layer and
/// a destination layer already normalized to the zone CRS.
///
/// The CRS check runs first: a mismatched layer errors here instead of
/// silently intersecting nothing. Both layers are validated before any
/// predicate is evaluated.
pub fn zone_matches(zones: &ZoneLayer, features: &DestinationLayer) -> Result<Vec<ZoneMatch>> {
    check_crs_match(&features.crs, &zones.crs)?;

    for zone in &zones.zones {
        validation::ensure_valid_zone(zone.taz_id, &zone.geometry)?;
    }
    for feature in &features.features {
        validation::ensure_valid(&feature.id, &feature.geometry)?;
    }

    let index = ZoneIndex::from_zones(&zones.zones);
    let mut matches = Vec::new();

    for (feature_idx, feature) in features.features.iter().enumerate() {
        for entry in index.candidates(&feature.geometry) {
            let zone = &zones.zones[entry.zone_idx];
            if zone.geometry.intersects(&feature.geometry) {
                matches.push(ZoneMatch { taz_id: zone.taz_id, feature_idx });
            }
        }
    }

    Ok(matches)
}
