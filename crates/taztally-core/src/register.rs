//! Zone register: the authoritative ordered set of zone identifiers
//!
//! Every tabulation is reindexed against the register, so zones with zero
//! matches still appear in the output. The register is always derived from
//! the loaded zone layer, never from a fixed zone count.

use crate::models::{Zone, ZoneId, ZoneLayer};

/// Filter selecting zones by their region membership attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionFilter {
    value: String,
}

impl RegionFilter {
    pub fn new(value: impl Into<String>) -> Self {
        Self { value: value.into() }
    }

    pub fn matches(&self, zone: &Zone) -> bool {
        zone.region.as_deref() == Some(self.value.as_str())
    }
}

/// The authoritative, ordered set of zone identifiers for a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneRegister {
    // Sorted ascending, unique.
    ids: Vec<ZoneId>,
}

impl ZoneRegister {
    /// Build the register from a zone layer, optionally restricted to zones
    /// matching a region filter.
    ///
    /// Ordering is ascending zone id so downstream tables are reproducible
    /// across runs.
    pub fn from_layer(layer: &ZoneLayer, filter: Option<&RegionFilter>) -> Self {
        let mut ids: Vec<ZoneId> = layer
            .zones
            .iter()
            .filter(|zone| filter.map_or(true, |f| f.matches(zone)))
            .map(|zone| zone.taz_id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        Self { ids }
    }

    pub fn ids(&self) -> &[ZoneId] {
        &self.ids
    }

    pub fn contains(&self, taz_id: ZoneId) -> bool {
        self.ids.binary_search(&taz_id).is_ok()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Crs;
    use geo::{polygon, MultiPolygon};

    fn zone(taz_id: ZoneId, region: Option<&str>) -> Zone {
        let poly = polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 1.0),
            (x: 0.0, y: 0.0),
        ];
        Zone {
            taz_id,
            region: region.map(String::from),
            geometry: MultiPolygon::new(vec![poly]),
        }
    }

    fn layer(zones: Vec<Zone>) -> ZoneLayer {
        ZoneLayer::new(Crs::wgs84(), zones).unwrap()
    }

    #[test]
    fn test_register_is_sorted() {
        let layer = layer(vec![zone(30, None), zone(1, None), zone(12, None)]);
        let register = ZoneRegister::from_layer(&layer, None);
        assert_eq!(register.ids(), &[1, 12, 30]);
    }

    #[test]
    fn test_region_filter_restricts_register() {
        let layer = layer(vec![
            zone(1, Some("0")),
            zone(2, Some("1")),
            zone(3, Some("0")),
        ]);
        let filter = RegionFilter::new("1");
        let register = ZoneRegister::from_layer(&layer, Some(&filter));
        assert_eq!(register.ids(), &[2]);
        assert!(register.contains(2));
        assert!(!register.contains(1));
    }

    #[test]
    fn test_filter_matching_nothing_yields_empty_register() {
        let layer = layer(vec![zone(1, Some("0"))]);
        let filter = RegionFilter::new("metro");
        let register = ZoneRegister::from_layer(&layer, Some(&filter));
        assert!(register.is_empty());
    }

    #[test]
    fn test_zones_without_region_never_match_a_filter() {
        let layer = layer(vec![zone(1, None), zone(2, Some("metro"))]);
        let filter = RegionFilter::new("metro");
        let register = ZoneRegister::from_layer(&layer, Some(&filter));
        assert_eq!(register.ids(), &[2]);
    }
}
