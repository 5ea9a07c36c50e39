//! R-tree over zone envelopes
//!
//! The index is a candidate pre-filter: envelope hits still go through the
//! exact intersection predicate, so a degenerate envelope can only produce
//! false positives, never false negatives.

use geo::algorithm::bounding_rect::BoundingRect;
use geo::{Geometry, MultiPolygon};
use rstar::{RTree, RTreeObject, AABB};

use crate::models::{Zone, ZoneId};

/// Zone envelope entry for the R-tree
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedZone {
    /// Zone identifier
    pub taz_id: ZoneId,

    /// Position of the zone in the source layer
    pub zone_idx: usize,

    envelope: AABB<[f64; 2]>,
}

impl IndexedZone {
    fn new(taz_id: ZoneId, zone_idx: usize, geometry: &MultiPolygon) -> Self {
        let envelope = match geometry.bounding_rect() {
            Some(rect) => {
                let min = rect.min();
                let max = rect.max();
                AABB::from_corners([min.x, min.y], [max.x, max.y])
            }
            // Empty geometries have no bounding rect; a degenerate envelope
            // at the origin keeps the entry queryable.
            None => AABB::from_point([0.0, 0.0]),
        };
        Self { taz_id, zone_idx, envelope }
    }
}

impl RTreeObject for IndexedZone {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Spatial index over a zone layer's envelopes
pub struct ZoneIndex {
    tree: RTree<IndexedZone>,
}

impl ZoneIndex {
    /// Bulk-load the index from a slice of zones
    pub fn from_zones(zones: &[Zone]) -> Self {
        let indexed: Vec<IndexedZone> = zones
            .iter()
            .enumerate()
            .map(|(idx, zone)| IndexedZone::new(zone.taz_id, idx, &zone.geometry))
            .collect();
        Self { tree: RTree::bulk_load(indexed) }
    }

    /// Zones whose envelope intersects the feature's envelope
    pub fn candidates(&self, geometry: &Geometry) -> Vec<&IndexedZone> {
        let Some(rect) = geometry.bounding_rect() else {
            return Vec::new();
        };
        let envelope =
            AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]);
        self.tree.locate_in_envelope_intersecting(&envelope).collect()
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Point};

    fn square_zone(taz_id: ZoneId, x0: f64, y0: f64, size: f64) -> Zone {
        let poly = polygon![
            (x: x0, y: y0),
            (x: x0 + size, y: y0),
            (x: x0 + size, y: y0 + size),
            (x: x0, y: y0 + size),
            (x: x0, y: y0),
        ];
        Zone { taz_id, region: None, geometry: MultiPolygon::new(vec![poly]) }
    }

    #[test]
    fn test_candidates_filter_by_envelope() {
        let zones = vec![
            square_zone(1, 0.0, 0.0, 10.0),
            square_zone(2, 100.0, 100.0, 10.0),
        ];
        let index = ZoneIndex::from_zones(&zones);
        assert_eq!(index.len(), 2);

        let hits = index.candidates(&Geometry::Point(Point::new(5.0, 5.0)));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].taz_id, 1);

        let misses = index.candidates(&Geometry::Point(Point::new(50.0, 50.0)));
        assert!(misses.is_empty());
    }

    #[test]
    fn test_point_on_shared_envelope_edge_hits_both() {
        let zones = vec![
            square_zone(1, 0.0, 0.0, 10.0),
            square_zone(2, 10.0, 0.0, 10.0),
        ];
        let index = ZoneIndex::from_zones(&zones);
        let hits = index.candidates(&Geometry::Point(Point::new(10.0, 5.0)));
        assert_eq!(hits.len(), 2);
    }
}
