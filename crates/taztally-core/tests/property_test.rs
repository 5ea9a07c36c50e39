//! Property tests for the tabulation invariants
//!
//! A 3x3 grid of 10-unit square zones gives an analytic oracle: the number
//! of zones a point intersects is the product of the closed intervals its x
//! and y fall into. Random point sets are then checked against that oracle
//! and the register/presence invariants.

use geo::{polygon, Geometry, MultiPolygon, Point};
use proptest::prelude::*;
use taztally_core::aggregate::{count_by_zone, presence_by_zone, BoundaryPolicy};
use taztally_core::models::{Crs, Destination, DestinationLayer, Zone, ZoneLayer};
use taztally_core::register::ZoneRegister;

const CRS: Crs = Crs { epsg: 26915 };
const CELL: f64 = 10.0;
const GRID: usize = 3;

fn grid_layer() -> ZoneLayer {
    let mut zones = Vec::new();
    for row in 0..GRID {
        for col in 0..GRID {
            let x0 = col as f64 * CELL;
            let y0 = row as f64 * CELL;
            let poly = polygon![
                (x: x0, y: y0),
                (x: x0 + CELL, y: y0),
                (x: x0 + CELL, y: y0 + CELL),
                (x: x0, y: y0 + CELL),
                (x: x0, y: y0),
            ];
            zones.push(Zone {
                taz_id: (row * GRID + col + 1) as i64,
                region: None,
                geometry: MultiPolygon::new(vec![poly]),
            });
        }
    }
    ZoneLayer::new(CRS, zones).unwrap()
}

fn point_layer(points: &[(f64, f64)]) -> DestinationLayer {
    DestinationLayer {
        name: "random_points".to_string(),
        crs: CRS,
        features: points
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| Destination {
                id: i.to_string(),
                geometry: Geometry::Point(Point::new(x, y)),
            })
            .collect(),
    }
}

/// Number of closed grid intervals along one axis containing the value
fn intervals_containing(v: f64) -> u64 {
    (0..GRID)
        .filter(|&i| {
            let lo = i as f64 * CELL;
            let hi = lo + CELL;
            v >= lo && v <= hi
        })
        .count() as u64
}

/// Number of grid zones a point intersects
fn zones_touched(x: f64, y: f64) -> u64 {
    intervals_containing(x) * intervals_containing(y)
}

proptest! {
    #[test]
    fn tabulation_keys_always_equal_register(
        points in prop::collection::vec((-5.0..35.0f64, -5.0..35.0f64), 0..40)
    ) {
        let zones = grid_layer();
        let register = ZoneRegister::from_layer(&zones, None);
        let features = point_layer(&points);

        let counts =
            count_by_zone(&register, &zones, &features, BoundaryPolicy::AllMatching).unwrap();
        let keys: Vec<i64> = counts.rows().iter().map(|r| r.taz_id).collect();
        prop_assert_eq!(keys.as_slice(), register.ids());

        let presence =
            presence_by_zone(&register, &zones, &features, BoundaryPolicy::AllMatching).unwrap();
        let keys: Vec<i64> = presence.rows().iter().map(|r| r.taz_id).collect();
        prop_assert_eq!(keys.as_slice(), register.ids());
    }

    #[test]
    fn count_total_matches_the_grid_oracle(
        points in prop::collection::vec((-5.0..35.0f64, -5.0..35.0f64), 0..40)
    ) {
        let zones = grid_layer();
        let register = ZoneRegister::from_layer(&zones, None);
        let features = point_layer(&points);

        let counts =
            count_by_zone(&register, &zones, &features, BoundaryPolicy::AllMatching).unwrap();
        let total: u64 = counts.rows().iter().map(|r| r.value).sum();

        let expected: u64 = points.iter().map(|&(x, y)| zones_touched(x, y)).sum();
        prop_assert_eq!(total, expected);

        // Never less than the number of features that intersect some zone
        let intersecting = points.iter().filter(|&&(x, y)| zones_touched(x, y) > 0).count() as u64;
        prop_assert!(total >= intersecting);
    }

    #[test]
    fn first_match_counts_each_feature_once(
        points in prop::collection::vec((-5.0..35.0f64, -5.0..35.0f64), 0..40)
    ) {
        let zones = grid_layer();
        let register = ZoneRegister::from_layer(&zones, None);
        let features = point_layer(&points);

        let counts =
            count_by_zone(&register, &zones, &features, BoundaryPolicy::FirstMatch).unwrap();
        let total: u64 = counts.rows().iter().map(|r| r.value).sum();

        let intersecting = points.iter().filter(|&&(x, y)| zones_touched(x, y) > 0).count() as u64;
        prop_assert_eq!(total, intersecting);
    }

    #[test]
    fn presence_is_count_positivity(
        points in prop::collection::vec((-5.0..35.0f64, -5.0..35.0f64), 0..40)
    ) {
        let zones = grid_layer();
        let register = ZoneRegister::from_layer(&zones, None);
        let features = point_layer(&points);

        let counts =
            count_by_zone(&register, &zones, &features, BoundaryPolicy::AllMatching).unwrap();
        let presence =
            presence_by_zone(&register, &zones, &features, BoundaryPolicy::AllMatching).unwrap();

        for row in counts.rows() {
            prop_assert_eq!(presence.get(row.taz_id), Some(u64::from(row.value > 0)));
        }
    }
}
