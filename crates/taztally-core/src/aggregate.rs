//! Spatial Aggregator: count and presence tabulations per zone
//!
//! Both operations share one intersection pass over the layers; they differ
//! only in how the (zone, feature) pairs are folded and in the default
//! column name of the exported table.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::geo::spatial::{zone_matches, ZoneMatch};
use crate::models::{DestinationLayer, TabulationRow, ZoneId, ZoneLayer, ZoneTabulation};
use crate::register::ZoneRegister;

/// Default value column for count tabulations
pub const COUNT_COLUMN: &str = "n";

/// Default value column for presence tabulations
pub const PRESENCE_COLUMN: &str = "present";

/// Policy for features intersecting more than one zone, such as a point
/// lying exactly on a shared zone boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BoundaryPolicy {
    /// Count the feature toward every zone it intersects
    #[default]
    AllMatching,

    /// Assign the feature to the lowest matching zone id only
    FirstMatch,
}

/// Count intersecting features per registered zone.
///
/// Pairs are grouped by zone id, then reindexed against the register with a
/// zero fill. The reindex is mandatory: the raw grouped map silently omits
/// zero-count zones and is never returned directly.
pub fn count_by_zone(
    register: &ZoneRegister,
    zones: &ZoneLayer,
    features: &DestinationLayer,
    policy: BoundaryPolicy,
) -> Result<ZoneTabulation> {
    let pairs = scoped_matches(register, zones, features, policy)?;

    let mut grouped: HashMap<ZoneId, u64> = HashMap::new();
    for m in &pairs {
        *grouped.entry(m.taz_id).or_insert(0) += 1;
    }

    let rows = register
        .ids()
        .iter()
        .map(|&taz_id| TabulationRow {
            taz_id,
            value: grouped.get(&taz_id).copied().unwrap_or(0),
        })
        .collect();

    let tabulation = ZoneTabulation::new(COUNT_COLUMN, rows);
    tabulation.verify_against(register)?;
    Ok(tabulation)
}

/// Flag registered zones containing at least one intersecting feature.
///
/// Only the matched zone-id set matters here; multiplicity is irrelevant.
/// Every registered zone is still emitted, with 0 for zones outside the set.
pub fn presence_by_zone(
    register: &ZoneRegister,
    zones: &ZoneLayer,
    features: &DestinationLayer,
    policy: BoundaryPolicy,
) -> Result<ZoneTabulation> {
    let pairs = scoped_matches(register, zones, features, policy)?;

    let matched: BTreeSet<ZoneId> = pairs.iter().map(|m| m.taz_id).collect();

    let rows = register
        .ids()
        .iter()
        .map(|&taz_id| TabulationRow {
            taz_id,
            value: u64::from(matched.contains(&taz_id)),
        })
        .collect();

    let tabulation = ZoneTabulation::new(PRESENCE_COLUMN, rows);
    tabulation.verify_against(register)?;
    Ok(tabulation)
}

/// Intersect, keep only registered zones, then apply the boundary policy.
///
/// Matches are scoped to the register before the policy runs, so under
/// `FirstMatch` a feature is assigned to the lowest *registered* zone it
/// touches rather than disappearing into a filtered-out one.
fn scoped_matches(
    register: &ZoneRegister,
    zones: &ZoneLayer,
    features: &DestinationLayer,
    policy: BoundaryPolicy,
) -> Result<Vec<ZoneMatch>> {
    let mut pairs: Vec<ZoneMatch> = zone_matches(zones, features)?
        .into_iter()
        .filter(|m| register.contains(m.taz_id))
        .collect();

    if policy == BoundaryPolicy::FirstMatch {
        let mut best: BTreeMap<usize, ZoneId> = BTreeMap::new();
        for m in &pairs {
            best.entry(m.feature_idx)
                .and_modify(|taz_id| {
                    if m.taz_id < *taz_id {
                        *taz_id = m.taz_id;
                    }
                })
                .or_insert(m.taz_id);
        }
        pairs = best
            .into_iter()
            .map(|(feature_idx, taz_id)| ZoneMatch { taz_id, feature_idx })
            .collect();
    }

    Ok(pairs)
}
