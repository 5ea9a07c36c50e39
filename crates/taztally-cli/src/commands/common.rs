//! Shared load/normalize pipeline for the tabulation commands
//!
//! Every command runs the same front half: resolve layered configuration,
//! read both layers, normalize the destination layer to the zone CRS, and
//! build the zone register. Count, presence, and inspect differ only in
//! what they do with the prepared run.

use std::path::Path;

use anyhow::{bail, Context, Result};

use taztally_core::aggregate::BoundaryPolicy;
use taztally_core::config::{parse_boundary_policy, CliConfigOverrides, LayeredConfig};
use taztally_core::formats::{
    into_destination_layer, into_zone_layer, CsvColumns, FormatRegistry,
};
use taztally_core::geo::transform::normalize_layer;
use taztally_core::models::{DestinationLayer, ZoneLayer};
use taztally_core::register::{RegionFilter, ZoneRegister};

use crate::cli::LayerArgs;

pub struct PreparedRun {
    pub register: ZoneRegister,
    pub zones: ZoneLayer,
    pub features: DestinationLayer,
    pub policy: BoundaryPolicy,
}

pub fn prepare(args: &LayerArgs, config_path: Option<&Path>) -> Result<PreparedRun> {
    let config = resolve_config(args, config_path)?;

    let registry = FormatRegistry::with_defaults(CsvColumns {
        lon: config.lon_field.value.clone(),
        lat: config.lat_field.value.clone(),
        id: None,
    });

    let zone_dataset = registry
        .read(&args.zones)
        .with_context(|| format!("Failed to read zone layer {}", args.zones.display()))?;
    let zones = into_zone_layer(
        zone_dataset,
        &config.id_field.value,
        &config.region_field.value,
    )?;

    let mut feature_dataset = registry
        .read(&args.features)
        .with_context(|| format!("Failed to read destination layer {}", args.features.display()))?;
    if let Some(epsg) = args.feature_crs {
        feature_dataset.crs = epsg;
    }
    let features = into_destination_layer(feature_dataset)?;
    let features = normalize_layer(&features, &zones.crs)
        .context("Failed to normalize destination layer to the zone CRS")?;

    let filter = args.region.as_deref().map(RegionFilter::new);
    let register = ZoneRegister::from_layer(&zones, filter.as_ref());
    if register.is_empty() {
        match &args.region {
            Some(region) => bail!(
                "No zone in {} has {} = '{}'",
                args.zones.display(),
                config.region_field.value,
                region
            ),
            None => bail!("Zone layer {} contains no zones", args.zones.display()),
        }
    }

    tracing::info!(
        zones = register.len(),
        features = features.features.len(),
        crs = %zones.crs,
        "prepared tabulation run"
    );

    Ok(PreparedRun {
        register,
        zones,
        features,
        policy: config.boundary_policy.value,
    })
}

fn resolve_config(args: &LayerArgs, config_path: Option<&Path>) -> Result<LayeredConfig> {
    let mut config = LayeredConfig::with_defaults();
    if let Some(path) = config_path {
        config = config
            .load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?;
    }
    let mut config = config.load_from_env();

    let boundary_policy = args
        .boundary_policy
        .as_deref()
        .map(parse_boundary_policy)
        .transpose()?;

    config.update_from_cli(CliConfigOverrides {
        id_field: args.id_field.clone(),
        region_field: args.region_field.clone(),
        boundary_policy,
        lon_field: args.lon_field.clone(),
        lat_field: args.lat_field.clone(),
    });

    Ok(config)
}
