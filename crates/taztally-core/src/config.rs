//! Layered run configuration
//!
//! Values come from four sources with increasing precedence: built-in
//! defaults, a TOML file, `TAZTALLY_*` environment variables, and CLI
//! arguments.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

use crate::aggregate::BoundaryPolicy;
use crate::error::{Result, TazTallyError};

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered configuration for a tabulation run
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    /// Zone id field name in the zone layer
    pub id_field: ConfigValue<String>,
    /// Region membership field name in the zone layer
    pub region_field: ConfigValue<String>,
    /// How features touching several zones are counted
    pub boundary_policy: ConfigValue<BoundaryPolicy>,
    /// Longitude column name for CSV point input
    pub lon_field: ConfigValue<String>,
    /// Latitude column name for CSV point input
    pub lat_field: ConfigValue<String>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            id_field: ConfigValue::new("taz_id".to_string(), ConfigSource::Default),
            region_field: ConfigValue::new("region".to_string(), ConfigSource::Default),
            boundary_policy: ConfigValue::new(BoundaryPolicy::default(), ConfigSource::Default),
            lon_field: ConfigValue::new("longitude".to_string(), ConfigSource::Default),
            lat_field: ConfigValue::new("latitude".to_string(), ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| TazTallyError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| TazTallyError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(id_field) = file_config.id_field {
            self.id_field.update(id_field, ConfigSource::File);
        }
        if let Some(region_field) = file_config.region_field {
            self.region_field.update(region_field, ConfigSource::File);
        }
        if let Some(boundary_policy) = file_config.boundary_policy {
            self.boundary_policy.update(boundary_policy, ConfigSource::File);
        }
        if let Some(lon_field) = file_config.lon_field {
            self.lon_field.update(lon_field, ConfigSource::File);
        }
        if let Some(lat_field) = file_config.lat_field {
            self.lat_field.update(lat_field, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        if let Ok(id_field) = env::var("TAZTALLY_ID_FIELD") {
            self.id_field.update(id_field, ConfigSource::Environment);
        }

        if let Ok(region_field) = env::var("TAZTALLY_REGION_FIELD") {
            self.region_field.update(region_field, ConfigSource::Environment);
        }

        if let Ok(policy_str) = env::var("TAZTALLY_BOUNDARY_POLICY") {
            match parse_boundary_policy(&policy_str) {
                Ok(policy) => self.boundary_policy.update(policy, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid TAZTALLY_BOUNDARY_POLICY value '{}': expected all-matching or first-match",
                    policy_str
                ),
            }
        }

        if let Ok(lon_field) = env::var("TAZTALLY_LON_FIELD") {
            self.lon_field.update(lon_field, ConfigSource::Environment);
        }

        if let Ok(lat_field) = env::var("TAZTALLY_LAT_FIELD") {
            self.lat_field.update(lat_field, ConfigSource::Environment);
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(id_field) = overrides.id_field {
            self.id_field.update(id_field, ConfigSource::Cli);
        }
        if let Some(region_field) = overrides.region_field {
            self.region_field.update(region_field, ConfigSource::Cli);
        }
        if let Some(boundary_policy) = overrides.boundary_policy {
            self.boundary_policy.update(boundary_policy, ConfigSource::Cli);
        }
        if let Some(lon_field) = overrides.lon_field {
            self.lon_field.update(lon_field, ConfigSource::Cli);
        }
        if let Some(lat_field) = overrides.lat_field {
            self.lat_field.update(lat_field, ConfigSource::Cli);
        }
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    id_field: Option<String>,
    region_field: Option<String>,
    boundary_policy: Option<BoundaryPolicy>,
    lon_field: Option<String>,
    lat_field: Option<String>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub id_field: Option<String>,
    pub region_field: Option<String>,
    pub boundary_policy: Option<BoundaryPolicy>,
    pub lon_field: Option<String>,
    pub lat_field: Option<String>,
}

/// Parse a boundary policy from string
pub fn parse_boundary_policy(s: &str) -> Result<BoundaryPolicy> {
    match s.to_lowercase().as_str() {
        "all-matching" | "all" => Ok(BoundaryPolicy::AllMatching),
        "first-match" | "first" => Ok(BoundaryPolicy::FirstMatch),
        _ => Err(TazTallyError::ConfigInvalid {
            key: "boundary_policy".to_string(),
            reason: format!("Invalid boundary policy: {}. Use all-matching or first-match", s),
        }),
    }
}
