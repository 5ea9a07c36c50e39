use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// TazTally - destination-to-zone tabulation
#[derive(Parser, Debug)]
#[command(name = "taztally")]
#[command(about = "Tabulate destination layers against transportation analysis zones", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Count intersecting destinations per zone
    Count(TabulateArgs),

    /// Flag zones containing at least one destination
    Presence(TabulateArgs),

    /// Preview a count tabulation joined to zone attributes
    Inspect(InspectArgs),
}

/// Input arguments shared by every tabulation command
#[derive(Parser, Debug)]
pub struct LayerArgs {
    /// Zone polygon layer (Shapefile or GeoJSON) with an integer id field
    #[arg(long)]
    pub zones: PathBuf,

    /// Destination layer (Shapefile, GeoJSON, or lon/lat CSV)
    #[arg(long)]
    pub features: PathBuf,

    /// Restrict the zone register to zones with this region value
    #[arg(long)]
    pub region: Option<String>,

    /// Override the destination layer's declared CRS (EPSG code)
    #[arg(long, value_name = "EPSG")]
    pub feature_crs: Option<u32>,

    /// Zone id field name (default: taz_id)
    #[arg(long)]
    pub id_field: Option<String>,

    /// Region membership field name (default: region)
    #[arg(long)]
    pub region_field: Option<String>,

    /// Longitude column for CSV input (default: longitude)
    #[arg(long)]
    pub lon_field: Option<String>,

    /// Latitude column for CSV input (default: latitude)
    #[arg(long)]
    pub lat_field: Option<String>,

    /// Boundary policy for multi-zone features: all-matching or first-match
    #[arg(long)]
    pub boundary_policy: Option<String>,
}

#[derive(Parser, Debug)]
pub struct TabulateArgs {
    #[command(flatten)]
    pub layer: LayerArgs,

    /// Output path for the flat table
    #[arg(long)]
    pub out: PathBuf,

    /// Value column name in the output table
    #[arg(long)]
    pub column: Option<String>,
}

#[derive(Parser, Debug)]
pub struct InspectArgs {
    #[command(flatten)]
    pub layer: LayerArgs,

    /// Maximum number of rows to display
    #[arg(long, default_value_t = 20)]
    pub limit: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_count_command() {
        let cli = Cli::parse_from([
            "taztally",
            "count",
            "--zones",
            "zones.shp",
            "--features",
            "parks.geojson",
            "--out",
            "parks_by_taz.csv",
            "--region",
            "1",
        ]);
        let Commands::Count(args) = cli.command else {
            panic!("expected count command");
        };
        assert_eq!(args.layer.zones, PathBuf::from("zones.shp"));
        assert_eq!(args.layer.region.as_deref(), Some("1"));
        assert_eq!(args.out, PathBuf::from("parks_by_taz.csv"));
        assert!(args.column.is_none());
    }

    #[test]
    fn test_parse_inspect_defaults() {
        let cli = Cli::parse_from([
            "taztally",
            "inspect",
            "--zones",
            "zones.shp",
            "--features",
            "clinics.csv",
        ]);
        let Commands::Inspect(args) = cli.command else {
            panic!("expected inspect command");
        };
        assert_eq!(args.limit, 20);
    }
}
