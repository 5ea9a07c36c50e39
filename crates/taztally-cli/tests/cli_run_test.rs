//! End-to-end tests driving the compiled binary
//!
//! Fixtures keep every layer in EPSG:4326 so the runs exercise the full
//! load-tabulate-export path without depending on reprojection.

use std::fs;
use std::path::PathBuf;
use std::process::Command;

fn taztally_bin() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // Remove test binary name
    path.pop(); // Remove 'deps' directory
    path.push("taztally");
    path
}

const ZONES: &str = r#"{
    "type": "FeatureCollection",
    "crs": {"type": "name", "properties": {"name": "EPSG:4326"}},
    "features": [
        {
            "type": "Feature",
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[-94.25, 46.30], [-94.15, 46.30], [-94.15, 46.40], [-94.25, 46.40], [-94.25, 46.30]]]
            },
            "properties": {"taz_id": 1, "region": "1"}
        },
        {
            "type": "Feature",
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[-94.15, 46.30], [-94.05, 46.30], [-94.05, 46.40], [-94.15, 46.40], [-94.15, 46.30]]]
            },
            "properties": {"taz_id": 2, "region": "0"}
        }
    ]
}"#;

const CLINICS: &str = "name,longitude,latitude\nEssentia Clinic,-94.2008,46.3580\n";

struct Fixture {
    dir: tempfile::TempDir,
    zones: PathBuf,
    clinics: PathBuf,
}

fn fixture() -> Fixture {
    let dir = tempfile::TempDir::new().unwrap();
    let zones = dir.path().join("zones.geojson");
    let clinics = dir.path().join("clinics.csv");
    fs::write(&zones, ZONES).unwrap();
    fs::write(&clinics, CLINICS).unwrap();
    Fixture { dir, zones, clinics }
}

#[test]
fn test_count_writes_zero_filled_table() {
    let fx = fixture();
    let out = fx.dir.path().join("clinics_by_taz.csv");

    let output = Command::new(taztally_bin())
        .args([
            "count",
            "--zones",
            fx.zones.to_str().unwrap(),
            "--features",
            fx.clinics.to_str().unwrap(),
            "--out",
            out.to_str().unwrap(),
        ])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(fs::read_to_string(&out).unwrap(), "taz_id,n\n1,1\n2,0\n");
}

#[test]
fn test_presence_with_custom_column() {
    let fx = fixture();
    let out = fx.dir.path().join("has_clinic.csv");

    let output = Command::new(taztally_bin())
        .args([
            "presence",
            "--zones",
            fx.zones.to_str().unwrap(),
            "--features",
            fx.clinics.to_str().unwrap(),
            "--out",
            out.to_str().unwrap(),
            "--column",
            "has_healthcare",
        ])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        fs::read_to_string(&out).unwrap(),
        "taz_id,has_healthcare\n1,1\n2,0\n"
    );
}

#[test]
fn test_region_filter_drops_other_zones_from_output() {
    let fx = fixture();
    let out = fx.dir.path().join("metro_only.csv");

    let output = Command::new(taztally_bin())
        .args([
            "count",
            "--zones",
            fx.zones.to_str().unwrap(),
            "--features",
            fx.clinics.to_str().unwrap(),
            "--out",
            out.to_str().unwrap(),
            "--region",
            "1",
        ])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(fs::read_to_string(&out).unwrap(), "taz_id,n\n1,1\n");
}

#[test]
fn test_json_success_output_is_valid() {
    let fx = fixture();
    let out = fx.dir.path().join("clinics_by_taz.csv");

    let output = Command::new(taztally_bin())
        .args([
            "count",
            "--json",
            "--zones",
            fx.zones.to_str().unwrap(),
            "--features",
            fx.clinics.to_str().unwrap(),
            "--out",
            out.to_str().unwrap(),
        ])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value =
        serde_json::from_str(&stdout).expect("Output should be valid JSON");
    assert_eq!(parsed.get("status").and_then(|s| s.as_str()), Some("success"));
}

#[test]
fn test_unknown_region_value_fails() {
    let fx = fixture();
    let out = fx.dir.path().join("never_written.csv");

    let output = Command::new(taztally_bin())
        .args([
            "count",
            "--zones",
            fx.zones.to_str().unwrap(),
            "--features",
            fx.clinics.to_str().unwrap(),
            "--out",
            out.to_str().unwrap(),
            "--region",
            "downtown",
        ])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    assert!(!out.exists());
}
