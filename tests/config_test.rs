//! Integration tests for configuration loading

use std::io::Write;
use tempfile::{NamedTempFile, TempDir};
use tour_engine::domain::types::{NodeId, TaxonId};
use tour_engine::infra::Config;

#[test]
fn test_load_config_from_file() {
    let mut temp_file = NamedTempFile::new().unwrap();

    let config_content = r#"
[tour]
file = "/srv/tours/evolution.json"
autostart = true

[camera]
flight_ms = 750
fail_every = 4

[resolver]
latency_ms = 120

[targets]
770315 = 1234
"91101" = -55

[metrics]
interval_secs = 15
"#;

    temp_file.write_all(config_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();

    assert_eq!(config.tour_file(), "/srv/tours/evolution.json");
    assert!(config.autostart());
    assert_eq!(config.flight_ms(), 750);
    assert_eq!(config.fail_every(), 4);
    assert_eq!(config.resolver_latency_ms(), 120);
    assert_eq!(config.targets().get(&TaxonId(770315)), Some(&NodeId(1234)));
    assert_eq!(config.targets().get(&TaxonId(91101)), Some(&NodeId(-55)));
    assert_eq!(config.metrics_interval_secs(), 15);
}

#[test]
fn test_relative_tour_file_follows_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("kiosk.toml");
    std::fs::write(&path, "[tour]\nfile = \"tours/short.json\"\n").unwrap();

    let config = Config::from_file(&path).unwrap();

    let expected = dir.path().join("tours/short.json");
    assert_eq!(config.tour_file(), expected.display().to_string());
    assert_eq!(config.flight_ms(), 2000);
    assert!(!config.autostart());
}

#[test]
fn test_invalid_target_keys_skipped() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file
        .write_all(b"[tour]\nfile = \"t.json\"\n\n[targets]\nlion = 3\n42 = 7\n")
        .unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();
    assert_eq!(config.targets().len(), 1);
    assert_eq!(config.targets().get(&TaxonId(42)), Some(&NodeId(7)));
}

#[test]
fn test_missing_tour_section_is_an_error() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[camera]\nflight_ms = 10\n").unwrap();
    temp_file.flush().unwrap();

    let err = Config::from_file(temp_file.path()).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to parse config file"));
}

#[test]
fn test_load_from_path_fallback() {
    let config = Config::load_from_path("/nonexistent/config.toml");
    assert_eq!(config.tour_file(), "tours/demo.json");
    assert_eq!(config.flight_ms(), 2000);
    assert_eq!(config.config_file(), "default");
}

#[test]
fn test_autostart_flag_only_enables() {
    let config = Config::default().with_autostart(true);
    assert!(config.autostart());
    assert!(config.with_autostart(false).autostart());
}
