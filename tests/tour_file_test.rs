//! Integration tests for loading tour definitions from disk

use std::fs;
use tempfile::TempDir;
use tour_engine::domain::setting::ContentDirective;
use tour_engine::domain::types::{TaxonId, TransitionStyle};
use tour_engine::io::tour_file::load_tour;

#[test]
fn test_load_json_tour() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tour.json");
    fs::write(
        &path,
        r#"{
            "name": "Mammals",
            "tourstop_shared": { "stop_wait": 4000, "transition_in": "fly_straight" },
            "tourstops": [
                { "identifier": "intro", "ott": 244265, "update_class": { "title": "Mammals" } },
                { "identifier": "whales", "ott": "698424", "transition_in": "leap" }
            ]
        }"#,
    )
    .unwrap();

    let setting = load_tour(&path).unwrap();
    assert_eq!(setting.name.as_deref(), Some("Mammals"));
    assert_eq!(setting.stops.len(), 2);
    assert_eq!(setting.stops[0].target_id, Some(TaxonId(244265)));
    assert_eq!(setting.stops[0].transition_in, TransitionStyle::FlyStraight);
    assert_eq!(
        setting.stops[0].update_class["title"],
        ContentDirective::Html("Mammals".to_string())
    );
    assert_eq!(setting.stops[1].transition_in, TransitionStyle::Leap);
    assert_eq!(setting.stops[1].stop_wait, Some(4000));
}

#[test]
fn test_load_toml_tour() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tour.toml");
    fs::write(
        &path,
        r#"
name = "Birds"

[auto_activate]
inactive_duration = 60000

[tourstop_shared]
stop_wait = 2500

[[tourstops]]
identifier = "start"
ott = 81461

[[tourstops]]
identifier = "owls"
ott = 4789
stop_wait = 6000
"#,
    )
    .unwrap();

    let setting = load_tour(&path).unwrap();
    assert_eq!(setting.stops.len(), 2);
    assert_eq!(setting.stops[0].stop_wait, Some(2500));
    assert_eq!(setting.stops[1].stop_wait, Some(6000));
    assert_eq!(setting.target_ids(), vec![TaxonId(81461), TaxonId(4789)]);
    assert!(setting.auto_activate_after().is_some());
}

#[test]
fn test_tour_without_stops_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.json");
    fs::write(&path, r#"{ "name": "Nothing", "tourstops": [] }"#).unwrap();

    let err = load_tour(&path).unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("Invalid tour"));
    assert!(message.contains("at least one tourstop"));
}

#[test]
fn test_missing_tour_file() {
    let err = load_tour("/nonexistent/tour.json").unwrap_err();
    assert!(format!("{err:#}").contains("Failed to read tour file"));
}
