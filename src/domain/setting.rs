//! Tour definitions: shared and per-stop settings
//!
//! A definition is loaded from JSON (or TOML) and validated into a
//! [`TourSetting`]. Every stop's settings are the shared settings deep-merged
//! with the stop's own, so a stop only spells out what differs.

use crate::domain::errors::ConfigError;
use crate::domain::types::{Direction, InteractionEffect, NodeId, TaxonId, TransitionStyle};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::time::Duration;

/// Element ids and classes the presentation layer binds navigation to
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DomNames {
    #[serde(default = "default_wrapper_id")]
    pub wrapper_id: String,
    #[serde(default = "default_next_class")]
    pub next_class: String,
    #[serde(default = "default_prev_class")]
    pub prev_class: String,
    #[serde(default = "default_exit_class")]
    pub exit_class: String,
    #[serde(default = "default_exit_confirm_class")]
    pub exit_confirm_class: String,
    #[serde(default = "default_exit_cancel_class")]
    pub exit_cancel_class: String,
}

fn default_wrapper_id() -> String {
    "tour_wrapper".to_string()
}

fn default_next_class() -> String {
    "tour_next".to_string()
}

fn default_prev_class() -> String {
    "tour_prev".to_string()
}

fn default_exit_class() -> String {
    "tour_exit".to_string()
}

fn default_exit_confirm_class() -> String {
    "exit_confirm".to_string()
}

fn default_exit_cancel_class() -> String {
    "exit_cancel".to_string()
}

impl Default for DomNames {
    fn default() -> Self {
        Self {
            wrapper_id: default_wrapper_id(),
            next_class: default_next_class(),
            prev_class: default_prev_class(),
            exit_class: default_exit_class(),
            exit_confirm_class: default_exit_confirm_class(),
            exit_cancel_class: default_exit_cancel_class(),
        }
    }
}

/// Reaction to visitor interaction while the tour runs
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct InteractionSetting {
    #[serde(default)]
    pub effect: InteractionEffect,
    /// Template for the "really exit?" popup, required by `exit_after_confirmation`
    #[serde(default)]
    pub confirm_template: Option<String>,
    #[serde(default)]
    pub confirm_template_style: Option<String>,
}

/// Start the tour by itself after a period without interaction
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AutoActivateSetting {
    /// Inactivity threshold in milliseconds
    #[serde(default, deserialize_with = "deserialize_lenient_u64")]
    pub inactive_duration: Option<u64>,
}

/// Content update applied to elements matching a class inside a stop
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ContentDirective {
    /// Replace the element's markup
    Html(String),
    Fields(ContentFields),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ContentFields {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub style: BTreeMap<String, String>,
    #[serde(default)]
    pub src: Option<String>,
    #[serde(default)]
    pub href: Option<String>,
}

/// Settings for one tour stop, after merging with the shared settings
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StopSetting {
    /// Unique name of the stop within its tour
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default, alias = "ott", deserialize_with = "deserialize_taxon")]
    pub target_id: Option<TaxonId>,
    /// Position hint handed to the camera on leaps
    #[serde(default)]
    pub pos: Option<String>,
    /// Zoom into the target node rather than framing it
    #[serde(default)]
    pub into_node: bool,
    #[serde(default)]
    pub transition_in: TransitionStyle,
    #[serde(default)]
    pub fly_in_speed: Option<f64>,
    /// Pause before starting motion into the stop (ms)
    #[serde(default, deserialize_with = "deserialize_lenient_u64")]
    pub transition_in_wait: Option<u64>,
    /// Time spent at the stop before moving on (ms); absent means wait for the visitor
    #[serde(default, deserialize_with = "deserialize_lenient_u64")]
    pub stop_wait: Option<u64>,
    /// Overrides `stop_wait` when arriving backward, even when present but null
    #[serde(default, deserialize_with = "deserialize_present_u64")]
    pub stop_wait_after_backward: Option<Option<u64>>,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub template_style: Option<String>,
    #[serde(default)]
    pub update_class: BTreeMap<String, ContentDirective>,
    /// Stop exists only to carry the camera; defaults to "has no content"
    #[serde(default)]
    pub transitional: Option<bool>,
}

impl StopSetting {
    /// Wait time for the given arrival direction, `None` meaning "manual"
    pub fn wait_for(&self, direction: Direction) -> Option<Duration> {
        let millis = match (direction, self.stop_wait_after_backward) {
            (Direction::Backward, Some(after_backward)) => after_backward,
            _ => self.stop_wait,
        };
        millis.map(Duration::from_millis)
    }

    /// Delay before motion starts
    pub fn transition_delay(&self) -> Option<Duration> {
        self.transition_in_wait.map(Duration::from_millis)
    }

    pub fn fly_speed(&self) -> f64 {
        match self.fly_in_speed {
            Some(speed) if speed.is_finite() && speed > 0.0 => speed,
            _ => 1.0,
        }
    }

    /// Transitional stops have no content of their own and are skipped going backward
    pub fn is_transitional(&self) -> bool {
        self.transitional.unwrap_or_else(|| self.update_class.is_empty())
    }
}

/// Raw tour definition as written by tour authors
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TourDefinition {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub dom_names: DomNames,
    #[serde(default)]
    pub interaction: InteractionSetting,
    #[serde(default)]
    pub auto_activate: Option<AutoActivateSetting>,
    /// Where taxon id 0 points
    #[serde(default)]
    pub rough_initial_loc: Option<NodeId>,
    #[serde(default, alias = "tour_stop_shared")]
    pub tourstop_shared: Value,
    #[serde(default, alias = "tour_stop")]
    pub tourstops: Vec<Value>,
}

/// Validated tour settings with per-stop settings merged
#[derive(Debug, Clone, PartialEq)]
pub struct TourSetting {
    pub name: Option<String>,
    pub dom_names: DomNames,
    pub interaction: InteractionSetting,
    pub auto_activate: Option<AutoActivateSetting>,
    pub rough_initial_loc: Option<NodeId>,
    pub stops: Vec<StopSetting>,
}

impl TourSetting {
    /// Parse and validate a JSON tour definition
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let definition: TourDefinition = serde_json::from_str(json)?;
        Self::from_definition(definition)
    }

    /// Merge shared settings into every stop and validate the result
    pub fn from_definition(definition: TourDefinition) -> Result<Self, ConfigError> {
        if definition.tourstops.is_empty() {
            return Err(ConfigError::NoStops);
        }

        let mut stops = Vec::with_capacity(definition.tourstops.len());
        let mut identifiers = FxHashSet::default();

        for (index, raw) in definition.tourstops.iter().enumerate() {
            let mut merged = Value::Object(Map::new());
            merge_settings(&mut merged, &definition.tourstop_shared);
            merge_settings(&mut merged, raw);

            let stop: StopSetting = serde_json::from_value(merged)
                .map_err(|source| ConfigError::InvalidStop { index, source })?;

            if let Some(identifier) = &stop.identifier {
                if !identifiers.insert(identifier.clone()) {
                    return Err(ConfigError::DuplicateIdentifier(identifier.clone()));
                }
            }
            stops.push(stop);
        }

        Ok(Self {
            name: definition.name,
            dom_names: definition.dom_names,
            interaction: definition.interaction,
            auto_activate: definition.auto_activate,
            rough_initial_loc: definition.rough_initial_loc,
            stops,
        })
    }

    /// Inactivity threshold for auto-activation; zero or absent disables it
    pub fn auto_activate_after(&self) -> Option<Duration> {
        self.auto_activate
            .as_ref()
            .and_then(|auto| auto.inactive_duration)
            .filter(|&ms| ms > 0)
            .map(Duration::from_millis)
    }

    /// Every taxon a stop targets, without duplicates, excluding the initial location
    pub fn target_ids(&self) -> Vec<TaxonId> {
        let mut seen = FxHashSet::default();
        self.stops
            .iter()
            .filter_map(|stop| stop.target_id)
            .filter(|&id| id != TaxonId::INITIAL_LOCATION && seen.insert(id))
            .collect()
    }
}

/// Deep-merge `overlay` into `base`: objects merge key by key, anything else replaces
pub fn merge_settings(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(existing) => merge_settings(existing, value),
                    None => {
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, overlay) => *base = overlay.clone(),
    }
}

fn deserialize_taxon<'de, D>(deserializer: D) -> Result<Option<TaxonId>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(deserialize_lenient_u64(deserializer)?.map(TaxonId))
}

fn deserialize_present_u64<'de, D>(deserializer: D) -> Result<Option<Option<u64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Some(deserialize_lenient_u64(deserializer)?))
}

/// Accept an integer, a float or a numeric string. Anything that is not a
/// usable non-negative number (null, "abc", -5, NaN) reads as `None`.
fn deserialize_lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct LenientVisitor;

    impl<'de> Visitor<'de> for LenientVisitor {
        type Value = Option<u64>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a number, a numeric string or null")
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Option<u64>, E> {
            Ok(Some(value))
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Option<u64>, E> {
            Ok(u64::try_from(value).ok())
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<Option<u64>, E> {
            if value.is_finite() && value >= 0.0 {
                Ok(Some(value as u64))
            } else {
                Ok(None)
            }
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Option<u64>, E> {
            match value.trim().parse::<f64>() {
                Ok(parsed) => self.visit_f64(parsed),
                Err(_) => Ok(None),
            }
        }

        fn visit_unit<E: de::Error>(self) -> Result<Option<u64>, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Option<u64>, E> {
            Ok(None)
        }

        fn visit_some<D2>(self, deserializer: D2) -> Result<Option<u64>, D2::Error>
        where
            D2: Deserializer<'de>,
        {
            deserializer.deserialize_any(LenientVisitor)
        }
    }

    deserializer.deserialize_any(LenientVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn setting(value: Value) -> TourSetting {
        TourSetting::from_json_str(&value.to_string()).unwrap()
    }

    #[test]
    fn test_shared_settings_deep_merge() {
        let tour = setting(json!({
            "tourstop_shared": {
                "stop_wait": 2000,
                "update_class": { "title": "Shared", "tour_play": { "text": "Play" } }
            },
            "tourstops": [
                { "ott": 91101, "update_class": { "title": "First" } },
                { "ott": "91102", "stop_wait": null }
            ]
        }));

        let first = &tour.stops[0];
        assert_eq!(first.target_id, Some(TaxonId(91101)));
        assert_eq!(first.stop_wait, Some(2000));
        assert_eq!(first.update_class["title"], ContentDirective::Html("First".to_string()));
        assert!(first.update_class.contains_key("tour_play"));

        // an explicit null in the stop overrides the shared value
        let second = &tour.stops[1];
        assert_eq!(second.target_id, Some(TaxonId(91102)));
        assert_eq!(second.stop_wait, None);
    }

    #[test]
    fn test_no_stops_rejected() {
        let err = TourSetting::from_json_str(r#"{ "tourstops": [] }"#).unwrap_err();
        assert!(matches!(err, ConfigError::NoStops));
    }

    #[test]
    fn test_duplicate_identifiers_rejected() {
        let err = TourSetting::from_json_str(
            r#"{ "tourstops": [ { "identifier": "a" }, { "identifier": "a" } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateIdentifier(id) if id == "a"));
    }

    #[test]
    fn test_invalid_stop_reports_index() {
        let err = TourSetting::from_json_str(
            r#"{ "tourstops": [ {}, { "transition_in": "teleport" } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidStop { index: 1, .. }));
    }

    #[test]
    fn test_lenient_millis() {
        let tour = setting(json!({
            "tourstops": [
                { "stop_wait": "1500", "transition_in_wait": 250.7 },
                { "stop_wait": "later" },
                { "stop_wait": -3 }
            ]
        }));
        assert_eq!(tour.stops[0].stop_wait, Some(1500));
        assert_eq!(tour.stops[0].transition_in_wait, Some(250));
        assert_eq!(tour.stops[1].stop_wait, None);
        assert_eq!(tour.stops[2].stop_wait, None);
    }

    #[test]
    fn test_wait_after_backward_override() {
        let tour = setting(json!({
            "tourstops": [
                { "stop_wait": 3000, "stop_wait_after_backward": null },
                { "stop_wait": 3000, "stop_wait_after_backward": 500 },
                { "stop_wait": 3000 }
            ]
        }));
        let forward = Direction::Forward;
        let backward = Direction::Backward;

        assert_eq!(tour.stops[0].wait_for(forward), Some(Duration::from_millis(3000)));
        assert_eq!(tour.stops[0].wait_for(backward), None);
        assert_eq!(tour.stops[1].wait_for(backward), Some(Duration::from_millis(500)));
        assert_eq!(tour.stops[2].wait_for(backward), Some(Duration::from_millis(3000)));
    }

    #[test]
    fn test_transitional_defaults_to_no_content() {
        let tour = setting(json!({
            "tourstops": [
                { "update_class": { "title": "Here" } },
                {},
                { "transitional": true, "update_class": { "title": "Passing" } }
            ]
        }));
        assert!(!tour.stops[0].is_transitional());
        assert!(tour.stops[1].is_transitional());
        assert!(tour.stops[2].is_transitional());
    }

    #[test]
    fn test_defaults_and_aliases() {
        let tour = setting(json!({
            "auto_activate": { "inactive_duration": "0" },
            "tour_stop_shared": { "fly_in_speed": 0 },
            "tour_stop": [ {} ]
        }));
        assert_eq!(tour.dom_names.next_class, "tour_next");
        assert_eq!(tour.interaction.effect, InteractionEffect::None);
        assert_eq!(tour.auto_activate_after(), None);
        assert_eq!(tour.stops[0].fly_speed(), 1.0);
        assert_eq!(tour.stops[0].transition_in, TransitionStyle::Fly);
    }

    #[test]
    fn test_target_ids_deduplicated() {
        let tour = setting(json!({
            "tourstops": [ { "ott": 5 }, { "ott": 0 }, { "ott": 5 }, { "ott": 7 }, {} ]
        }));
        assert_eq!(tour.target_ids(), vec![TaxonId(5), TaxonId(7)]);
    }
}
