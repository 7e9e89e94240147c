//! Player configuration loaded from TOML
//!
//! Config file is selected via:
//! 1. --config <path> command line argument
//! 2. TOUR_PLAYER_CONFIG environment variable
//! 3. Default: config/dev.toml

use crate::domain::types::{NodeId, TaxonId};
use anyhow::Context;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Deserialize)]
pub struct TourConfig {
    /// Tour definition (JSON, or TOML by extension)
    pub file: String,
    /// Start the tour as soon as the player is up
    #[serde(default)]
    pub autostart: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    /// Flight duration at speed 1.0
    #[serde(default = "default_flight_ms")]
    pub flight_ms: u64,
    /// Fail every n-th flight (0 never fails)
    #[serde(default)]
    pub fail_every: u64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            flight_ms: default_flight_ms(),
            fail_every: 0,
        }
    }
}

fn default_flight_ms() -> u64 {
    2000
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ResolverConfig {
    /// Simulated lookup latency
    #[serde(default)]
    pub latency_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_interval")]
    pub interval_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_metrics_interval(),
        }
    }
}

fn default_metrics_interval() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    pub tour: TourConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    /// Taxon id (as a string key) to tree node id
    #[serde(default)]
    pub targets: BTreeMap<String, i64>,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Main configuration struct used by the player
#[derive(Debug, Clone)]
pub struct Config {
    tour_file: String,
    autostart: bool,
    flight_ms: u64,
    fail_every: u64,
    resolver_latency_ms: u64,
    targets: FxHashMap<TaxonId, NodeId>,
    metrics_interval_secs: u64,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tour_file: "tours/demo.json".to_string(),
            autostart: false,
            flight_ms: default_flight_ms(),
            fail_every: 0,
            resolver_latency_ms: 0,
            targets: FxHashMap::default(),
            metrics_interval_secs: default_metrics_interval(),
            config_file: "default".to_string(),
        }
    }
}

impl Config {
    /// Determine config file path from the command line or environment
    pub fn resolve_config_path(cli_path: Option<&str>) -> String {
        if let Some(path) = cli_path {
            return path.to_string();
        }

        if let Ok(path) = env::var("TOUR_PLAYER_CONFIG") {
            return path;
        }

        "config/dev.toml".to_string()
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        // Taxon ids arrive as string keys
        let mut targets = FxHashMap::default();
        for (key, node) in toml_config.targets {
            match key.parse::<u64>() {
                Ok(taxon) => {
                    targets.insert(TaxonId(taxon), NodeId(node));
                }
                Err(_) => warn!(key = %key, "config_target_key_invalid"),
            }
        }

        // A relative tour file is relative to the config file
        let tour_file = match path.parent() {
            Some(dir) if Path::new(&toml_config.tour.file).is_relative() => {
                dir.join(&toml_config.tour.file).display().to_string()
            }
            _ => toml_config.tour.file,
        };

        Ok(Self {
            tour_file,
            autostart: toml_config.tour.autostart,
            flight_ms: toml_config.camera.flight_ms,
            fail_every: toml_config.camera.fail_every,
            resolver_latency_ms: toml_config.resolver.latency_ms,
            targets,
            metrics_interval_secs: toml_config.metrics.interval_secs,
            config_file: path.display().to_string(),
        })
    }

    /// Load from the resolved path, falling back to defaults
    pub fn load(cli_path: Option<&str>) -> Self {
        Self::load_from_path(&Self::resolve_config_path(cli_path))
    }

    pub fn load_from_path(path: &str) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %format!("{e:#}"), "config_load_failed_using_defaults");
                Self::default()
            }
        }
    }

    pub fn tour_file(&self) -> &str {
        &self.tour_file
    }

    pub fn autostart(&self) -> bool {
        self.autostart
    }

    pub fn flight_ms(&self) -> u64 {
        self.flight_ms
    }

    pub fn fail_every(&self) -> u64 {
        self.fail_every
    }

    pub fn resolver_latency_ms(&self) -> u64 {
        self.resolver_latency_ms
    }

    pub fn targets(&self) -> &FxHashMap<TaxonId, NodeId> {
        &self.targets
    }

    pub fn metrics_interval_secs(&self) -> u64 {
        self.metrics_interval_secs
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    /// Builder method for the command line `--autostart` flag
    pub fn with_autostart(mut self, autostart: bool) -> Self {
        self.autostart = self.autostart || autostart;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.tour_file(), "tours/demo.json");
        assert!(!config.autostart());
        assert_eq!(config.flight_ms(), 2000);
        assert_eq!(config.fail_every(), 0);
        assert_eq!(config.metrics_interval_secs(), 30);
        assert!(config.targets().is_empty());
    }

    #[test]
    fn test_resolve_config_path_from_cli() {
        assert_eq!(
            Config::resolve_config_path(Some("config/kiosk.toml")),
            "config/kiosk.toml"
        );
    }

    #[test]
    fn test_autostart_flag_only_enables() {
        let config = Config::default().with_autostart(true).with_autostart(false);
        assert!(config.autostart());
    }
}
