//! Loading tour definitions from disk

use crate::domain::setting::{TourDefinition, TourSetting};
use anyhow::Context;
use std::fs;
use std::path::Path;

/// Read and validate a tour definition. `.toml` files are parsed as TOML,
/// everything else as JSON.
pub fn load_tour<P: AsRef<Path>>(path: P) -> anyhow::Result<TourSetting> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read tour file {}", path.display()))?;

    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    let definition: TourDefinition = if is_toml {
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse tour file {}", path.display()))?
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse tour file {}", path.display()))?
    };

    TourSetting::from_definition(definition)
        .with_context(|| format!("Invalid tour in {}", path.display()))
}
