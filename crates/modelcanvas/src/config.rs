use std::path::Path;

use anyhow::{Context, Result};
use modelcanvas_layout::{GroupSizingConfig, LayoutStyle, PlacementConfig, RoutingConfig};
use modelcanvas_sync::{AutoSaveConfig, HistoryConfig};
use serde::Deserialize;

/// Every tunable of an editing session. Missing tables and keys fall back to
/// their defaults, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub history: HistoryConfig,
    pub autosave: AutoSaveConfig,
    pub placement: PlacementConfig,
    pub sizing: GroupSizingConfig,
    pub routing: RoutingConfig,
    pub layout: LayoutStyle,
}

impl CanvasConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid canvas configuration")
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("in {}", path.display()))
    }
}
