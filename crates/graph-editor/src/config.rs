//! Editor configuration
//!
//! Handles node layout constants, drop snapping and palette input rules.
//! Every field has a default so partial JSON files are accepted.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::Point;

/// Pixel dimensions used to lay out nodes and their ports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    /// Width of a node before the renderer reports a measured width
    pub default_width: i32,
    pub min_width: i32,
    pub min_height: i32,
    /// Side length of a port's hit square
    pub port_size: i32,
    /// Vertical distance between consecutive ports
    pub port_spacing: i32,
    /// Padding added around a node for invalidation rectangles
    pub bounds_margin: i32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            default_width: 90,
            min_width: 60,
            min_height: 30,
            port_size: 10,
            port_spacing: 15,
            bounds_margin: 8,
        }
    }
}

impl LayoutConfig {
    pub fn port_half_size(&self) -> i32 {
        self.port_size / 2
    }
}

/// Input rules for the add-node palette
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PaletteConfig {
    /// Punctuation accepted in addition to ASCII letters and digits
    pub extra_characters: String,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            extra_characters: " ._-/".to_string(),
        }
    }
}

impl PaletteConfig {
    /// Whether a typed character may be appended to the search text
    pub fn accepts(&self, c: char) -> bool {
        c.is_ascii_alphanumeric() || self.extra_characters.contains(c)
    }
}

/// Top-level editor configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    pub layout: LayoutConfig,
    /// Round node positions to the grid when a drag ends
    pub snap_to_grid: bool,
    pub grid_spacing: i32,
    /// Where nodes are placed when the caller gives no position
    pub default_node_position: Point,
    pub palette: PaletteConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            snap_to_grid: false,
            grid_spacing: 15,
            default_node_position: Point::new(0, 0),
            palette: PaletteConfig::default(),
        }
    }
}

impl EditorConfig {
    /// Parse a configuration from JSON, filling missing fields with defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration file
    ///
    /// A missing file yields the default configuration.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("No editor config at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&content)?;
        log::info!("Loaded editor config from {:?}", path);
        Ok(config)
    }

    /// Serialize the configuration as pretty JSON
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
