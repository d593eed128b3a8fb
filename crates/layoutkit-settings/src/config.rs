//! Configuration and settings management for LayoutKit
//!
//! Provides configuration file handling, settings management, and validation.
//! Supports JSON and TOML file formats stored in platform-specific directories.
//!
//! Configuration is organized into logical sections:
//! - History (undo ring capacity)
//! - Validation (geometry validator limits)
//! - Editing (handle sizes, drag grace, default band shape, tolerances)
//! - Viewport (initial fit, zoom limits)

use crate::error::{ConfigError, SettingsError, SettingsResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How the viewport fits the page content into its container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Keep the current view rectangle
    #[default]
    None,
    /// Content width fills the container width
    Width,
    /// Content height fills the container height
    Height,
    /// Whole content visible
    Page,
}

impl std::fmt::Display for FitMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Width => write!(f, "width"),
            Self::Height => write!(f, "height"),
            Self::Page => write!(f, "page"),
        }
    }
}

/// Undo history settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    /// Maximum number of snapshots kept in the ring buffer
    pub capacity: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self { capacity: 50 }
    }
}

/// Geometry validator limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationSettings {
    /// Require every point to lie inside the parent element's polygon
    pub fully_in_parent: bool,
    /// Minimum bounding box width for finished shapes
    pub min_width: f64,
    /// Minimum bounding box height for finished polygons
    pub min_height: f64,
    /// Maximum turn, in degrees, between consecutive baseline segments
    pub max_angle_change: f64,
    /// Allowed direction range, in degrees, of the first baseline segment
    pub first_segment_angle: Option<[f64; 2]>,
    /// Minimum total baseline length
    pub min_baseline_length: f64,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            fully_in_parent: false,
            min_width: 2.0,
            min_height: 2.0,
            max_angle_change: 90.0,
            first_segment_angle: None,
            min_baseline_length: 5.0,
        }
    }
}

/// Interactive editing settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditingSettings {
    /// Radius, in screen pixels, of vertex and grid handles
    pub handle_radius: f64,
    /// Two clicks closer than this, in document units, finish a drawing
    pub close_tolerance: f64,
    /// Clicks within this many milliseconds after a drag are ignored
    pub drag_grace_ms: u64,
    /// Band height used for newly drawn text lines
    pub default_line_height: f64,
    /// Band offset used for newly drawn text lines
    pub default_line_offset: f64,
    /// Absolute tolerance of the rectangular band check
    pub rect_tolerance: f64,
    /// Absolute tolerance of the table grid check
    pub grid_tolerance: f64,
}

impl Default for EditingSettings {
    fn default() -> Self {
        Self {
            handle_radius: 6.0,
            close_tolerance: 2.0,
            drag_grace_ms: 150,
            default_line_height: 30.0,
            default_line_offset: 0.25,
            rect_tolerance: 1.0,
            grid_tolerance: 1.0,
        }
    }
}

/// Viewport settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportSettings {
    /// Fit mode applied when a document is opened
    pub default_fit: FitMode,
    /// Smallest allowed zoom factor
    pub min_zoom: f64,
    /// Largest allowed zoom factor
    pub max_zoom: f64,
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            default_fit: FitMode::Page,
            min_zoom: 0.05,
            max_zoom: 40.0,
        }
    }
}

/// Complete application configuration
///
/// Aggregates all settings sections and provides file I/O operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Undo history
    pub history: HistorySettings,
    /// Geometry validators
    pub validation: ValidationSettings,
    /// Interactive editing
    pub editing: EditingSettings,
    /// Viewport
    pub viewport: ViewportSettings,
}

enum Format {
    Json,
    Toml,
}

fn format_of(path: &Path) -> SettingsResult<Format> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(Format::Json),
        Some("toml") => Ok(Format::Toml),
        other => Err(ConfigError::UnsupportedFormat(other.unwrap_or("").to_string()).into()),
    }
}

fn out_of_range(key: &str, value: impl ToString) -> SettingsError {
    ConfigError::ValueOutOfRange {
        key: key.to_string(),
        value: value.to_string(),
    }
    .into()
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Platform config location: `<config_dir>/layoutkit/config.toml`
    pub fn default_path() -> SettingsResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("layoutkit").join("config.toml"))
            .ok_or_else(|| {
                SettingsError::ConfigDirectory("no platform config directory".to_string())
            })
    }

    /// Load the config at [`Config::default_path`], falling back to defaults when absent
    pub fn load_or_default() -> SettingsResult<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from_file(&path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = format_of(path)?;
        let content = std::fs::read_to_string(path).map_err(|e| {
            SettingsError::LoadError(format!("{}: {}", path.display(), e))
        })?;

        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match format_of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    SettingsError::ConfigDirectory(format!("{}: {}", parent.display(), e))
                })?;
            }
        }

        std::fs::write(path, content)
            .map_err(|e| SettingsError::SaveError(format!("{}: {}", path.display(), e)))?;

        tracing::info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        if self.history.capacity == 0 {
            return Err(out_of_range("history.capacity", self.history.capacity));
        }

        let v = &self.validation;
        if v.min_width < 0.0 || !v.min_width.is_finite() {
            return Err(out_of_range("validation.min_width", v.min_width));
        }
        if v.min_height < 0.0 || !v.min_height.is_finite() {
            return Err(out_of_range("validation.min_height", v.min_height));
        }
        if !(0.0..=180.0).contains(&v.max_angle_change) {
            return Err(out_of_range(
                "validation.max_angle_change",
                v.max_angle_change,
            ));
        }
        if let Some([min, max]) = v.first_segment_angle {
            if min > max {
                return Err(ConfigError::Inconsistent {
                    first: "validation.first_segment_angle[0]".to_string(),
                    second: "validation.first_segment_angle[1]".to_string(),
                    reason: format!("{} > {}", min, max),
                }
                .into());
            }
        }
        if v.min_baseline_length < 0.0 {
            return Err(out_of_range(
                "validation.min_baseline_length",
                v.min_baseline_length,
            ));
        }

        let e = &self.editing;
        if e.handle_radius <= 0.0 {
            return Err(out_of_range("editing.handle_radius", e.handle_radius));
        }
        if e.close_tolerance < 0.0 {
            return Err(out_of_range("editing.close_tolerance", e.close_tolerance));
        }
        if e.default_line_height <= 0.0 {
            return Err(out_of_range(
                "editing.default_line_height",
                e.default_line_height,
            ));
        }
        if !(0.0..=0.5).contains(&e.default_line_offset) {
            return Err(out_of_range(
                "editing.default_line_offset",
                e.default_line_offset,
            ));
        }
        if e.rect_tolerance < 0.0 {
            return Err(out_of_range("editing.rect_tolerance", e.rect_tolerance));
        }
        if e.grid_tolerance < 0.0 {
            return Err(out_of_range("editing.grid_tolerance", e.grid_tolerance));
        }

        let vp = &self.viewport;
        if vp.min_zoom <= 0.0 {
            return Err(out_of_range("viewport.min_zoom", vp.min_zoom));
        }
        if vp.max_zoom < vp.min_zoom {
            return Err(ConfigError::Inconsistent {
                first: "viewport.min_zoom".to_string(),
                second: "viewport.max_zoom".to_string(),
                reason: format!("{} > {}", vp.min_zoom, vp.max_zoom),
            }
            .into());
        }

        Ok(())
    }

    /// Merge another config into this one, taking every section that differs from the defaults
    pub fn merge(&mut self, other: &Config) {
        let defaults = Config::default();
        if other.history != defaults.history {
            self.history = other.history.clone();
        }
        if other.validation != defaults.validation {
            self.validation = other.validation.clone();
        }
        if other.editing != defaults.editing {
            self.editing = other.editing.clone();
        }
        if other.viewport != defaults.viewport {
            self.viewport = other.viewport.clone();
        }
    }
}
