use keylayout_engine::{KEY_UNIT, LayoutError, Result};
use serde::{Deserialize, Serialize};

/// Editor settings, stored as TOML by the host application.
///
/// Missing entries fall back to their defaults so older option files keep
/// loading after new settings are added.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EditorOptions {
    pub zoom_min: f64,
    pub zoom_max: f64,

    /// Number of undo snapshots kept before the oldest is dropped
    pub history_capacity: usize,

    pub grid_size: f64,
    pub show_grid: bool,
    pub snap_to_grid: bool,

    /// When set, moves use world axes even for rotated keys
    pub rotation_lock: bool,

    /// Quiet period before a text change is sent to the generation engine
    pub debounce_ms: u64,

    /// Offset applied to pasted keys, in millimeters
    pub paste_offset: f64,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            zoom_min: 0.1,
            zoom_max: 5.0,
            history_capacity: 50,
            grid_size: KEY_UNIT / 4.0,
            show_grid: true,
            snap_to_grid: false,
            rotation_lock: false,
            debounce_ms: 300,
            paste_offset: 1.0,
        }
    }
}

impl EditorOptions {
    pub fn from_toml_str(txt: &str) -> Result<Self> {
        let options: EditorOptions = toml::from_str(txt).map_err(|err| LayoutError::validation("options", err.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|err| LayoutError::Generic(format!("Failed to write options: {err}")))
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.zoom_min > 0.0 && self.zoom_min <= self.zoom_max) {
            return Err(LayoutError::validation("zoom_min", format!("{} must be positive and not above zoom_max {}", self.zoom_min, self.zoom_max)));
        }
        if self.history_capacity == 0 {
            return Err(LayoutError::validation("history_capacity", "must be at least 1"));
        }
        if self.grid_size <= 0.0 {
            return Err(LayoutError::validation("grid_size", "must be positive"));
        }
        Ok(())
    }

    /// Limits `zoom` to the configured range. Options that skipped
    /// [`EditorOptions::validate`] may have `zoom_min > zoom_max`; then
    /// `zoom_max` wins.
    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        zoom.max(self.zoom_min).min(self.zoom_max)
    }
}
