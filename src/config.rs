//! Application configuration.
//!
//! The configuration is loaded from a JSON file
//! (`$XDG_CONFIG_HOME/scalegrid/config.json`).  The top-level schema uses
//! a `"scale"` key for the overview itself and a `"headless"` key for the
//! in-memory host the daemon drives, so the file can grow new sections
//! without breaking older ones.
//!
//! # Example
//!
//! ```json
//! {
//!   "scale": {
//!     "spacing": 40,
//!     "interact": false,
//!     "middle_click_close": true,
//!     "inactive_alpha": 0.6,
//!     "allow_zoom": false,
//!     "duration_ms": 500,
//!     "easing": "ease-out"
//!   },
//!   "headless": {
//!     "width": 1920,
//!     "height": 1080,
//!     "windows": [
//!       { "x": 100, "y": 100, "width": 800, "height": 600 },
//!       { "x": 300, "y": 250, "width": 300, "height": 200, "parent": 0 }
//!     ]
//!   }
//! }
//! ```

use crate::bezier::Easing;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level configuration.
///
/// Every field is optional: a minimal `{}` file is valid and all sections
/// fall back to their compiled-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Overview behaviour.
    #[serde(default)]
    pub scale: ScaleConfig,

    /// Output and seed windows for the headless host.
    #[serde(default)]
    pub headless: HeadlessConfig,
}

/// Overview behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleConfig {
    /// Gap around and between grid cells, in pixels.
    pub spacing: u32,
    /// Pass input through to the scaled windows instead of grabbing it.
    /// Clicks still focus; they just don't end the overview.
    pub interact: bool,
    /// Middle-clicking a window closes it.
    pub middle_click_close: bool,
    /// Opacity of unfocused windows, `0.0..=1.0`.
    pub inactive_alpha: f64,
    /// Allow windows smaller than their cell to be scaled up.
    pub allow_zoom: bool,
    /// Duration of the scale / translate animation (ms).
    pub duration_ms: u64,
    /// Duration of the opacity animation (ms).
    pub fade_duration_ms: u64,
    /// Easing curve for every animation.
    pub easing: Easing,
    /// Binding that toggles the overview for the current workspace.
    pub toggle: String,
    /// Binding that toggles the overview for all workspaces.
    pub toggle_all: String,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            spacing: 50,
            interact: false,
            middle_click_close: false,
            inactive_alpha: 0.75,
            allow_zoom: false,
            duration_ms: 750,
            fade_duration_ms: 1000,
            easing: Easing::Ease,
            toggle: "<super> KEY_P".into(),
            toggle_all: String::new(),
        }
    }
}

impl ScaleConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    pub fn fade_duration(&self) -> Duration {
        Duration::from_millis(self.fade_duration_ms)
    }

    /// `inactive_alpha` clamped into `0.0..=1.0` (NaN counts as opaque).
    pub fn inactive_alpha(&self) -> f64 {
        if self.inactive_alpha.is_nan() {
            1.0
        } else {
            self.inactive_alpha.clamp(0.0, 1.0)
        }
    }
}

/// Output and seed windows for the headless host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadlessConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Columns of the workspace grid.
    pub workspace_cols: u32,
    /// Rows of the workspace grid.
    pub workspace_rows: u32,
    /// Windows mapped at start-up, in order.
    pub windows: Vec<SeedWindow>,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            workspace_cols: 3,
            workspace_rows: 3,
            windows: Vec::new(),
        }
    }
}

/// A window mapped at start-up.  Coordinates are absolute on the
/// workspace plane (`x >= width` lies on the next workspace to the right).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedWindow {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Index of an earlier entry in `windows` this one is a transient of.
    #[serde(default)]
    pub parent: Option<usize>,
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))?;
        Ok(config)
    }
}

/// Error from loading or parsing a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_full_config() {
        let json = r#"{
            "scale": {
                "spacing": 40,
                "interact": true,
                "middle_click_close": true,
                "inactive_alpha": 0.5,
                "allow_zoom": true,
                "duration_ms": 300,
                "fade_duration_ms": 200,
                "easing": "linear",
                "toggle": "<super> KEY_S",
                "toggle_all": "<super> <shift> KEY_S"
            },
            "headless": {
                "width": 1280,
                "height": 720,
                "workspace_cols": 2,
                "workspace_rows": 1,
                "windows": [
                    { "x": 0, "y": 0, "width": 640, "height": 480 },
                    { "x": 10, "y": 10, "width": 100, "height": 50, "parent": 0 }
                ]
            }
        }"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.scale.spacing, 40);
        assert!(cfg.scale.interact);
        assert!(cfg.scale.middle_click_close);
        assert_eq!(cfg.scale.inactive_alpha, 0.5);
        assert!(cfg.scale.allow_zoom);
        assert_eq!(cfg.scale.duration(), Duration::from_millis(300));
        assert_eq!(cfg.scale.fade_duration(), Duration::from_millis(200));
        assert_eq!(cfg.scale.easing, Easing::Linear);
        assert_eq!(cfg.scale.toggle_all, "<super> <shift> KEY_S");
        assert_eq!(cfg.headless.width, 1280);
        assert_eq!(cfg.headless.workspace_cols, 2);
        assert_eq!(cfg.headless.windows.len(), 2);
        assert_eq!(cfg.headless.windows[1].parent, Some(0));
    }

    #[test]
    fn deserialize_empty_uses_defaults() {
        let cfg: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.scale, ScaleConfig::default());
        assert_eq!(cfg.headless, HeadlessConfig::default());
    }

    #[test]
    fn deserialize_partial_scale() {
        let cfg: Config = serde_json::from_str(r#"{ "scale": { "spacing": 10 } }"#).unwrap();
        assert_eq!(cfg.scale.spacing, 10);
        let d = ScaleConfig::default();
        assert_eq!(cfg.scale.duration_ms, d.duration_ms);
        assert_eq!(cfg.scale.inactive_alpha, d.inactive_alpha);
    }

    #[test]
    fn inactive_alpha_is_clamped() {
        let mut c = ScaleConfig {
            inactive_alpha: 1.7,
            ..ScaleConfig::default()
        };
        assert_eq!(c.inactive_alpha(), 1.0);
        c.inactive_alpha = -0.2;
        assert_eq!(c.inactive_alpha(), 0.0);
        c.inactive_alpha = f64::NAN;
        assert_eq!(c.inactive_alpha(), 1.0);
    }

    #[test]
    fn unknown_top_level_keys_ignored() {
        let json = r#"{ "scale": {}, "future_section": { "key": 42 } }"#;
        let _cfg: Config = serde_json::from_str(json).unwrap();
    }

    #[test]
    fn load_reports_missing_file() {
        let path = std::env::temp_dir().join("scalegrid-test-does-not-exist.json");
        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().starts_with("config error: failed to read"));
    }
}
