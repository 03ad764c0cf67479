//! Persistent settings for the dashboard app.

use crate::graph::{AnimationConfig, LayoutConfig, View};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All persistable UI settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    // View
    #[serde(default = "default_view")]
    pub view: View,
    #[serde(default = "default_show_labels")]
    pub show_labels: bool,

    // Feed
    #[serde(default)]
    pub entities_path: Option<PathBuf>,
    #[serde(default)]
    pub health_path: Option<PathBuf>,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: f32,

    // Topology
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub animation: AnimationConfig,
}

fn default_view() -> View {
    View::Graph
}

fn default_show_labels() -> bool {
    true
}

fn default_poll_interval_secs() -> f32 {
    10.0
}

/// Polls faster than this are clamped
const MIN_POLL_INTERVAL_SECS: f32 = 1.0;

impl Default for Settings {
    fn default() -> Self {
        Self {
            view: default_view(),
            show_labels: true,
            entities_path: None,
            health_path: None,
            poll_interval_secs: default_poll_interval_secs(),
            layout: LayoutConfig::default(),
            animation: AnimationConfig::default(),
        }
    }
}

impl Settings {
    /// Get the path to the settings file
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("status-topology");
            p.push("settings.json");
            p
        })
    }

    pub fn poll_interval(&self) -> std::time::Duration {
        Self::poll_interval_from(self.poll_interval_secs)
    }

    /// Poll interval for `secs`, clamped to the minimum
    pub fn poll_interval_from(secs: f32) -> std::time::Duration {
        std::time::Duration::from_secs_f32(secs.max(MIN_POLL_INTERVAL_SECS))
    }

    /// Load settings from disk, returning defaults if file doesn't exist or is invalid
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            tracing::warn!("Could not determine config directory, using defaults");
            return Self::default();
        };
        Self::load_from(&path)
    }

    pub fn load_from(path: &std::path::Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(settings) => {
                    tracing::info!("Loaded settings from {:?}", path);
                    settings
                }
                Err(e) => {
                    tracing::warn!("Failed to parse settings file: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(_) => {
                // File doesn't exist yet, that's fine
                Self::default()
            }
        }
    }

    /// Save settings to disk
    pub fn save(&self) {
        let Some(path) = Self::config_path() else {
            tracing::warn!("Could not determine config directory, settings not saved");
            return;
        };
        self.save_to(&path);
    }

    pub fn save_to(&self, path: &std::path::Path) {
        // Ensure config directory exists
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!("Failed to create config directory: {}", e);
                return;
            }
        }

        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = std::fs::write(path, json) {
                    tracing::warn!("Failed to write settings file: {}", e);
                } else {
                    tracing::debug!("Saved settings to {:?}", path);
                }
            }
            Err(e) => {
                tracing::warn!("Failed to serialize settings: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let mut settings = Settings::default();
        settings.view = View::List;
        settings.layout.min_radius = 200.0;
        settings.save_to(&path);
        assert_eq!(Settings::load_from(&path), settings);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"view": "list", "layout": {"zigzag_delta": 10.0}}"#).unwrap();
        let settings = Settings::load_from(&path);
        assert_eq!(settings.view, View::List);
        assert_eq!(settings.layout.zigzag_delta, 10.0);
        assert_eq!(settings.layout.min_radius, LayoutConfig::default().min_radius);
        assert!(settings.show_labels);
        assert_eq!(settings.poll_interval_secs, 10.0);
    }

    #[test]
    fn test_garbage_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not json").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
    }

    #[test]
    fn test_poll_interval_is_clamped() {
        let settings = Settings { poll_interval_secs: 0.0, ..Settings::default() };
        assert_eq!(settings.poll_interval(), std::time::Duration::from_secs(1));
    }
}
