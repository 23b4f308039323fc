//! Configuration management for scroll tuning
//!
//! This module provides runtime configuration loading from JSON files,
//! so the response curve can be tuned on a device without recompiling.
//! Every section and field falls back to its default when absent.

use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_PI_2;
use std::fs;
use std::path::Path;

use crate::analysis::angles::ExtractorMode;
use crate::analysis::smoother::DEFAULT_HISTORY_SIZE;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub scroll: ScrollConfig,
    pub smoothing: SmoothingConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    /// Deadzone in radians
    pub threshold: f32,
    pub min_speed: f32,
    /// Reachable top speed, as returned by `ScrollEngine::max_speed`
    pub max_speed: f32,
    pub acceleration: f32,
    pub springness: f32,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            min_speed: 30.0,
            // Internal value 100, scaled by PI/2
            max_speed: 100.0 * FRAC_PI_2,
            acceleration: 1.0,
            springness: 1.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    pub history_size: usize,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            history_size: DEFAULT_HISTORY_SIZE,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Host rotation index, 0..=3
    pub rotation: i32,
    pub mirror: bool,
    pub extractor: ExtractorMode,
}

impl AppConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    #[cfg(target_os = "android")]
    pub fn load_android() -> Self {
        // Assets live inside the APK and need the AssetManager; the bridge
        // passes no handle to it, so Android runs with defaults.
        log::info!("[Config] Using default configuration on Android");
        Self::default()
    }

    #[cfg(not(target_os = "android"))]
    pub fn load() -> Self {
        Self::load_from_file("assets/tilt_config.json")
    }

    /// Platform default loader
    pub fn load_platform() -> Self {
        #[cfg(target_os = "android")]
        {
            Self::load_android()
        }

        #[cfg(not(target_os = "android"))]
        {
            Self::load()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.scroll.threshold, 0.1);
        assert_eq!(config.scroll.min_speed, 30.0);
        assert!((config.scroll.max_speed - 157.0796).abs() < 1e-3);
        assert_eq!(config.smoothing.history_size, 2);
        assert_eq!(config.display.rotation, 0);
        assert!(!config.display.mirror);
        assert_eq!(config.display.extractor, ExtractorMode::GravityAngle);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "scroll": { "threshold": 0.05 }, "display": { "extractor": "orientation_fusion" } }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.scroll.threshold, 0.05);
        assert_eq!(config.scroll.springness, 1.5);
        assert_eq!(config.smoothing.history_size, 2);
        assert_eq!(config.display.extractor, ExtractorMode::OrientationFusion);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = AppConfig::load_from_file("definitely/not/here/tilt_config.json");
        assert_eq!(config.scroll.min_speed, 30.0);
    }

    #[test]
    fn test_malformed_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join(format!(
            "tilt_config_malformed_{}.json",
            std::process::id()
        ));
        fs::write(&path, "{ not json").unwrap();

        let config = AppConfig::load_from_file(&path);
        assert_eq!(config.smoothing.history_size, 2);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_json_roundtrip() {
        let mut config = AppConfig::default();
        config.display.rotation = 3;
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.display.rotation, 3);
        assert_eq!(parsed.scroll.max_speed, config.scroll.max_speed);
    }
}
