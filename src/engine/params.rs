//! Tunable engine parameters and partial updates.

use std::f32::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};

use crate::analysis::angles::ExtractorMode;
use crate::analysis::integrator::MotionTuning;
use crate::analysis::remap::DisplayRotation;
use crate::config::AppConfig;

/// Ratio between the derived minimum speed and the internal max speed.
const MIN_SPEED_RATIO: f32 = 0.3;

/// Every tunable the engine reads while processing or reading out.
///
/// Values are not validated; a caller passing nonsense gets nonsense.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScrollParameters {
    pub tuning: MotionTuning,
    pub extractor: ExtractorMode,
    pub rotation: DisplayRotation,
    pub mirror: bool,
}

impl ScrollParameters {
    /// Parameters from config, applied verbatim.
    ///
    /// An explicit `min_speed` in the config wins over the max-speed
    /// derivation. An out-of-range rotation index falls back to 0.
    pub fn from_config(config: &AppConfig) -> Self {
        let scroll = &config.scroll;
        let rotation = DisplayRotation::from_index(config.display.rotation).unwrap_or_else(|| {
            log::warn!(
                "[ScrollEngine] Invalid rotation index {} in config, using 0",
                config.display.rotation
            );
            DisplayRotation::Rotation0
        });

        Self {
            tuning: MotionTuning {
                threshold: scroll.threshold,
                min_speed: scroll.min_speed,
                max_speed: scroll.max_speed / FRAC_PI_2,
                acceleration: scroll.acceleration,
                springness: scroll.springness,
            },
            extractor: config.display.extractor,
            rotation,
            mirror: config.display.mirror,
        }
    }

    /// Reachable top speed (internal value scaled by PI/2)
    pub fn max_speed(&self) -> f32 {
        self.tuning.max_speed * FRAC_PI_2
    }

    /// Set the reachable top speed.
    ///
    /// Also derives `min_speed = 0.3 * internal max speed`.
    pub fn set_max_speed(&mut self, max_speed: f32) {
        self.tuning.max_speed = max_speed / FRAC_PI_2;
        self.tuning.min_speed = MIN_SPEED_RATIO * self.tuning.max_speed;
    }
}

/// Patch describing parameter updates to apply to a running engine.
///
/// Fields are applied through the engine setters, so `max_speed` still
/// derives `min_speed` (an explicit `min_speed` in the same patch is applied
/// afterwards and wins) and `extractor` still resets calibration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamPatch {
    #[serde(default)]
    pub threshold: Option<f32>,
    #[serde(default)]
    pub max_speed: Option<f32>,
    #[serde(default)]
    pub min_speed: Option<f32>,
    #[serde(default)]
    pub acceleration: Option<f32>,
    #[serde(default)]
    pub springness: Option<f32>,
    #[serde(default)]
    pub rotation: Option<i32>,
    #[serde(default)]
    pub mirror: Option<bool>,
    #[serde(default)]
    pub extractor: Option<ExtractorMode>,
}

impl ParamPatch {
    pub fn is_empty(&self) -> bool {
        *self == ParamPatch::default()
    }
}
