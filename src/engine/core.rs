//! ScrollEngine: thread-safe facade over the tilt pipeline.
//!
//! One producer pushes sensor samples while any number of readers drain
//! movement, read speed, or tune parameters. All mutable state lives in a
//! single `ScrollState` behind one mutex, so a drain can never observe a
//! half-applied sample. A poisoned lock surfaces as an error value.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::analysis::angles::ExtractorMode;
use crate::analysis::remap::DisplayRotation;
use crate::analysis::smoother::DEFAULT_HISTORY_SIZE;
use crate::analysis::types::{AccelSample, AnglePair, MagneticSample, ScrollVector};
use crate::config::AppConfig;
use crate::engine::listener::SensorListener;
use crate::engine::params::{ParamPatch, ScrollParameters};
use crate::engine::state::{SampleOutcome, ScrollState};
use crate::error::{
    log_calibration_error, log_sensor_error, CalibrationError, ErrorCode, SensorError,
};
use crate::telemetry::{self, CalibrationTrigger};

/// Name reported in `SensorError::LockPoisoned`
const STATE_COMPONENT: &str = "ScrollState";

/// ScrollEngine turns accelerometer samples into scroll speed and movement.
///
/// Cloning is cheap and yields a handle to the same engine.
#[derive(Clone)]
pub struct ScrollEngine {
    state: Arc<Mutex<ScrollState>>,
}

impl ScrollEngine {
    /// Create an engine with default parameters and history size.
    pub fn new() -> Self {
        Self::with_history_size(DEFAULT_HISTORY_SIZE)
    }

    /// Create an engine averaging `history_size` samples (0 is raised to 1).
    pub fn with_history_size(history_size: usize) -> Self {
        Self::from_parts(history_size, ScrollParameters::default())
    }

    /// Create an engine with every value taken from `config`.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::from_parts(
            config.smoothing.history_size,
            ScrollParameters::from_config(config),
        )
    }

    fn from_parts(history_size: usize, params: ScrollParameters) -> Self {
        log::debug!(
            "[ScrollEngine] Created: history_size={}, extractor={}, rotation={}",
            history_size,
            params.extractor.as_str(),
            params.rotation.degrees()
        );
        Self {
            state: Arc::new(Mutex::new(ScrollState::new(history_size, params))),
        }
    }

    // ========================================================================
    // SAMPLE INGESTION
    // ========================================================================

    /// Process one accelerometer sample.
    ///
    /// # Errors
    /// - `NonFiniteSample`: sample rejected before buffering
    /// - `DegenerateOrientation`: no pose for this sample; motion unchanged
    /// - `LockPoisoned`: engine state mutex was poisoned
    pub fn on_sample(&self, sample: AccelSample) -> Result<(), SensorError> {
        let (result, was_degenerate) = {
            let mut state = self.lock_state()?;
            let was_degenerate = state.is_degenerate_run();
            (state.on_sample(&sample), was_degenerate)
        };

        match &result {
            Ok(SampleOutcome::Calibrated(reference)) => {
                tracing::info!(
                    "[ScrollEngine] Calibrated on warm-up: vertical={:.4}, horizontal={:.4}",
                    reference.vertical,
                    reference.horizontal
                );
                telemetry::hub().record_calibration(reference, CalibrationTrigger::WarmUp);
            }
            Ok(SampleOutcome::WarmingUp {
                collected,
                required,
            }) => {
                log::trace!("[ScrollEngine] Warming up: {}/{}", collected, required);
            }
            Ok(SampleOutcome::Integrated) => {}
            Err(err @ SensorError::NonFiniteSample) => {
                log_sensor_error(err, "on_sample");
                telemetry::hub().record_rejected_sample();
            }
            Err(err @ SensorError::DegenerateOrientation) => {
                if was_degenerate {
                    log::trace!("[ScrollEngine] Pose still degenerate");
                } else {
                    log_sensor_error(err, "on_sample");
                    telemetry::hub().record_degenerate_pose();
                }
            }
            Err(err) => log_sensor_error(err, "on_sample"),
        }

        result.map(|_| ())
    }

    /// Replace the retained magnetometer reading.
    pub fn on_magnetic_sample(&self, sample: MagneticSample) -> Result<(), SensorError> {
        self.lock_state()?.on_magnetic_sample(&sample);
        Ok(())
    }

    // ========================================================================
    // CALIBRATION
    // ========================================================================

    /// Capture the current pose as the new reference and zero all motion.
    ///
    /// # Errors
    /// - `NotReady`: fewer than `history_size` samples seen
    /// - `DegenerateOrientation`: current average has no pose
    /// - `StatePoisoned`: engine state mutex was poisoned
    ///
    /// Calibration is left untouched on any error.
    pub fn reset_state(&self) -> Result<(), CalibrationError> {
        let result = self.lock_for_calibration()?.reset();
        self.report_reset(&result, CalibrationTrigger::Reset);
        result.map(|_| ())
    }

    pub fn is_calibrated(&self) -> Result<bool, SensorError> {
        self.read(|state| state.calibration().is_calibrated)
    }

    fn report_reset(
        &self,
        result: &Result<AnglePair, CalibrationError>,
        trigger: CalibrationTrigger,
    ) {
        match result {
            Ok(reference) => {
                tracing::info!(
                    "[ScrollEngine] Reference captured ({:?}): vertical={:.4}, horizontal={:.4}",
                    trigger,
                    reference.vertical,
                    reference.horizontal
                );
                telemetry::hub().record_calibration(reference, trigger);
            }
            Err(err) => {
                log_calibration_error(err, "reset_state");
                telemetry::hub().record_reset_rejected(err.code());
            }
        }
    }

    // ========================================================================
    // READ-OUT
    // ========================================================================

    /// Drain accumulated displacement, remapped for display rotation and the
    /// stored mirror flag.
    pub fn get_movement(&self) -> Result<ScrollVector, SensorError> {
        Ok(self.lock_state()?.take_movement(None))
    }

    /// Drain accumulated displacement, mirroring for the input-device
    /// emulator when `use_emulator` is set.
    pub fn get_movement_with_emulator(
        &self,
        use_emulator: bool,
    ) -> Result<ScrollVector, SensorError> {
        Ok(self.lock_state()?.take_movement(Some(use_emulator)))
    }

    /// Current speed. Not drained and not remapped.
    pub fn get_speed(&self) -> Result<ScrollVector, SensorError> {
        self.read(|state| state.speed())
    }

    // ========================================================================
    // PARAMETERS
    // ========================================================================

    pub fn parameters(&self) -> Result<ScrollParameters, SensorError> {
        self.read(|state| *state.params())
    }

    pub fn history_size(&self) -> Result<usize, SensorError> {
        self.read(|state| state.history_size())
    }

    pub fn threshold(&self) -> Result<f32, SensorError> {
        self.read(|state| state.params().tuning.threshold)
    }

    pub fn set_threshold(&self, threshold: f32) -> Result<(), SensorError> {
        self.write(|state| state.params_mut().tuning.threshold = threshold)
    }

    pub fn min_speed(&self) -> Result<f32, SensorError> {
        self.read(|state| state.params().tuning.min_speed)
    }

    pub fn set_min_speed(&self, min_speed: f32) -> Result<(), SensorError> {
        self.write(|state| state.params_mut().tuning.min_speed = min_speed)
    }

    /// Reachable top speed; the stored value scaled by PI/2.
    pub fn max_speed(&self) -> Result<f32, SensorError> {
        self.read(|state| state.params().max_speed())
    }

    /// Set the reachable top speed.
    ///
    /// Side effect: `min_speed` becomes `0.3 * max_speed * 2/PI`.
    pub fn set_max_speed(&self, max_speed: f32) -> Result<(), SensorError> {
        self.write(|state| state.params_mut().set_max_speed(max_speed))
    }

    pub fn acceleration(&self) -> Result<f32, SensorError> {
        self.read(|state| state.params().tuning.acceleration)
    }

    pub fn set_acceleration(&self, acceleration: f32) -> Result<(), SensorError> {
        self.write(|state| state.params_mut().tuning.acceleration = acceleration)
    }

    pub fn springness(&self) -> Result<f32, SensorError> {
        self.read(|state| state.params().tuning.springness)
    }

    pub fn set_springness(&self, springness: f32) -> Result<(), SensorError> {
        self.write(|state| state.params_mut().tuning.springness = springness)
    }

    pub fn display_rotation(&self) -> Result<DisplayRotation, SensorError> {
        self.read(|state| state.params().rotation)
    }

    /// Applied on the next drain; does not reset calibration.
    pub fn set_display_rotation(&self, rotation: DisplayRotation) -> Result<(), SensorError> {
        self.write(|state| state.params_mut().rotation = rotation)
    }

    pub fn mirror(&self) -> Result<bool, SensorError> {
        self.read(|state| state.params().mirror)
    }

    pub fn set_mirror(&self, mirror: bool) -> Result<(), SensorError> {
        self.write(|state| state.params_mut().mirror = mirror)
    }

    pub fn extractor_mode(&self) -> Result<ExtractorMode, SensorError> {
        self.read(|state| state.params().extractor)
    }

    /// Switch the angle extractor.
    ///
    /// Side effect: calibration is dropped and a reset is attempted at once.
    /// If that reset fails (not warm yet, or no magnetometer reading for
    /// fusion) the engine recalibrates on the next usable sample.
    pub fn set_extractor_mode(&self, mode: ExtractorMode) -> Result<(), SensorError> {
        let result = {
            let mut state = self.lock_state()?;
            state.params_mut().extractor = mode;
            state.decalibrate();
            state.reset()
        };

        tracing::info!("[ScrollEngine] Extractor set to {}", mode.as_str());
        telemetry::hub().record_extractor_change(mode);

        match &result {
            Ok(_) => self.report_reset(&result, CalibrationTrigger::ExtractorChange),
            Err(err) => tracing::debug!(
                "[ScrollEngine] Deferring calibration after extractor change: {}",
                err
            ),
        }

        Ok(())
    }

    /// Apply a partial update through the regular setters.
    ///
    /// Order: threshold, max_speed, min_speed, acceleration, springness,
    /// rotation, mirror, extractor. An invalid rotation index is skipped.
    pub fn apply_patch(&self, patch: &ParamPatch) -> Result<(), SensorError> {
        if let Some(threshold) = patch.threshold {
            self.set_threshold(threshold)?;
        }
        if let Some(max_speed) = patch.max_speed {
            self.set_max_speed(max_speed)?;
        }
        if let Some(min_speed) = patch.min_speed {
            self.set_min_speed(min_speed)?;
        }
        if let Some(acceleration) = patch.acceleration {
            self.set_acceleration(acceleration)?;
        }
        if let Some(springness) = patch.springness {
            self.set_springness(springness)?;
        }
        if let Some(index) = patch.rotation {
            match DisplayRotation::from_index(index) {
                Some(rotation) => self.set_display_rotation(rotation)?,
                None => log::warn!(
                    "[ScrollEngine] Ignoring invalid rotation index {} in patch",
                    index
                ),
            }
        }
        if let Some(mirror) = patch.mirror {
            self.set_mirror(mirror)?;
        }
        if let Some(mode) = patch.extractor {
            self.set_extractor_mode(mode)?;
        }
        Ok(())
    }

    // ========================================================================
    // HELPER METHODS - Lock management
    // ========================================================================

    /// Safely acquire the state lock for sample and parameter access
    fn lock_state(&self) -> Result<MutexGuard<'_, ScrollState>, SensorError> {
        self.state.lock().map_err(|_| SensorError::LockPoisoned {
            component: STATE_COMPONENT.to_string(),
        })
    }

    /// Safely acquire the state lock for calibration
    fn lock_for_calibration(&self) -> Result<MutexGuard<'_, ScrollState>, CalibrationError> {
        self.state.lock().map_err(|_| {
            let err = CalibrationError::StatePoisoned;
            log_calibration_error(&err, "reset_state");
            err
        })
    }

    fn read<T>(&self, f: impl FnOnce(&ScrollState) -> T) -> Result<T, SensorError> {
        let state = self.lock_state()?;
        Ok(f(&state))
    }

    fn write(&self, f: impl FnOnce(&mut ScrollState)) -> Result<(), SensorError> {
        let mut state = self.lock_state()?;
        f(&mut state);
        Ok(())
    }
}

impl SensorListener for ScrollEngine {
    fn on_acceleration_changed(&self, sample: AccelSample) -> Result<(), SensorError> {
        self.on_sample(sample)
    }

    fn on_magnetic_field_changed(&self, sample: MagneticSample) -> Result<(), SensorError> {
        self.on_magnetic_sample(sample)
    }
}

impl Default for ScrollEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ========================================================================
// TESTS
// ========================================================================
