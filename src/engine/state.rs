//! ScrollState: everything the engine mutates, in one owned structure.
//!
//! The engine keeps this behind a single mutex. Methods here are plain
//! `&mut self` logic with no locking, logging of outcomes is left to the
//! caller, and nothing allocates after construction.

use crate::analysis::integrator::MotionState;
use crate::analysis::remap::remap;
use crate::analysis::smoother::SampleSmoother;
use crate::analysis::types::{AccelSample, AnglePair, MagneticSample, ScrollVector, Vector3};
use crate::calibration::CalibrationState;
use crate::engine::params::ScrollParameters;
use crate::error::{CalibrationError, SensorError};

/// What a single accelerometer sample did to the state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleOutcome {
    /// Buffer not yet warm; sample stored, nothing computed
    WarmingUp { collected: usize, required: usize },
    /// Buffer became warm (or a retry succeeded) and a reference was captured
    Calibrated(AnglePair),
    /// Speed and displacement were advanced
    Integrated,
}

#[derive(Debug, Clone)]
pub struct ScrollState {
    smoother: SampleSmoother,
    calibration: CalibrationState,
    motion: MotionState,
    params: ScrollParameters,
    /// Latest magnetometer vector; zero until the first reading
    magnetic: Vector3,
    /// Set while consecutive samples keep failing angle extraction
    degenerate_run: bool,
}

impl ScrollState {
    pub fn new(history_size: usize, params: ScrollParameters) -> Self {
        Self {
            smoother: SampleSmoother::new(history_size),
            calibration: CalibrationState::new_default(),
            motion: MotionState::default(),
            params,
            magnetic: Vector3::ZERO,
            degenerate_run: false,
        }
    }

    pub fn params(&self) -> &ScrollParameters {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut ScrollParameters {
        &mut self.params
    }

    pub fn calibration(&self) -> &CalibrationState {
        &self.calibration
    }

    pub fn history_size(&self) -> usize {
        self.smoother.capacity()
    }

    pub fn is_degenerate_run(&self) -> bool {
        self.degenerate_run
    }

    /// Feed one accelerometer sample through the pipeline.
    ///
    /// Non-finite samples are rejected before they reach the buffer. A
    /// degenerate pose leaves speed and displacement untouched.
    pub fn on_sample(&mut self, sample: &AccelSample) -> Result<SampleOutcome, SensorError> {
        let vector = sample.vector();
        if !vector.is_finite() {
            return Err(SensorError::NonFiniteSample);
        }

        self.smoother.ingest(vector);

        if !self.calibration.is_calibrated {
            if !self.smoother.is_warm() {
                return Ok(SampleOutcome::WarmingUp {
                    collected: self.smoother.len(),
                    required: self.smoother.capacity(),
                });
            }

            // The sample that completes calibration does no velocity step
            return match self.reset() {
                Ok(reference) => Ok(SampleOutcome::Calibrated(reference)),
                Err(_) => self.degenerate(),
            };
        }

        let Some(average) = self.smoother.average() else {
            // Calibrated implies warm, and the buffer never shrinks
            return Ok(SampleOutcome::WarmingUp {
                collected: self.smoother.len(),
                required: self.smoother.capacity(),
            });
        };

        let angles = match self.params.extractor.extract(average, self.magnetic) {
            Ok(angles) => angles,
            Err(_) => return self.degenerate(),
        };

        self.degenerate_run = false;
        let deviation = self.calibration.deviation(&angles);
        self.motion
            .step(&deviation, sample.dt_secs(), &self.params.tuning);

        Ok(SampleOutcome::Integrated)
    }

    fn degenerate(&mut self) -> Result<SampleOutcome, SensorError> {
        self.degenerate_run = true;
        Err(SensorError::DegenerateOrientation)
    }

    /// Replace the retained magnetometer vector.
    pub fn on_magnetic_sample(&mut self, sample: &MagneticSample) {
        self.magnetic = sample.vector();
    }

    /// Capture a new reference from the current average and zero motion.
    ///
    /// On failure nothing is mutated.
    pub fn reset(&mut self) -> Result<AnglePair, CalibrationError> {
        let captured =
            CalibrationState::capture(&self.smoother, self.params.extractor, self.magnetic)?;

        self.calibration = captured;
        self.motion.clear();
        self.degenerate_run = false;
        Ok(captured.reference)
    }

    /// Forget the reference and stop all motion; the next warm sample
    /// recalibrates.
    pub fn decalibrate(&mut self) {
        self.calibration.decalibrate();
        self.motion.clear();
    }

    /// Drain displacement and remap it for the display.
    ///
    /// `mirror` overrides the stored mirror flag when given.
    pub fn take_movement(&mut self, mirror: Option<bool>) -> ScrollVector {
        let displacement = self.motion.drain_displacement();
        remap(
            displacement,
            self.params.rotation,
            mirror.unwrap_or(self.params.mirror),
            self.params.extractor,
        )
    }

    /// Current speed, neither drained nor remapped
    pub fn speed(&self) -> ScrollVector {
        self.motion.speed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(dt_nanos: u64) -> AccelSample {
        AccelSample::new(0.0, 0.0, 9.8, dt_nanos)
    }

    #[test]
    fn test_warm_up_then_calibrate() {
        let mut state = ScrollState::new(2, ScrollParameters::default());

        let first = state.on_sample(&flat(20_000_000)).unwrap();
        assert_eq!(
            first,
            SampleOutcome::WarmingUp {
                collected: 1,
                required: 2
            }
        );

        let second = state.on_sample(&flat(20_000_000)).unwrap();
        assert!(matches!(second, SampleOutcome::Calibrated(_)));
        assert!(state.calibration().is_calibrated);

        let third = state.on_sample(&flat(20_000_000)).unwrap();
        assert_eq!(third, SampleOutcome::Integrated);
    }

    #[test]
    fn test_non_finite_sample_never_enters_buffer() {
        let mut state = ScrollState::new(2, ScrollParameters::default());
        let bad = AccelSample::new(f32::NAN, 0.0, 9.8, 20_000_000);

        assert_eq!(state.on_sample(&bad), Err(SensorError::NonFiniteSample));
        assert!(matches!(
            state.reset(),
            Err(CalibrationError::NotReady {
                required: 2,
                collected: 0
            })
        ));
    }

    #[test]
    fn test_reset_failure_does_not_mutate() {
        let mut state = ScrollState::new(2, ScrollParameters::default());
        state.on_sample(&flat(0)).unwrap();

        let before = *state.calibration();
        assert!(state.reset().is_err());
        assert_eq!(*state.calibration(), before);
    }

    #[test]
    fn test_decalibrate_clears_motion() {
        let mut state = ScrollState::new(2, ScrollParameters::default());
        state.on_sample(&flat(0)).unwrap();
        state.on_sample(&flat(0)).unwrap();
        state.motion.speed = ScrollVector::new(3.5, -1.0);
        state.motion.displacement = ScrollVector::new(0.7, 0.2);

        state.decalibrate();

        assert!(!state.calibration().is_calibrated);
        assert_eq!(state.speed(), ScrollVector::ZERO);
        assert_eq!(state.take_movement(None), ScrollVector::ZERO);
    }

    #[test]
    fn test_take_movement_uses_override_mirror() {
        let mut state = ScrollState::new(2, ScrollParameters::default());
        state.motion.displacement = ScrollVector::new(1.0, 2.0);

        let out = state.take_movement(Some(true));
        assert_eq!(out, ScrollVector::new(-1.0, -2.0));
        assert_eq!(state.take_movement(None), ScrollVector::ZERO);
    }
}
