// CalibrationState - reference pose storage
//
// Holds the angle pair captured at the last calibration instant. Starts
// uncalibrated; the engine captures a new reference from the smoothed
// accelerometer average once the buffer is warm.

use crate::analysis::angles::ExtractorMode;
use crate::analysis::smoother::SampleSmoother;
use crate::analysis::types::{AnglePair, Vector3};
use crate::error::CalibrationError;

/// CalibrationState stores the neutral tilt pose
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CalibrationState {
    /// Angles captured at the calibration instant
    pub reference: AnglePair,
    /// Whether a reference has been captured since the last decalibration
    pub is_calibrated: bool,
}

impl CalibrationState {
    /// Uncalibrated state with a zero reference
    pub fn new_default() -> Self {
        Self {
            reference: AnglePair::default(),
            is_calibrated: false,
        }
    }

    /// Capture a calibrated state from the current smoother contents
    ///
    /// # Returns
    /// * `Ok(CalibrationState)` - reference taken from the averaged vector
    /// * `Err(CalibrationError::NotReady)` - buffer not yet warm
    /// * `Err(CalibrationError::DegenerateOrientation)` - average has no pose
    pub fn capture(
        smoother: &SampleSmoother,
        mode: ExtractorMode,
        magnetic: Vector3,
    ) -> Result<Self, CalibrationError> {
        let average = smoother.average().ok_or(CalibrationError::NotReady {
            required: smoother.capacity(),
            collected: smoother.len(),
        })?;

        let reference = mode
            .extract(average, magnetic)
            .map_err(|_| CalibrationError::DegenerateOrientation)?;

        Ok(Self {
            reference,
            is_calibrated: true,
        })
    }

    /// Forget the reference so the next warm sample recalibrates
    pub fn decalibrate(&mut self) {
        self.is_calibrated = false;
    }

    /// Deviation of `angles` from the stored reference
    pub fn deviation(&self, angles: &AnglePair) -> AnglePair {
        angles.deviation_from(&self.reference)
    }
}

impl Default for CalibrationState {
    fn default() -> Self {
        Self::new_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warm_smoother(sample: Vector3) -> SampleSmoother {
        let mut smoother = SampleSmoother::new(2);
        smoother.ingest(sample);
        smoother.ingest(sample);
        smoother
    }

    #[test]
    fn test_new_default() {
        let state = CalibrationState::new_default();
        assert!(!state.is_calibrated);
        assert_eq!(state.reference, AnglePair::default());
    }

    #[test]
    fn test_capture_before_warm_up() {
        let mut smoother = SampleSmoother::new(3);
        smoother.ingest(Vector3::new(0.0, 0.0, 9.8));

        let result =
            CalibrationState::capture(&smoother, ExtractorMode::GravityAngle, Vector3::ZERO);

        match result.unwrap_err() {
            CalibrationError::NotReady {
                required: 3,
                collected: 1,
            } => {}
            e => panic!("Expected NotReady error, got: {:?}", e),
        }
    }

    #[test]
    fn test_capture_flat_reference() {
        let smoother = warm_smoother(Vector3::new(0.0, 0.0, 9.8));
        let state =
            CalibrationState::capture(&smoother, ExtractorMode::GravityAngle, Vector3::ZERO)
                .unwrap();

        assert!(state.is_calibrated);
        assert!(state.reference.vertical.abs() < 1e-6);
        assert!(state.reference.horizontal.abs() < 1e-6);
    }

    #[test]
    fn test_capture_degenerate_fusion_pose() {
        let smoother = warm_smoother(Vector3::new(0.0, 0.0, 9.8));
        let result =
            CalibrationState::capture(&smoother, ExtractorMode::OrientationFusion, Vector3::ZERO);

        assert_eq!(result, Err(CalibrationError::DegenerateOrientation));
    }

    #[test]
    fn test_deviation_is_relative_to_reference() {
        let smoother = warm_smoother(Vector3::new(1.0, 0.0, 9.8));
        let mut state =
            CalibrationState::capture(&smoother, ExtractorMode::GravityAngle, Vector3::ZERO)
                .unwrap();

        let same = state.deviation(&state.reference);
        assert_eq!(same, AnglePair::new(0.0, 0.0));

        state.decalibrate();
        assert!(!state.is_calibrated);
    }
}
