// Public API for flutter_rust_bridge integration
// This module provides FFI functions for the host app to feed sensor readings
// into the scroll engine and read back scroll movement.

#![allow(dead_code)] // FFI functions are called from Dart, not detected by Rust analyzer

use anyhow::Result;
use once_cell::sync::Lazy;

use crate::analysis::angles::ExtractorMode;
use crate::analysis::remap::DisplayRotation;
use crate::analysis::types::{AccelSample, MagneticSample, ScrollVector};
use crate::config::AppConfig;
use crate::engine::ScrollEngine;
use crate::error::SensorError;
use crate::telemetry;

// Re-export error code constants for FFI exposure
pub use crate::error::{CalibrationErrorCodes, SensorErrorCodes};

/// Global engine instance shared by every bridge call
///
/// Built from the platform config on first use.
static ENGINE: Lazy<ScrollEngine> =
    Lazy::new(|| ScrollEngine::from_config(&AppConfig::load_platform()));

fn as_pair(v: ScrollVector) -> (f32, f32) {
    (v.x, v.y)
}

/// Initialize logging and build the engine
///
/// Safe to call more than once.
#[flutter_rust_bridge::frb(sync)]
pub fn init_app() {
    crate::init_logging();
    Lazy::force(&ENGINE);
    log::info!(
        "[Api] Tilt scroll engine ready (v{})",
        env!("CARGO_PKG_VERSION")
    );
}

/// Get the version of the scroll engine
#[flutter_rust_bridge::frb(sync)]
pub fn get_version() -> Result<String> {
    Ok(env!("CARGO_PKG_VERSION").to_string())
}

// ============================================================================
// SENSOR INPUT
// ============================================================================

/// Push one accelerometer reading
///
/// # Arguments
/// * `x`, `y`, `z` - Acceleration in m/s^2, device frame
/// * `dt_nanos` - Nanoseconds since the previous accelerometer reading
///
/// # Returns
/// * `Ok(true)` - Sample was used
/// * `Ok(false)` - Sample was skipped (non-finite values or no defined pose)
/// * `Err(SensorError)` - Engine state was poisoned
#[flutter_rust_bridge::frb(sync)]
pub fn on_acceleration_changed(
    x: f32,
    y: f32,
    z: f32,
    dt_nanos: u64,
) -> Result<bool, SensorError> {
    match ENGINE.on_sample(AccelSample::new(x, y, z, dt_nanos)) {
        Ok(()) => Ok(true),
        Err(SensorError::NonFiniteSample | SensorError::DegenerateOrientation) => Ok(false),
        Err(err) => Err(err),
    }
}

/// Push one magnetometer reading (microtesla, device frame)
#[flutter_rust_bridge::frb(sync)]
pub fn on_magnetic_field_changed(x: f32, y: f32, z: f32) -> Result<(), SensorError> {
    ENGINE.on_magnetic_sample(MagneticSample::new(x, y, z))
}

// ============================================================================
// CALIBRATION + READ-OUT
// ============================================================================

/// Capture the current pose as neutral
///
/// # Returns
/// `false` if the engine has not seen enough samples yet or the pose is
/// degenerate; calibration is unchanged in that case.
#[flutter_rust_bridge::frb(sync)]
pub fn reset_state() -> bool {
    ENGINE.reset_state().is_ok()
}

/// Drain scroll movement since the previous call, adjusted for display rotation
#[flutter_rust_bridge::frb(sync)]
pub fn get_movement() -> Result<(f32, f32), SensorError> {
    ENGINE.get_movement().map(as_pair)
}

/// Drain scroll movement, mirrored for the input-device emulator when asked
#[flutter_rust_bridge::frb(sync)]
pub fn get_movement_with_emulator(use_emulator: bool) -> Result<(f32, f32), SensorError> {
    ENGINE.get_movement_with_emulator(use_emulator).map(as_pair)
}

/// Current scroll speed (not drained, not rotated)
#[flutter_rust_bridge::frb(sync)]
pub fn get_speed() -> Result<(f32, f32), SensorError> {
    ENGINE.get_speed().map(as_pair)
}

// ============================================================================
// PARAMETERS
// ============================================================================

#[flutter_rust_bridge::frb(sync)]
pub fn get_threshold() -> Result<f32, SensorError> {
    ENGINE.threshold()
}

#[flutter_rust_bridge::frb(sync)]
pub fn set_threshold(threshold: f32) -> Result<(), SensorError> {
    ENGINE.set_threshold(threshold)
}

#[flutter_rust_bridge::frb(sync)]
pub fn get_min_speed() -> Result<f32, SensorError> {
    ENGINE.min_speed()
}

#[flutter_rust_bridge::frb(sync)]
pub fn set_min_speed(min_speed: f32) -> Result<(), SensorError> {
    ENGINE.set_min_speed(min_speed)
}

#[flutter_rust_bridge::frb(sync)]
pub fn get_max_speed() -> Result<f32, SensorError> {
    ENGINE.max_speed()
}

/// Set the top scroll speed
///
/// Also resets min speed to 30% of the new value's internal scale.
#[flutter_rust_bridge::frb(sync)]
pub fn set_max_speed(max_speed: f32) -> Result<(), SensorError> {
    ENGINE.set_max_speed(max_speed)
}

#[flutter_rust_bridge::frb(sync)]
pub fn get_acceleration() -> Result<f32, SensorError> {
    ENGINE.acceleration()
}

#[flutter_rust_bridge::frb(sync)]
pub fn set_acceleration(acceleration: f32) -> Result<(), SensorError> {
    ENGINE.set_acceleration(acceleration)
}

#[flutter_rust_bridge::frb(sync)]
pub fn get_springness() -> Result<f32, SensorError> {
    ENGINE.springness()
}

#[flutter_rust_bridge::frb(sync)]
pub fn set_springness(springness: f32) -> Result<(), SensorError> {
    ENGINE.set_springness(springness)
}

/// Display rotation as the host index (0..=3)
#[flutter_rust_bridge::frb(sync)]
pub fn get_display_rotation() -> Result<i32, SensorError> {
    ENGINE.display_rotation().map(|rotation| rotation.index())
}

/// Set display rotation from the host index (0..=3)
///
/// # Returns
/// `Ok(false)` for an index outside 0..=3; the rotation is left unchanged.
#[flutter_rust_bridge::frb(sync)]
pub fn set_display_rotation(index: i32) -> Result<bool, SensorError> {
    match DisplayRotation::from_index(index) {
        Some(rotation) => ENGINE.set_display_rotation(rotation).map(|_| true),
        None => {
            log::warn!("[Api] Ignoring invalid display rotation index {}", index);
            Ok(false)
        }
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn get_mirror() -> Result<bool, SensorError> {
    ENGINE.mirror()
}

#[flutter_rust_bridge::frb(sync)]
pub fn set_mirror(mirror: bool) -> Result<(), SensorError> {
    ENGINE.set_mirror(mirror)
}

#[flutter_rust_bridge::frb(sync)]
pub fn get_extractor_mode() -> Result<ExtractorMode, SensorError> {
    ENGINE.extractor_mode()
}

/// Switch between phone-based and hand-based tilt
///
/// Recalibrates immediately, or on the next usable sample if that fails.
#[flutter_rust_bridge::frb(sync)]
pub fn set_extractor_mode(mode: ExtractorMode) -> Result<(), SensorError> {
    ENGINE.set_extractor_mode(mode)
}

// ============================================================================
// DIAGNOSTICS
// ============================================================================

/// Telemetry snapshot (recent engine events and counters) as JSON
#[flutter_rust_bridge::frb(sync)]
pub fn telemetry_snapshot_json() -> Result<String> {
    Ok(serde_json::to_string(&telemetry::hub().snapshot())?)
}

/// Get SensorErrorCodes as a structured object with all error code constants
#[flutter_rust_bridge::frb(sync)]
pub fn get_sensor_error_codes() -> SensorErrorCodes {
    SensorErrorCodes {}
}

/// Get CalibrationErrorCodes as a structured object with all error code constants
#[flutter_rust_bridge::frb(sync)]
pub fn get_calibration_error_codes() -> CalibrationErrorCodes {
    CalibrationErrorCodes {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_version() {
        let version = get_version().unwrap();
        assert_eq!(version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_invalid_rotation_is_rejected() {
        set_display_rotation(2).unwrap();
        assert!(!set_display_rotation(4).unwrap());
        assert!(!set_display_rotation(-1).unwrap());
        assert_eq!(get_display_rotation().unwrap(), 2);
        assert!(set_display_rotation(0).unwrap());
    }

    #[test]
    fn test_non_finite_sample_is_skipped() {
        init_app();
        assert!(!on_acceleration_changed(f32::NAN, 0.0, 9.8, 0).unwrap());
    }

    #[test]
    fn test_telemetry_snapshot_is_json() {
        let json = telemetry_snapshot_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["total_events"].is_u64());
    }
}
