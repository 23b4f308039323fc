// Error types for the tilt scroll engine
//
// This module defines custom error types for sample ingestion and calibration,
// providing structured error handling with error codes suitable for FFI communication.

mod calibration;
mod sensor;

pub use calibration::{log_calibration_error, CalibrationError, CalibrationErrorCodes};
pub use sensor::{log_sensor_error, SensorError, SensorErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the FFI boundary.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
