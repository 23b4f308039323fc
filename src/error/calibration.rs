// Calibration error types and constants

use crate::error::ErrorCode;
use flutter_rust_bridge::frb;
use log::warn;
use std::fmt;

/// Calibration error code constants exposed to Dart via FFI
///
/// These constants provide a single source of truth for error codes
/// shared between Rust and Dart.
///
/// Error code range: 2001-2003
#[frb(unignore)]
pub struct CalibrationErrorCodes {}

#[frb]
impl CalibrationErrorCodes {
    /// Reset requested before the smoothing buffer warmed up
    pub const NOT_READY: i32 = 2001;

    /// Reference pose could not be extracted from the current average
    pub const DEGENERATE_ORIENTATION: i32 = 2002;

    /// Engine state mutex was poisoned
    pub const STATE_POISONED: i32 = 2003;

    /// Get NOT_READY error code
    #[flutter_rust_bridge::frb(sync, getter)]
    pub fn not_ready() -> i32 {
        Self::NOT_READY
    }

    /// Get DEGENERATE_ORIENTATION error code
    #[flutter_rust_bridge::frb(sync, getter)]
    pub fn degenerate_orientation() -> i32 {
        Self::DEGENERATE_ORIENTATION
    }

    /// Get STATE_POISONED error code
    #[flutter_rust_bridge::frb(sync, getter)]
    pub fn state_poisoned() -> i32 {
        Self::STATE_POISONED
    }
}

/// Log a calibration error with structured context
///
/// This function logs calibration errors with structured fields including:
/// - error_code: Numeric error code for programmatic handling
/// - component: The component where the error occurred
/// - message: Human-readable error message
/// - context: Additional contextual information
pub fn log_calibration_error(err: &CalibrationError, context: &str) {
    warn!(
        "Calibration error in {}: code={}, component=CalibrationState, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Calibration-related errors
///
/// Error code range: 2001-2003
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationError {
    /// Not enough samples buffered to compute a reference pose
    NotReady { required: usize, collected: usize },

    /// The averaged vectors do not define a pose
    DegenerateOrientation,

    /// Engine state mutex was poisoned
    StatePoisoned,
}

impl ErrorCode for CalibrationError {
    fn code(&self) -> i32 {
        match self {
            CalibrationError::NotReady { .. } => CalibrationErrorCodes::NOT_READY,
            CalibrationError::DegenerateOrientation => {
                CalibrationErrorCodes::DEGENERATE_ORIENTATION
            }
            CalibrationError::StatePoisoned => CalibrationErrorCodes::STATE_POISONED,
        }
    }

    fn message(&self) -> String {
        match self {
            CalibrationError::NotReady {
                required,
                collected,
            } => {
                format!(
                    "Not ready: need {} samples before calibrating, got {}",
                    required, collected
                )
            }
            CalibrationError::DegenerateOrientation => {
                "Reference pose is degenerate for the active extractor".to_string()
            }
            CalibrationError::StatePoisoned => "Engine state lock poisoned".to_string(),
        }
    }
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CalibrationError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for CalibrationError {}
