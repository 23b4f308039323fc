// Sensor ingestion error types and constants

use crate::error::ErrorCode;
use flutter_rust_bridge::frb;
use log::warn;
use std::fmt;

/// Sensor error code constants exposed to Dart via FFI
///
/// Error code range: 1001-1003
#[frb(unignore)]
pub struct SensorErrorCodes {}

#[frb]
impl SensorErrorCodes {
    /// Gravity/magnetic vectors do not define a pose for this sample
    pub const DEGENERATE_ORIENTATION: i32 = 1001;

    /// Sample contained NaN or infinite components
    pub const NON_FINITE_SAMPLE: i32 = 1002;

    /// Engine state mutex was poisoned
    pub const LOCK_POISONED: i32 = 1003;

    /// Get DEGENERATE_ORIENTATION error code
    #[flutter_rust_bridge::frb(sync, getter)]
    pub fn degenerate_orientation() -> i32 {
        Self::DEGENERATE_ORIENTATION
    }

    /// Get NON_FINITE_SAMPLE error code
    #[flutter_rust_bridge::frb(sync, getter)]
    pub fn non_finite_sample() -> i32 {
        Self::NON_FINITE_SAMPLE
    }

    /// Get LOCK_POISONED error code
    #[flutter_rust_bridge::frb(sync, getter)]
    pub fn lock_poisoned() -> i32 {
        Self::LOCK_POISONED
    }
}

/// Log a sensor error with structured context
///
/// Sensor errors degrade a single update and are always recoverable, so they
/// are logged at warn level rather than error.
pub fn log_sensor_error(err: &SensorError, context: &str) {
    warn!(
        "Sensor error in {}: code={}, component=ScrollEngine, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors raised while ingesting a single sensor sample
///
/// None of these are fatal: the offending sample's update is skipped and the
/// engine keeps its previous speed and displacement.
#[derive(Debug, Clone, PartialEq)]
pub enum SensorError {
    /// No orientation could be derived (vectors parallel, zero or non-finite)
    DegenerateOrientation,

    /// Accelerometer sample rejected before entering the history buffer
    NonFiniteSample,

    /// Mutex guarding engine state was poisoned
    LockPoisoned { component: String },
}

impl ErrorCode for SensorError {
    fn code(&self) -> i32 {
        match self {
            SensorError::DegenerateOrientation => SensorErrorCodes::DEGENERATE_ORIENTATION,
            SensorError::NonFiniteSample => SensorErrorCodes::NON_FINITE_SAMPLE,
            SensorError::LockPoisoned { .. } => SensorErrorCodes::LOCK_POISONED,
        }
    }

    fn message(&self) -> String {
        match self {
            SensorError::DegenerateOrientation => {
                "Degenerate orientation: gravity and magnetic vectors do not define a pose"
                    .to_string()
            }
            SensorError::NonFiniteSample => {
                "Sample rejected: components must be finite".to_string()
            }
            SensorError::LockPoisoned { component } => {
                format!("Lock poisoned for component: {}", component)
            }
        }
    }
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SensorError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for SensorError {}
