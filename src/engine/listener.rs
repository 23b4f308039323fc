//! Push interface for sensor sources.

use crate::analysis::types::{AccelSample, MagneticSample};
use crate::error::SensorError;

/// Trait implemented by anything that consumes raw sensor readings.
///
/// Sources call it from a single producer thread; implementations must be
/// safe to share with concurrent readers.
pub trait SensorListener: Send + Sync {
    fn on_acceleration_changed(&self, sample: AccelSample) -> Result<(), SensorError>;
    fn on_magnetic_field_changed(&self, sample: MagneticSample) -> Result<(), SensorError>;
}
