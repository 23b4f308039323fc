// Analysis module - sensor pipeline from raw vectors to scroll motion
//
// Pipeline: SampleSmoother → ExtractorMode (angles) → deviation from the
// calibrated reference → MotionState (speed + displacement). The remapper is
// applied only when displacement is read out.
//
// Everything in here is pure and lock-free; the engine owns the state and
// the locking.

pub mod angles;
pub mod integrator;
pub mod remap;
pub mod smoother;
pub mod types;

pub use angles::ExtractorMode;
pub use integrator::{MotionState, MotionTuning};
pub use remap::{remap, DisplayRotation};
pub use smoother::{SampleSmoother, DEFAULT_HISTORY_SIZE};
pub use types::{AccelSample, AnglePair, MagneticSample, ScrollVector, Vector3};
