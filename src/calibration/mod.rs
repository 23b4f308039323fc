// Calibration module - reference pose capture
//
// The reference pose is the angle pair that counts as "not tilted". It is
// captured automatically once the smoothing buffer first fills, and again on
// every explicit reset or extractor change. Deviations fed to the velocity
// integrator are measured against it.

pub mod state;

pub use state::CalibrationState;
