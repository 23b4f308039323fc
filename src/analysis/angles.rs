//! Tilt angle extraction from the smoothed accelerometer vector.
//!
//! Two strategies are supported:
//! - `GravityAngle`: angles come straight from the gravity vector's axis pairs.
//! - `OrientationFusion`: a tilt-compensated compass rotation matrix is built
//!   from gravity and the latest magnetic field, and pitch/roll are read from
//!   it. Needs a magnetometer and fails when the two vectors are parallel.
//!
//! Both report radians in the same sign convention (see `AnglePair`), but the
//! values are not comparable across strategies: a strategy change must be
//! followed by a fresh reference pose.

use std::f32::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};

use crate::analysis::types::{AnglePair, Vector3};
use crate::error::SensorError;

/// Smallest accepted |E x A| before the pose is treated as degenerate.
const MIN_CROSS_NORM: f32 = 0.1;

/// Smallest accepted sine of the angle between gravity and magnetic field.
const MIN_SIN_ANGLE: f32 = 0.01;

/// Strategy used to turn the averaged sensor vectors into tilt angles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractorMode {
    /// Phone-based tilt straight from the gravity vector
    #[default]
    GravityAngle,
    /// Hand-based orientation from gravity + magnetic field
    OrientationFusion,
}

impl ExtractorMode {
    /// Extract the tilt pair for the averaged gravity vector.
    ///
    /// `magnetic` is only consulted by `OrientationFusion`.
    pub fn extract(
        &self,
        gravity: Vector3,
        magnetic: Vector3,
    ) -> Result<AnglePair, SensorError> {
        match self {
            ExtractorMode::GravityAngle => gravity_angles(gravity),
            ExtractorMode::OrientationFusion => fusion_angles(gravity, magnetic),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractorMode::GravityAngle => "gravity_angle",
            ExtractorMode::OrientationFusion => "orientation_fusion",
        }
    }
}

/// Elevation of `axis` out of the plane spanned by the remaining components.
///
/// `FRAC_PI_2 - acos(axis / hypot(axis, other))`, with the ratio clamped to
/// [-1, 1] so rounding noise cannot produce NaN.
fn tilt(axis: f32, other: f32) -> f32 {
    let ratio = axis / axis.hypot(other);
    let clamped = ratio.clamp(-1.0, 1.0);
    if clamped != ratio {
        log::trace!("[AngleExtractor] acos argument {} clamped", ratio);
    }
    FRAC_PI_2 - clamped.acos()
}

fn gravity_angles(gravity: Vector3) -> Result<AnglePair, SensorError> {
    if !gravity.is_finite() || gravity.norm() == 0.0 {
        return Err(SensorError::DegenerateOrientation);
    }

    let Vector3 { x, y, z } = gravity;
    let vertical = tilt(y, x.hypot(z));
    let horizontal = tilt(x, y.hypot(z));
    log::trace!(
        "[AngleExtractor] gravity angles: {} {}",
        vertical,
        horizontal
    );

    Ok(AnglePair::new(vertical, horizontal))
}

/// Row-major 3x3 rotation matrix from the device frame to the world frame
/// (east, north, up).
pub type RotationMatrix = [f32; 9];

/// Azimuth, pitch and roll read from a rotation matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orientation {
    pub azimuth: f32,
    pub pitch: f32,
    pub roll: f32,
}

/// Build the device rotation matrix from gravity (up) and geomagnetic
/// (north-ish) vectors.
///
/// Fails when either vector is ~zero or the two are nearly parallel, since
/// east = magnetic x gravity is then undefined.
pub fn rotation_matrix(
    gravity: Vector3,
    geomagnetic: Vector3,
) -> Result<RotationMatrix, SensorError> {
    if !gravity.is_finite() || !geomagnetic.is_finite() {
        return Err(SensorError::DegenerateOrientation);
    }

    let east = geomagnetic.cross(&gravity);
    let east_norm = east.norm();
    let scale = gravity.norm() * geomagnetic.norm();
    if east_norm < MIN_CROSS_NORM || east_norm < MIN_SIN_ANGLE * scale {
        log::debug!(
            "[AngleExtractor] degenerate pose: |E x A| = {} for |A||E| = {}",
            east_norm,
            scale
        );
        return Err(SensorError::DegenerateOrientation);
    }

    let h = east.scaled(1.0 / east_norm);
    let a = gravity.scaled(1.0 / gravity.norm());
    let m = a.cross(&h);

    Ok([h.x, h.y, h.z, m.x, m.y, m.z, a.x, a.y, a.z])
}

/// Read azimuth, pitch and roll from a rotation matrix.
pub fn orientation(r: &RotationMatrix) -> Orientation {
    Orientation {
        azimuth: r[1].atan2(r[4]),
        pitch: (-r[7]).clamp(-1.0, 1.0).asin(),
        roll: (-r[6]).atan2(r[8]),
    }
}

fn fusion_angles(gravity: Vector3, magnetic: Vector3) -> Result<AnglePair, SensorError> {
    let r = rotation_matrix(gravity, magnetic)?;
    let o = orientation(&r);
    log::trace!(
        "[AngleExtractor] orientation angles: azimuth={} pitch={} roll={}",
        o.azimuth,
        o.pitch,
        o.roll
    );

    // Pitch and roll are positive for the opposite tilt of the shared
    // convention, hence the negation.
    Ok(AnglePair::new(-o.pitch, -o.roll))
}
