//! Value types shared across the tilt pipeline.
//!
//! Device frame (as delivered by the host sensor stack):
//! - x: device centre to the right edge
//! - y: device centre to the top edge
//! - z: out of the screen, toward the user

use serde::{Deserialize, Serialize};

/// Plain 3-component vector in the device frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const ZERO: Vector3 = Vector3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn norm(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    pub fn cross(&self, other: &Vector3) -> Vector3 {
        Vector3 {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    pub fn scaled(&self, factor: f32) -> Vector3 {
        Vector3 {
            x: self.x * factor,
            y: self.y * factor,
            z: self.z * factor,
        }
    }

    pub fn add(&self, other: &Vector3) -> Vector3 {
        Vector3 {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

/// Raw accelerometer reading tagged with the time since the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccelSample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Nanoseconds elapsed since the previous accelerometer sample
    pub dt_nanos: u64,
}

impl AccelSample {
    pub fn new(x: f32, y: f32, z: f32, dt_nanos: u64) -> Self {
        Self { x, y, z, dt_nanos }
    }

    pub fn vector(&self) -> Vector3 {
        Vector3::new(self.x, self.y, self.z)
    }

    /// Elapsed time in seconds
    pub fn dt_secs(&self) -> f32 {
        self.dt_nanos as f32 / 1.0e9
    }
}

/// Raw magnetometer reading. Only the latest one is kept by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MagneticSample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl MagneticSample {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn vector(&self) -> Vector3 {
        Vector3::new(self.x, self.y, self.z)
    }
}

/// Tilt angles in radians.
///
/// Positive `vertical` means gravity gained a component along +y (top edge
/// lowered toward the ground side of the reading); positive `horizontal` the
/// same for +x. Both extractor strategies report in this convention.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AnglePair {
    /// Rotation about the device X axis (drives the y scroll axis)
    pub vertical: f32,
    /// Rotation about the device Y axis (drives the x scroll axis)
    pub horizontal: f32,
}

impl AnglePair {
    pub fn new(vertical: f32, horizontal: f32) -> Self {
        Self {
            vertical,
            horizontal,
        }
    }

    /// Component-wise `self - reference`
    pub fn deviation_from(&self, reference: &AnglePair) -> AnglePair {
        AnglePair {
            vertical: self.vertical - reference.vertical,
            horizontal: self.horizontal - reference.horizontal,
        }
    }
}

/// Two-axis quantity in the scroll plane (speed or displacement).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScrollVector {
    pub x: f32,
    pub y: f32,
}

impl ScrollVector {
    pub const ZERO: ScrollVector = ScrollVector { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}
