//! Velocity integrator: maps tilt deviation to scroll speed and displacement.
//!
//! Each axis is independent. Inside the deadzone the speed springs back
//! toward zero; outside it the speed follows a bounded cosine response that
//! flattens as the speed approaches `max_speed * sin(deviation) * PI/2`.

use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

use crate::analysis::types::{AnglePair, ScrollVector};

/// Tunable response parameters.
///
/// `max_speed` is stored in the internal (pre-scaled) unit; the speed an
/// axis can actually reach is `max_speed * PI/2`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionTuning {
    /// Deadzone in radians
    pub threshold: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    pub acceleration: f32,
    /// Spring-back rate in 1/s
    pub springness: f32,
}

impl Default for MotionTuning {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            min_speed: 30.0,
            max_speed: 100.0,
            acceleration: 1.0,
            springness: 1.5,
        }
    }
}

/// Speed and accumulated displacement in the scroll plane.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MotionState {
    pub speed: ScrollVector,
    pub displacement: ScrollVector,
}

impl MotionState {
    /// Apply one sample worth of deviation over `dt` seconds.
    ///
    /// The x axis follows the horizontal deviation and y the vertical one.
    pub fn step(&mut self, deviation: &AnglePair, dt: f32, tuning: &MotionTuning) {
        let speed_x = axis_speed(deviation.horizontal, self.speed.x, dt, tuning);
        let speed_y = axis_speed(deviation.vertical, self.speed.y, dt, tuning);

        self.speed = ScrollVector::new(speed_x, speed_y);
        self.displacement.x += speed_x * dt;
        self.displacement.y += speed_y * dt;
    }

    /// Take the accumulated displacement, leaving zero behind.
    pub fn drain_displacement(&mut self) -> ScrollVector {
        std::mem::take(&mut self.displacement)
    }

    pub fn clear(&mut self) {
        *self = MotionState::default();
    }
}

/// Three-valued sign: 0 for zero, unlike `f32::signum`.
fn sign(value: f32) -> f32 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Spring-back factor for `dt` seconds.
///
/// Goes negative once `dt > 1 / springness`, flipping the sign of the
/// speed. Hosts with long gaps between samples should clamp `dt` upstream.
fn decay(dt: f32, tuning: &MotionTuning) -> f32 {
    1.0 - dt * tuning.springness
}

/// Next speed for one axis.
pub fn axis_speed(deviation: f32, speed: f32, dt: f32, tuning: &MotionTuning) -> f32 {
    if deviation.abs() > tuning.threshold {
        let movement = deviation.sin();
        if movement != 0.0 {
            let next = response(speed, movement, dt, tuning);
            return if sign(next) != sign(movement) {
                // Still tilted one way while moving the other: brake harder
                next * decay(dt, tuning)
            } else {
                next
            };
        }
        log::trace!("[Integrator] zero movement signal, treating axis as idle");
    }

    decay(dt, tuning) * speed
}

/// Bounded cosine response for an active axis.
fn response(speed: f32, movement: f32, dt: f32, tuning: &MotionTuning) -> f32 {
    let phase = ((speed + sign(movement)).abs() / (tuning.max_speed * movement)).min(PI);
    speed + movement * tuning.min_speed * phase.cos() * dt * tuning.acceleration
}
