//! Display-rotation remapping of drained displacement.
//!
//! Applied only on read-out, never to stored state or to speed.

use serde::{Deserialize, Serialize};

use crate::analysis::angles::ExtractorMode;
use crate::analysis::types::ScrollVector;

/// Anticlockwise display rotation, as reported by the host display stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayRotation {
    #[default]
    Rotation0,
    Rotation90,
    Rotation180,
    Rotation270,
}

impl DisplayRotation {
    /// Map a host rotation index (0..=3, i.e. `Surface.ROTATION_*`).
    pub fn from_index(index: i32) -> Option<Self> {
        match index {
            0 => Some(DisplayRotation::Rotation0),
            1 => Some(DisplayRotation::Rotation90),
            2 => Some(DisplayRotation::Rotation180),
            3 => Some(DisplayRotation::Rotation270),
            _ => None,
        }
    }

    pub fn index(&self) -> i32 {
        match self {
            DisplayRotation::Rotation0 => 0,
            DisplayRotation::Rotation90 => 1,
            DisplayRotation::Rotation180 => 2,
            DisplayRotation::Rotation270 => 3,
        }
    }

    pub fn degrees(&self) -> u32 {
        self.index() as u32 * 90
    }

    /// Rotate a vector using exact swaps and negations.
    pub fn apply(&self, v: ScrollVector) -> ScrollVector {
        match self {
            DisplayRotation::Rotation0 => v,
            DisplayRotation::Rotation90 => ScrollVector::new(-v.y, v.x),
            DisplayRotation::Rotation180 => ScrollVector::new(-v.x, -v.y),
            DisplayRotation::Rotation270 => ScrollVector::new(v.y, -v.x),
        }
    }
}

/// Rotate drained displacement for the caller, then optionally mirror it
/// for the input-device emulator.
///
/// Emulator mirroring always flips y; x is flipped only for gravity-angle
/// extraction.
pub fn remap(
    displacement: ScrollVector,
    rotation: DisplayRotation,
    mirror: bool,
    mode: ExtractorMode,
) -> ScrollVector {
    let mut out = rotation.apply(displacement);
    if mirror {
        if mode == ExtractorMode::GravityAngle {
            out.x = -out.x;
        }
        out.y = -out.y;
    }
    out
}
