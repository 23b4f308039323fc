//! Ring-buffer moving average over the most recent accelerometer vectors.
//!
//! The mean is recomputed from the buffer on every call instead of being
//! maintained incrementally; with N in the low single digits this is cheap
//! and cannot drift.

use crate::analysis::types::Vector3;

/// Default number of samples averaged by the smoother
pub const DEFAULT_HISTORY_SIZE: usize = 2;

#[derive(Debug, Clone)]
pub struct SampleSmoother {
    history: Vec<Vector3>,
    write_index: usize,
    /// Samples ingested so far, saturating at capacity
    filled: usize,
}

impl SampleSmoother {
    /// Create a smoother averaging `capacity` samples.
    ///
    /// A capacity of zero has no meaningful average and is raised to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = if capacity == 0 {
            log::warn!("[SampleSmoother] history size 0 requested, using 1");
            1
        } else {
            capacity
        };

        Self {
            history: vec![Vector3::ZERO; capacity],
            write_index: 0,
            filled: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.history.len()
    }

    /// Number of samples received, saturating at capacity
    pub fn len(&self) -> usize {
        self.filled
    }

    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    /// True once every slot holds a real sample
    pub fn is_warm(&self) -> bool {
        self.filled == self.history.len()
    }

    /// Overwrite the oldest slot with `sample`.
    pub fn ingest(&mut self, sample: Vector3) {
        self.history[self.write_index] = sample;
        self.write_index = (self.write_index + 1) % self.history.len();
        if self.filled < self.history.len() {
            self.filled += 1;
        }
    }

    /// Arithmetic mean of the buffered vectors, or `None` before warm-up.
    pub fn average(&self) -> Option<Vector3> {
        if !self.is_warm() {
            return None;
        }

        let sum = self
            .history
            .iter()
            .fold(Vector3::ZERO, |acc, next| acc.add(next));
        Some(sum.scaled(1.0 / self.history.len() as f32))
    }
}

impl Default for SampleSmoother {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_SIZE)
    }
}
