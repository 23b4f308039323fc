//! Core telemetry event types describing engine state transitions exposed to
//! the CLI and the host bridge.

use serde::{Deserialize, Serialize};

use crate::analysis::angles::ExtractorMode;

/// What caused a reference pose capture.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationTrigger {
    /// Smoothing buffer filled for the first time since decalibration
    WarmUp,
    /// Explicit `reset_state` request
    Reset,
    /// Implicit reset after an extractor change
    ExtractorChange,
}

/// Engine events. Emitted on transitions only, never per normal sample.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum EngineEvent {
    Calibrated {
        vertical: f32,
        horizontal: f32,
        trigger: CalibrationTrigger,
        timestamp_ms: u64,
    },
    ResetRejected {
        code: i32,
    },
    DegenerateOrientation {
        timestamp_ms: u64,
    },
    SampleRejected {
        total_rejected: u64,
    },
    ExtractorChanged {
        mode: ExtractorMode,
    },
}
