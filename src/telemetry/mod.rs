//! Diagnostics telemetry collector and helpers.
//!
//! The collector multiplexes calibration, rejection and mode-change events
//! into a bounded history plus a broadcast stream.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use once_cell::sync::Lazy;
use tokio::sync::broadcast;

use crate::analysis::angles::ExtractorMode;
use crate::analysis::types::AnglePair;

pub mod events;

pub use events::{CalibrationTrigger, EngineEvent};

/// Global telemetry hub shared across the crate.
static HUB: Lazy<TelemetryHub> = Lazy::new(TelemetryHub::default);

/// Access the global telemetry hub.
pub fn hub() -> &'static TelemetryHub {
    &HUB
}

/// Snapshot of collector state for CLI/bridge reporting.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TelemetrySnapshot {
    pub recent: Vec<EngineEvent>,
    pub total_events: u64,
    pub dropped_events: u64,
}

/// Broadcast-based collector retaining a bounded history of events.
pub struct TelemetryCollector {
    tx: broadcast::Sender<EngineEvent>,
    history: Mutex<VecDeque<EngineEvent>>,
    history_capacity: usize,
    total_events: AtomicU64,
    dropped_history: AtomicU64,
}

impl TelemetryCollector {
    pub fn new(buffer: usize, history_capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer.max(1));
        Self {
            tx,
            history: Mutex::new(VecDeque::with_capacity(history_capacity)),
            history_capacity,
            total_events: AtomicU64::new(0),
            dropped_history: AtomicU64::new(0),
        }
    }

    pub fn publish(&self, event: EngineEvent) {
        self.total_events.fetch_add(1, Ordering::Relaxed);
        {
            let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
            if history.len() == self.history_capacity {
                history.pop_front();
                self.dropped_history.fetch_add(1, Ordering::Relaxed);
            }
            if self.history_capacity > 0 {
                history.push_back(event.clone());
            }
        }

        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        let history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        TelemetrySnapshot {
            recent: history.iter().cloned().collect(),
            total_events: self.total_events.load(Ordering::Relaxed),
            dropped_events: self.dropped_history.load(Ordering::Relaxed),
        }
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new(256, 64)
    }
}

/// Top-level hub wrapping the collector plus derived counters.
pub struct TelemetryHub {
    collector: TelemetryCollector,
    rejected_samples: AtomicU64,
}

impl TelemetryHub {
    pub fn new(channel_capacity: usize, history_capacity: usize) -> Self {
        Self {
            collector: TelemetryCollector::new(channel_capacity, history_capacity),
            rejected_samples: AtomicU64::new(0),
        }
    }

    pub fn collector(&self) -> &TelemetryCollector {
        &self.collector
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        self.collector.snapshot()
    }

    pub fn record_calibration(&self, reference: &AnglePair, trigger: CalibrationTrigger) {
        self.collector.publish(EngineEvent::Calibrated {
            vertical: reference.vertical,
            horizontal: reference.horizontal,
            trigger,
            timestamp_ms: now_timestamp_ms(),
        });
    }

    pub fn record_reset_rejected(&self, code: i32) {
        self.collector.publish(EngineEvent::ResetRejected { code });
    }

    /// Record the start of a run of degenerate poses.
    ///
    /// Callers report once per run, not once per sample.
    pub fn record_degenerate_pose(&self) {
        self.collector.publish(EngineEvent::DegenerateOrientation {
            timestamp_ms: now_timestamp_ms(),
        });
    }

    pub fn record_rejected_sample(&self) {
        let total_rejected = self.rejected_samples.fetch_add(1, Ordering::Relaxed) + 1;
        self.collector
            .publish(EngineEvent::SampleRejected { total_rejected });
    }

    pub fn record_extractor_change(&self, mode: ExtractorMode) {
        self.collector.publish(EngineEvent::ExtractorChanged { mode });
    }
}

impl Default for TelemetryHub {
    fn default() -> Self {
        Self::new(256, 64)
    }
}

fn now_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collector_preserves_order_within_history() {
        let collector = TelemetryCollector::new(8, 3);
        collector.publish(EngineEvent::ResetRejected { code: 2001 });
        collector.publish(EngineEvent::ExtractorChanged {
            mode: ExtractorMode::OrientationFusion,
        });
        collector.publish(EngineEvent::SampleRejected { total_rejected: 1 });

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.recent.len(), 3);
        assert!(matches!(
            snapshot.recent[0],
            EngineEvent::ResetRejected { code: 2001 }
        ));
        assert!(matches!(
            snapshot.recent[2],
            EngineEvent::SampleRejected { .. }
        ));
    }

    #[test]
    fn collector_drops_history_when_full() {
        let collector = TelemetryCollector::new(8, 2);
        for code in [1, 2, 3] {
            collector.publish(EngineEvent::ResetRejected { code });
        }

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.recent.len(), 2);
        assert_eq!(snapshot.total_events, 3);
        assert_eq!(snapshot.dropped_events, 1);
        assert!(matches!(
            snapshot.recent[0],
            EngineEvent::ResetRejected { code: 2 }
        ));
    }

    #[test]
    fn subscribers_receive_published_events() {
        let hub = TelemetryHub::new(8, 8);
        let mut rx = hub.collector().subscribe();

        hub.record_calibration(&AnglePair::new(0.1, -0.2), CalibrationTrigger::Reset);

        match rx.try_recv() {
            Ok(EngineEvent::Calibrated {
                vertical,
                horizontal,
                trigger,
                ..
            }) => {
                assert!((vertical - 0.1).abs() < f32::EPSILON);
                assert!((horizontal + 0.2).abs() < f32::EPSILON);
                assert_eq!(trigger, CalibrationTrigger::Reset);
            }
            other => panic!("Expected Calibrated event, got: {:?}", other),
        }
    }

    #[test]
    fn rejected_samples_are_counted() {
        let hub = TelemetryHub::new(8, 8);
        hub.record_rejected_sample();
        hub.record_rejected_sample();

        let snapshot = hub.snapshot();
        assert!(matches!(
            snapshot.recent.last(),
            Some(EngineEvent::SampleRejected { total_rejected: 2 })
        ));
    }

    #[test]
    fn snapshot_serializes_tagged_events() {
        let hub = TelemetryHub::new(8, 8);
        hub.record_extractor_change(ExtractorMode::GravityAngle);

        let json = serde_json::to_string(&hub.snapshot()).unwrap();
        assert!(json.contains("\"type\":\"extractor_changed\""));
        assert!(json.contains("\"gravity_angle\""));
    }
}
