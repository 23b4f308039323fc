//! Engine module housing the thread-safe scroll core.
//!
//! `core` exposes `ScrollEngine`, the only type callers need; `state` holds
//! the lock-free pipeline logic it wraps, `params` the tunables and patches,
//! and `listener` the push interface sensor sources feed.

pub mod core;
pub mod listener;
pub mod params;
pub mod state;

pub use core::ScrollEngine;
pub use listener::SensorListener;
pub use params::{ParamPatch, ScrollParameters};
pub use state::SampleOutcome;
