//! Fixture utilities for the deterministic CLI harness.
//!
//! This module discovers recorded sensor sessions on disk, parses optional
//! expectation JSON, and replays the sessions through a fresh
//! `ScrollEngine` via the `SensorListener` interface. It is desktop-focused
//! to support CI and tuning workflows.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::analysis::angles::ExtractorMode;
use crate::analysis::remap::DisplayRotation;
use crate::analysis::types::{AccelSample, MagneticSample, ScrollVector};
use crate::config::AppConfig;
use crate::engine::{ParamPatch, ScrollEngine, SensorListener};
use crate::error::SensorError;

/// Default location for fixture JSON assets.
pub const DEFAULT_FIXTURE_ROOT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures");

const EXPECT_SUFFIX: &str = ".expect.json";

/// Standard gravity used by synthetic sessions, in m/s^2
const GRAVITY: f32 = 9.81;

/// Metadata describing an available fixture.
#[derive(Clone, Debug)]
pub struct FixtureMetadata {
    pub name: String,
    pub path: PathBuf,
    pub expect_path: Option<PathBuf>,
}

/// One recorded host event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SensorEvent {
    Accel {
        x: f32,
        y: f32,
        z: f32,
        dt_nanos: u64,
        /// Feed the same reading this many times
        #[serde(default = "default_repeat")]
        repeat: u32,
    },
    Magnetic {
        x: f32,
        y: f32,
        z: f32,
    },
    Reset,
    Rotation {
        index: i32,
    },
}

fn default_repeat() -> u32 {
    1
}

/// Engine construction overrides for a fixture.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureSetup {
    #[serde(default)]
    pub extractor: Option<ExtractorMode>,
    #[serde(default)]
    pub history_size: Option<usize>,
    #[serde(default)]
    pub params: ParamPatch,
}

/// Recorded session as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureSession {
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub setup: FixtureSetup,
    pub events: Vec<SensorEvent>,
}

/// Loaded fixture data with its expectations.
pub struct FixtureData {
    pub metadata: FixtureMetadata,
    pub session: FixtureSession,
    pub expectations: Option<FixtureExpectations>,
}

/// JSON expectation schema for fixture verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureExpectations {
    pub fixture: String,
    #[serde(default)]
    pub notes: Option<String>,
    /// Sum of every drained movement over the session
    pub total_movement: ScrollVector,
    #[serde(default = "default_tolerance")]
    pub tolerance: f32,
    #[serde(default)]
    pub calibrated: Option<bool>,
}

fn default_tolerance() -> f32 {
    1e-3
}

impl FixtureExpectations {
    pub fn verify(&self, report: &ReplayReport) -> std::result::Result<(), ExpectationDiff> {
        let mut failures = Vec::new();

        let axes = [
            ("total_movement.x", self.total_movement.x, report.total_movement.x),
            ("total_movement.y", self.total_movement.y, report.total_movement.y),
        ];
        for (field, expected, actual) in axes {
            let delta = (actual - expected).abs();
            // NaN deltas fail too
            if !(delta <= self.tolerance) {
                failures.push(ExpectationFailure {
                    field: field.to_string(),
                    expected: serde_json::json!(expected),
                    actual: serde_json::json!(actual),
                    delta: Some(delta),
                });
            }
        }

        if let Some(calibrated) = self.calibrated {
            if calibrated != report.calibrated {
                failures.push(ExpectationFailure {
                    field: "calibrated".to_string(),
                    expected: serde_json::json!(calibrated),
                    actual: serde_json::json!(report.calibrated),
                    delta: None,
                });
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ExpectationDiff { failures })
        }
    }
}

/// Outcome of comparing a replay with expectations.
#[derive(Debug)]
pub struct ExpectationDiff {
    pub failures: Vec<ExpectationFailure>,
}

impl ExpectationDiff {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "failures": self.failures.iter().map(|failure| {
                serde_json::json!({
                    "field": failure.field,
                    "expected": failure.expected,
                    "actual": failure.actual,
                    "delta": failure.delta,
                })
            }).collect::<Vec<_>>()
        })
    }
}

/// Detailed diff entry for a single failure.
#[derive(Debug)]
pub struct ExpectationFailure {
    pub field: String,
    pub expected: serde_json::Value,
    pub actual: serde_json::Value,
    pub delta: Option<f32>,
}

/// Catalog responsible for discovering fixtures on disk.
pub struct FixtureCatalog {
    root: PathBuf,
}

impl FixtureCatalog {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List all fixtures by their metadata.
    pub fn discover(&self) -> Result<Vec<FixtureMetadata>> {
        let mut fixtures = Vec::new();
        if !self.root.exists() {
            return Ok(fixtures);
        }

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let path = entry.path();
            let is_json = path.extension().and_then(|ext| ext.to_str()) == Some("json");
            if is_json && !is_expectation(&path) {
                fixtures.push(self.metadata_for_path(&path)?);
            }
        }

        fixtures.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(fixtures)
    }

    /// Load a session + expectations for provided name or path.
    pub fn load(&self, fixture: &str, override_expect: Option<PathBuf>) -> Result<FixtureData> {
        let path = self.resolve_fixture_path(fixture)?;
        let metadata = self.metadata_for_path(&path)?;

        let json = fs::read_to_string(&path)
            .with_context(|| format!("reading fixture {}", path.display()))?;
        let session: FixtureSession =
            serde_json::from_str(&json).with_context(|| format!("parsing {}", path.display()))?;

        let expectation_path = override_expect.or(metadata.expect_path.clone());
        let expectations = match expectation_path {
            Some(path) => {
                let json = fs::read_to_string(&path)
                    .with_context(|| format!("reading expectation {}", path.display()))?;
                Some(
                    serde_json::from_str(&json)
                        .with_context(|| format!("parsing {}", path.display()))?,
                )
            }
            None => None,
        };

        log::debug!(
            "[Fixtures] Loaded {} ({} events)",
            metadata.name,
            session.events.len()
        );

        Ok(FixtureData {
            metadata,
            session,
            expectations,
        })
    }

    fn resolve_fixture_path(&self, fixture: &str) -> Result<PathBuf> {
        let as_path = Path::new(fixture);
        if as_path.is_file() {
            return Ok(as_path.to_path_buf());
        }

        let candidate = self.root.join(format!("{fixture}.json"));
        if candidate.exists() {
            Ok(candidate)
        } else {
            Err(anyhow!(
                "Fixture '{fixture}' not found in {}",
                self.root.display()
            ))
        }
    }

    fn metadata_for_path(&self, path: &Path) -> Result<FixtureMetadata> {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| anyhow!("Invalid fixture name for {}", path.display()))?
            .to_string();
        let expect_path = path.with_file_name(format!("{name}{EXPECT_SUFFIX}"));
        Ok(FixtureMetadata {
            name,
            path: path.to_path_buf(),
            expect_path: expect_path.exists().then_some(expect_path),
        })
    }
}

impl Default for FixtureCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_FIXTURE_ROOT)
    }
}

fn is_expectation(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(EXPECT_SUFFIX))
}

/// State captured after each accelerometer sample.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayFrame {
    pub index: usize,
    pub movement: ScrollVector,
    pub speed: ScrollVector,
}

/// Summary of a replayed session.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub fixture: String,
    pub accel_samples: usize,
    pub total_movement: ScrollVector,
    pub final_speed: ScrollVector,
    pub calibrated: bool,
    pub rejected_samples: usize,
    pub degenerate_samples: usize,
    pub failed_resets: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub frames: Vec<ReplayFrame>,
}

/// Replays sessions through a fresh engine per run.
pub struct FixtureReplayer {
    config: AppConfig,
    record_frames: bool,
}

impl FixtureReplayer {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            record_frames: true,
        }
    }

    /// Skip per-sample frames in the report
    pub fn without_frames(mut self) -> Self {
        self.record_frames = false;
        self
    }

    /// Build the engine a session runs against.
    pub fn engine_for(&self, setup: &FixtureSetup) -> Result<ScrollEngine> {
        let mut config = self.config.clone();
        if let Some(extractor) = setup.extractor {
            config.display.extractor = extractor;
        }
        if let Some(history_size) = setup.history_size {
            config.smoothing.history_size = history_size;
        }

        let engine = ScrollEngine::from_config(&config);
        engine
            .apply_patch(&setup.params)
            .map_err(|err| anyhow!("applying fixture params: {err}"))?;
        Ok(engine)
    }

    pub fn run(&self, name: &str, session: &FixtureSession) -> Result<ReplayReport> {
        let _span = tracing::debug_span!("replay", fixture = name).entered();
        let engine = self.engine_for(&session.setup)?;
        let listener: &dyn SensorListener = &engine;

        let mut report = ReplayReport {
            fixture: name.to_string(),
            accel_samples: 0,
            total_movement: ScrollVector::ZERO,
            final_speed: ScrollVector::ZERO,
            calibrated: false,
            rejected_samples: 0,
            degenerate_samples: 0,
            failed_resets: 0,
            frames: Vec::new(),
        };

        for event in &session.events {
            match *event {
                SensorEvent::Accel {
                    x,
                    y,
                    z,
                    dt_nanos,
                    repeat,
                } => {
                    for _ in 0..repeat {
                        match listener.on_acceleration_changed(AccelSample::new(x, y, z, dt_nanos))
                        {
                            Ok(()) => {}
                            Err(SensorError::NonFiniteSample) => report.rejected_samples += 1,
                            Err(SensorError::DegenerateOrientation) => {
                                report.degenerate_samples += 1
                            }
                            Err(err) => return Err(anyhow!("replaying {name}: {err}")),
                        }

                        let movement = engine.get_movement().map_err(|err| anyhow!("{err}"))?;
                        let speed = engine.get_speed().map_err(|err| anyhow!("{err}"))?;
                        report.total_movement.x += movement.x;
                        report.total_movement.y += movement.y;
                        if self.record_frames {
                            report.frames.push(ReplayFrame {
                                index: report.accel_samples,
                                movement,
                                speed,
                            });
                        }
                        report.accel_samples += 1;
                    }
                }
                SensorEvent::Magnetic { x, y, z } => {
                    listener
                        .on_magnetic_field_changed(MagneticSample::new(x, y, z))
                        .map_err(|err| anyhow!("replaying {name}: {err}"))?;
                }
                SensorEvent::Reset => {
                    if engine.reset_state().is_err() {
                        report.failed_resets += 1;
                    }
                }
                SensorEvent::Rotation { index } => match DisplayRotation::from_index(index) {
                    Some(rotation) => engine
                        .set_display_rotation(rotation)
                        .map_err(|err| anyhow!("{err}"))?,
                    None => log::warn!("[Fixtures] Skipping invalid rotation index {}", index),
                },
            }
        }

        report.final_speed = engine.get_speed().map_err(|err| anyhow!("{err}"))?;
        report.calibrated = engine.is_calibrated().map_err(|err| anyhow!("{err}"))?;

        log::info!(
            "[Fixtures] Replayed {}: {} samples, movement=({:.5}, {:.5})",
            name,
            report.accel_samples,
            report.total_movement.x,
            report.total_movement.y
        );
        Ok(report)
    }
}

/// Build a constant-tilt session: `history_size` flat samples to calibrate,
/// then `samples` readings tilted by the given angles.
///
/// Tilts are in degrees, positive toward +x / +y, and sized so the gravity
/// angle extractor reports exactly these angles.
pub fn synthetic_tilt(
    tilt_x_deg: f32,
    tilt_y_deg: f32,
    samples: u32,
    rate_hz: f32,
    history_size: usize,
) -> FixtureSession {
    let dt_nanos = if rate_hz > 0.0 {
        (1.0e9 / rate_hz).round() as u64
    } else {
        0
    };

    let x = GRAVITY * tilt_x_deg.to_radians().sin();
    let y = GRAVITY * tilt_y_deg.to_radians().sin();
    let z = (GRAVITY * GRAVITY - x * x - y * y).max(0.0).sqrt();

    FixtureSession {
        notes: Some(format!(
            "synthetic tilt x={tilt_x_deg} deg, y={tilt_y_deg} deg at {rate_hz} Hz"
        )),
        setup: FixtureSetup {
            history_size: Some(history_size),
            ..FixtureSetup::default()
        },
        events: vec![
            SensorEvent::Accel {
                x: 0.0,
                y: 0.0,
                z: GRAVITY,
                dt_nanos,
                repeat: history_size.max(1) as u32,
            },
            SensorEvent::Accel {
                x,
                y,
                z,
                dt_nanos,
                repeat: samples,
            },
        ],
    }
}
