//! Integration tests for the scroll engine public surface
//!
//! These tests drive `ScrollEngine` end to end the way a host does:
//! - Warm-up gating and drain semantics
//! - Spring-back decay and speed saturation
//! - Display rotation read-out
//! - Concurrent producer/reader drain accounting

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use tilt_scroll::analysis::{remap, DisplayRotation, ExtractorMode};
use tilt_scroll::config::AppConfig;
use tilt_scroll::{AccelSample, CalibrationError, ScrollEngine, ScrollVector};

const DT_NANOS: u64 = 20_000_000;

fn flat() -> AccelSample {
    AccelSample::new(0.0, 0.0, 9.81, DT_NANOS)
}

fn tilted(x: f32, y: f32) -> AccelSample {
    let z = (9.81f32 * 9.81 - x * x - y * y).max(0.0).sqrt();
    AccelSample::new(x, y, z, DT_NANOS)
}

fn calibrated_engine() -> ScrollEngine {
    let engine = ScrollEngine::new();
    engine.on_sample(flat()).unwrap();
    engine.on_sample(flat()).unwrap();
    engine
}

/// Engine configured like the reference scenario, before any sample
fn scenario_engine() -> ScrollEngine {
    let engine = ScrollEngine::new();
    engine.set_threshold(0.03).unwrap();
    engine.set_max_speed(100.0).unwrap();
    engine.set_min_speed(30.0).unwrap();
    engine.set_springness(1.5).unwrap();
    engine
}

#[test]
fn test_scenario_small_tilt_moves_right() {
    let engine = scenario_engine();
    engine.on_sample(AccelSample::new(0.0, 0.0, 9.8, 0)).unwrap();
    engine.on_sample(AccelSample::new(0.0, 0.0, 9.8, 0)).unwrap();
    engine
        .on_sample(AccelSample::new(1.0, 0.0, 9.8, 100_000_000))
        .unwrap();

    let movement = engine.get_movement().unwrap();
    assert!(
        (movement.x - 0.0145656).abs() < 1e-5,
        "unexpected x movement {}",
        movement.x
    );
    assert_eq!(movement.y, 0.0);
    assert!((engine.get_speed().unwrap().x - 0.145656).abs() < 1e-4);
}

#[test]
fn test_scenario_with_unscaled_max_speed() {
    let mut config = AppConfig::default();
    config.scroll.threshold = 0.03;
    config.scroll.min_speed = 30.0;

    let engine = ScrollEngine::from_config(&config);
    engine.on_sample(AccelSample::new(0.0, 0.0, 9.8, 0)).unwrap();
    engine.on_sample(AccelSample::new(0.0, 0.0, 9.8, 0)).unwrap();
    engine
        .on_sample(AccelSample::new(1.0, 0.0, 9.8, 100_000_000))
        .unwrap();

    let movement = engine.get_movement().unwrap();
    assert!((movement.x - 0.0149928).abs() < 1e-5);
    assert_eq!(movement.y, 0.0);
}

#[test]
fn test_drain_returns_zero_second_time() {
    let engine = calibrated_engine();
    for _ in 0..25 {
        engine.on_sample(tilted(2.0, -3.0)).unwrap();
    }

    let first = engine.get_movement().unwrap();
    assert!(first.x > 0.0);
    assert!(first.y < 0.0);
    assert_eq!(engine.get_movement().unwrap(), ScrollVector::new(0.0, 0.0));
}

#[test]
fn test_warm_up_gating() {
    let engine = ScrollEngine::with_history_size(5);
    for collected in 0..4 {
        assert!(matches!(
            engine.reset_state(),
            Err(CalibrationError::NotReady { required: 5, collected: c }) if c == collected
        ));
        engine.on_sample(flat()).unwrap();
    }

    engine.on_sample(flat()).unwrap();
    assert!(engine.reset_state().is_ok());
}

#[test]
fn test_reset_zeroes_motion() {
    let engine = calibrated_engine();
    for _ in 0..30 {
        engine.on_sample(tilted(3.0, 3.0)).unwrap();
    }
    assert!(!engine.get_speed().unwrap().x.eq(&0.0));

    engine.reset_state().unwrap();
    assert_eq!(engine.get_speed().unwrap(), ScrollVector::new(0.0, 0.0));
    assert_eq!(engine.get_movement().unwrap(), ScrollVector::new(0.0, 0.0));
}

#[test]
fn test_speed_decays_without_sign_change() {
    let engine = calibrated_engine();
    for _ in 0..40 {
        engine.on_sample(tilted(3.0, 0.0)).unwrap();
    }
    // Flush the tilted readings out of the smoothing buffer
    engine.on_sample(flat()).unwrap();
    engine.on_sample(flat()).unwrap();

    let mut previous = engine.get_speed().unwrap().x;
    assert!(previous > 0.0);
    for _ in 0..200 {
        engine.on_sample(flat()).unwrap();
        let speed = engine.get_speed().unwrap().x;
        assert!(speed >= 0.0, "speed flipped sign: {}", speed);
        assert!(speed < previous, "speed did not decay: {} -> {}", previous, speed);
        previous = speed;
    }
}

#[test]
fn test_speed_saturates_below_max_speed() {
    let engine = calibrated_engine();
    let max_speed = engine.max_speed().unwrap();

    for _ in 0..3000 {
        engine
            .on_sample(AccelSample::new(9.81, 0.0, 0.0, DT_NANOS))
            .unwrap();
        let speed = engine.get_speed().unwrap().x;
        assert!(speed <= max_speed, "{} exceeds {}", speed, max_speed);
    }

    assert!(engine.get_speed().unwrap().x > 0.9 * max_speed);
}

#[test]
fn test_rotation_exactness() {
    let v = ScrollVector::new(3.0, -2.0);
    let mode = ExtractorMode::GravityAngle;
    let cases = [
        (DisplayRotation::Rotation0, ScrollVector::new(3.0, -2.0)),
        (DisplayRotation::Rotation90, ScrollVector::new(2.0, 3.0)),
        (DisplayRotation::Rotation180, ScrollVector::new(-3.0, 2.0)),
        (DisplayRotation::Rotation270, ScrollVector::new(-2.0, -3.0)),
    ];
    for (rotation, expected) in cases {
        assert_eq!(remap(v, rotation, false, mode), expected);
    }
}

#[test]
fn test_rotation_applies_on_read_only() {
    let engine = calibrated_engine();
    engine
        .set_display_rotation(DisplayRotation::Rotation180)
        .unwrap();
    for _ in 0..20 {
        engine.on_sample(tilted(3.0, 0.0)).unwrap();
    }

    assert!(engine.get_speed().unwrap().x > 0.0);
    assert!(engine.get_movement().unwrap().x < 0.0);
}

#[test]
fn test_concurrent_drain_accounts_for_all_movement() {
    let samples: Vec<AccelSample> = (0..2000)
        .map(|i| {
            let phase = i as f32 / 150.0;
            tilted(4.0 * phase.sin(), 3.0 * (phase * 0.7).cos())
        })
        .collect();

    let reference = calibrated_engine();
    for sample in &samples {
        reference.on_sample(*sample).unwrap();
    }
    let expected = reference.get_movement().unwrap();

    let engine = calibrated_engine();
    let done = Arc::new(AtomicBool::new(false));

    let reader = {
        let engine = engine.clone();
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut total = ScrollVector::new(0.0, 0.0);
            while !done.load(Ordering::Acquire) {
                let movement = engine.get_movement().unwrap();
                total.x += movement.x;
                total.y += movement.y;
                thread::yield_now();
            }
            total
        })
    };

    let producer = {
        let engine = engine.clone();
        let samples = samples.clone();
        thread::spawn(move || {
            for sample in samples {
                engine.on_sample(sample).unwrap();
            }
        })
    };

    producer.join().unwrap();
    done.store(true, Ordering::Release);
    let mut total = reader.join().unwrap();
    let rest = engine.get_movement().unwrap();
    total.x += rest.x;
    total.y += rest.y;

    let tolerance_x = 1e-3 * expected.x.abs().max(1.0);
    let tolerance_y = 1e-3 * expected.y.abs().max(1.0);
    assert!(
        (total.x - expected.x).abs() < tolerance_x,
        "x: drained {} vs expected {}",
        total.x,
        expected.x
    );
    assert!(
        (total.y - expected.y).abs() < tolerance_y,
        "y: drained {} vs expected {}",
        total.y,
        expected.y
    );
    assert_eq!(engine.get_speed().unwrap(), reference.get_speed().unwrap());
}
