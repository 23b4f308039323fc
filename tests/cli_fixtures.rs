use std::path::PathBuf;
use std::process::Command;

use serde_json::Value;

fn cli() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_tilt_cli"));
    command.current_dir(env!("CARGO_MANIFEST_DIR"));
    command
}

fn fixture_file(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join(name)
        .to_string_lossy()
        .into_owned()
}

#[test]
fn replay_fixture_succeeds() {
    let output = cli()
        .args(["replay", "--fixture", "tilt_right"])
        .output()
        .expect("failed to run tilt_cli replay");
    assert!(
        output.status.success(),
        "CLI exited with {:?}",
        output.status.code()
    );

    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    let json: Value = serde_json::from_str(stdout.trim()).expect("replay report JSON payload");
    assert_eq!(json["fixture"], "tilt_right");
    assert!(
        json["total_movement"]["x"].as_f64().unwrap_or_default() > 0.0,
        "expected rightward movement"
    );
    assert_eq!(json["calibrated"], true);
}

#[test]
fn replay_fixture_detects_mismatch() {
    let output = cli()
        .args([
            "replay",
            "--fixture",
            "tilt_right",
            "--expect",
            &fixture_file("tilt_right_incorrect.expect.json"),
        ])
        .output()
        .expect("failed to run mismatch replay");
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8(output.stderr).expect("stderr UTF-8");
    assert!(
        stderr.contains("\"failures\""),
        "expected diff JSON in stderr, got {stderr}"
    );
}

#[test]
fn replay_every_fixture_matches_expectations() {
    for fixture in [
        "tilt_right",
        "flat_hold",
        "rotated_forward_tilt",
        "fusion_hand_tilt",
    ] {
        let output = cli()
            .args(["replay", "--fixture", fixture])
            .output()
            .expect("failed to run tilt_cli replay");
        assert!(
            output.status.success(),
            "{fixture} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
    }
}

#[test]
fn dump_fixtures_lists_assets() {
    let output = cli()
        .arg("dump-fixtures")
        .output()
        .expect("failed to run dump-fixtures");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    assert!(
        stdout.contains("tilt_right"),
        "expected fixture listing, got {stdout}"
    );
    assert!(
        !stdout.contains("tilt_right_incorrect"),
        "expectation files must not be listed as fixtures, got {stdout}"
    );
}

#[test]
fn simulate_reports_motion_in_tilt_direction() {
    let output = cli()
        .args(["simulate", "--tilt-x-deg", "20", "--tilt-y-deg", "-15"])
        .output()
        .expect("failed to run simulate");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    let json: Value = serde_json::from_str(stdout.trim()).expect("simulation JSON payload");
    assert_eq!(json["extractor"], "gravity_angle");
    assert!(json["report"]["total_movement"]["x"].as_f64().unwrap_or_default() > 0.0);
    assert!(json["report"]["total_movement"]["y"].as_f64().unwrap_or_default() < 0.0);
}
