use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tilt_scroll::analysis::ExtractorMode;
use tilt_scroll::config::AppConfig;
use tilt_scroll::fixtures::{
    synthetic_tilt, ExpectationDiff, FixtureCatalog, FixtureReplayer, ReplayReport, SensorEvent,
};

#[derive(Parser, Debug)]
#[command(
    name = "tilt_cli",
    about = "Deterministic sensor replay harness for the tilt scroll engine"
)]
struct Cli {
    /// Override directory containing fixture sessions (defaults to ./fixtures)
    #[arg(long)]
    fixtures_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a recorded session and optionally compare against expectations
    Replay {
        #[arg(long)]
        fixture: String,
        #[arg(long)]
        expect: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
        /// Engine config JSON (defaults apply when omitted)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Hold a constant synthetic tilt and report the resulting motion
    Simulate {
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        tilt_x_deg: f32,
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        tilt_y_deg: f32,
        #[arg(long, default_value_t = 100)]
        samples: u32,
        #[arg(long, default_value_t = 50.0)]
        rate_hz: f32,
        #[arg(long, value_enum, default_value_t = ExtractorArg::GravityAngle)]
        extractor: ExtractorArg,
    },
    /// List available fixtures on disk
    DumpFixtures,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ExtractorArg {
    GravityAngle,
    OrientationFusion,
}

impl From<ExtractorArg> for ExtractorMode {
    fn from(arg: ExtractorArg) -> Self {
        match arg {
            ExtractorArg::GravityAngle => ExtractorMode::GravityAngle,
            ExtractorArg::OrientationFusion => ExtractorMode::OrientationFusion,
        }
    }
}

fn main() -> ExitCode {
    tilt_scroll::init_logging();

    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let catalog = cli
        .fixtures_dir
        .map(FixtureCatalog::new)
        .unwrap_or_else(FixtureCatalog::default);

    match cli.command {
        Commands::Replay {
            fixture,
            expect,
            output,
            config,
        } => run_replay(&catalog, &fixture, expect, output, config),
        Commands::Simulate {
            tilt_x_deg,
            tilt_y_deg,
            samples,
            rate_hz,
            extractor,
        } => run_simulate(tilt_x_deg, tilt_y_deg, samples, rate_hz, extractor.into()),
        Commands::DumpFixtures => run_dump(&catalog),
    }
}

fn run_replay(
    catalog: &FixtureCatalog,
    fixture: &str,
    override_expect: Option<PathBuf>,
    output_path: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<ExitCode> {
    let config = config_path
        .map(AppConfig::load_from_file)
        .unwrap_or_default();
    let data = catalog.load(fixture, override_expect)?;
    let report = FixtureReplayer::new(config)
        .run(&data.metadata.name, &data.session)
        .with_context(|| format!("replaying fixture {}", fixture))?;

    emit_report(&report, output_path)?;

    if let Some(expectations) = data.expectations {
        match expectations.verify(&report) {
            Ok(()) => Ok(ExitCode::from(0)),
            Err(diff) => {
                emit_diff(&diff)?;
                Ok(ExitCode::from(2))
            }
        }
    } else {
        Ok(ExitCode::from(0))
    }
}

fn run_simulate(
    tilt_x_deg: f32,
    tilt_y_deg: f32,
    samples: u32,
    rate_hz: f32,
    extractor: ExtractorMode,
) -> Result<ExitCode> {
    let config = AppConfig::default();
    let mut session = synthetic_tilt(
        tilt_x_deg,
        tilt_y_deg,
        samples,
        rate_hz,
        config.smoothing.history_size,
    );
    session.setup.extractor = Some(extractor);
    if extractor == ExtractorMode::OrientationFusion {
        // Fixed mid-latitude field so fusion has a heading to work with
        session.events.insert(
            0,
            SensorEvent::Magnetic {
                x: 0.0,
                y: 22.0,
                z: -42.0,
            },
        );
    }

    let report = FixtureReplayer::new(config)
        .without_frames()
        .run("simulate", &session)?;

    let summary = SimulationSummary {
        tilt_x_deg,
        tilt_y_deg,
        rate_hz,
        extractor,
        report: &report,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(ExitCode::from(0))
}

fn run_dump(catalog: &FixtureCatalog) -> Result<ExitCode> {
    let fixtures = catalog.discover()?;
    if fixtures.is_empty() {
        println!("No fixtures found under {}", catalog.root().display());
        return Ok(ExitCode::from(0));
    }

    for metadata in fixtures {
        if let Some(expect) = metadata.expect_path {
            println!("{} -> {}", metadata.name, expect.display());
        } else {
            println!("{}", metadata.name);
        }
    }
    Ok(ExitCode::from(0))
}

fn emit_report(report: &ReplayReport, output_path: Option<PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;

    if let Some(path) = output_path {
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    } else {
        println!("{json}");
    }

    Ok(())
}

fn emit_diff(diff: &ExpectationDiff) -> Result<()> {
    let json = serde_json::to_string_pretty(&diff.to_json())?;
    eprintln!("{json}");
    Ok(())
}

#[derive(Serialize)]
struct SimulationSummary<'a> {
    tilt_x_deg: f32,
    tilt_y_deg: f32,
    rate_hz: f32,
    extractor: ExtractorMode,
    report: &'a ReplayReport,
}
