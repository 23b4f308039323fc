// Tilt Scroll Core - accelerometer-driven scrolling engine
// Turns tilt into spring-damped scroll speed and displacement

// Module declarations
pub mod analysis;
pub mod api;
pub mod calibration;
pub mod config;
pub mod engine;
pub mod error;
pub mod fixtures;
pub mod telemetry;

// Re-exports for convenience
pub use analysis::{AccelSample, DisplayRotation, ExtractorMode, MagneticSample, ScrollVector};
pub use engine::{ParamPatch, ScrollEngine, SensorListener};
pub use error::{CalibrationError, SensorError};

use once_cell::sync::OnceCell;

static LOGGING: OnceCell<()> = OnceCell::new();

cfg_if::cfg_if! {
    if #[cfg(target_os = "android")] {
        fn install_subscriber() {
            use tracing_subscriber::prelude::*;

            match tracing_android::layer("TiltScroll") {
                Ok(layer) => {
                    let _ = tracing_subscriber::registry().with(layer).try_init();
                }
                Err(err) => eprintln!("TiltScroll: android log layer unavailable: {err}"),
            }
        }
    } else {
        fn install_subscriber() {
            let _ = tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .try_init();
        }
    }
}

/// Install the log subscriber (logcat on Android, stderr elsewhere).
///
/// `log` records are bridged into the same sink. Repeated calls are ignored,
/// as is an already-installed global subscriber.
pub fn init_logging() {
    LOGGING.get_or_init(install_subscriber);
}
