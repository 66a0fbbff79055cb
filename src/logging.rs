//! Tracing initialisation.
//!
//! The library itself only emits `tracing` events; installing a subscriber is
//! up to the host. [`init`] is the one the `stringlight` binary uses:
//! - Pretty, compact or JSON output
//! - `RUST_LOG` overrides the configured level
//! - Safe to call more than once
//!
//! # Example
//! ```no_run
//! use stringlight::{config::DriverConfig, logging};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DriverConfig::load()?;
//! logging::init(&config.logging)?;
//! tracing::info!("Driver starting");
//! # Ok(())
//! # }
//! ```

use crate::config::LoggingConfig;
use crate::error::{LightError, LightResult};
use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Output format for log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line with colours (for development)
    Pretty,
    /// One line per event, no colours
    #[default]
    Compact,
    /// JSON for log aggregation
    Json,
}

/// Initialise the global subscriber from the logging section.
///
/// Returns `Ok(())` if a subscriber is already installed.
pub fn init(config: &LoggingConfig) -> LightResult<()> {
    let level = parse_log_level(&config.level)?;

    // Already initialised, e.g. by a test harness or the host application
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let layer = match config.format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .with_filter(env_filter)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_ansi(false)
            .with_writer(std::io::stderr)
            .with_filter(env_filter)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(env_filter)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|e| LightError::Configuration(format!("Failed to initialize tracing: {e}")))
}

/// Parse log level string into tracing Level
fn parse_log_level(level: &str) -> LightResult<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(LightError::Configuration(format!(
            "Invalid log level '{level}'. Must be one of: trace, debug, info, warn, error"
        ))),
    }
}
