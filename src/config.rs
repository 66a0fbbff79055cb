//! Driver configuration using Figment
//!
//! Configuration is layered, later sources overriding earlier ones:
//! 1. Built-in defaults (19200 baud, 3 retries, 20 ms settle window)
//! 2. `config/stringlight.toml` (or a file passed to [`DriverConfig::load_from`])
//! 3. Environment variables prefixed with `STRINGLIGHT_`, nested keys split
//!    on `__`
//!
//! # Example
//! ```no_run
//! use stringlight::config::DriverConfig;
//!
//! // STRINGLIGHT_PORT__BAUD_RATE=9600 overrides port.baud_rate
//! let config = DriverConfig::load()?;
//! config.validate()?;
//! println!("Baud rate: {}", config.port.baud_rate);
//! # Ok::<(), stringlight::LightError>(())
//! ```

use crate::device::ColorModePolicy;
use crate::engine::{EngineSettings, Framing, DEFAULT_MAX_RETRIES, DEFAULT_SETTLE_TIMEOUT};
use crate::error::{LightError, LightResult};
use crate::logging::LogFormat;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/stringlight.toml";

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "STRINGLIGHT_";

/// Baud rate of the current firmware revision.
pub const DEFAULT_BAUD_RATE: u32 = 19200;

/// Top-level driver configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Serial port selection
    pub port: PortConfig,
    /// Request/response behaviour
    pub protocol: ProtocolConfig,
    /// Log output
    pub logging: LoggingConfig,
}

/// Serial port settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortConfig {
    /// Explicit device path or by-id name. When absent the port is discovered.
    pub path: Option<String>,
    /// Line speed
    pub baud_rate: u32,
    /// Where to look when `path` is not set
    pub discovery: DiscoveryConfig,
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            path: None,
            baud_rate: DEFAULT_BAUD_RATE,
            discovery: DiscoveryConfig::default(),
        }
    }
}

/// Device directory scan settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Directory to scan
    pub dir: PathBuf,
    /// Accepted device name prefixes
    pub patterns: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("/dev"),
            patterns: vec!["ttyUSB".to_string(), "ttyACM".to_string()],
        }
    }
}

/// Protocol timing and policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Settle window in milliseconds
    pub settle_timeout_ms: u64,
    /// Reply framing strategy
    pub framing: Framing,
    /// Whether colour changes force solid mode
    pub color_mode_policy: ColorModePolicy,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            settle_timeout_ms: DEFAULT_SETTLE_TIMEOUT.as_millis() as u64,
            framing: Framing::default(),
            color_mode_policy: ColorModePolicy::default(),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl DriverConfig {
    /// Load configuration from `config/stringlight.toml` and environment variables
    ///
    /// A missing file is not an error; defaults and environment still apply.
    pub fn load() -> LightResult<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific file path
    pub fn load_from<P: AsRef<Path>>(path: P) -> LightResult<Self> {
        let config = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> LightResult<()> {
        if self.port.baud_rate == 0 {
            return Err(LightError::Configuration(
                "port.baud_rate must be greater than 0".to_string(),
            ));
        }

        if self.protocol.settle_timeout_ms == 0 {
            return Err(LightError::Configuration(
                "protocol.settle_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if let Some(path) = &self.port.path {
            if path.trim().is_empty() {
                return Err(LightError::Configuration(
                    "port.path must not be empty when set".to_string(),
                ));
            }
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(LightError::Configuration(format!(
                "Invalid logging.level '{}'. Must be one of: {}",
                self.logging.level,
                valid_levels.join(", ")
            )));
        }

        Ok(())
    }

    /// Engine settings derived from the protocol section.
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings::default()
            .with_max_retries(self.protocol.max_retries)
            .with_settle_timeout(Duration::from_millis(self.protocol.settle_timeout_ms))
            .with_framing(self.protocol.framing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn toml_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    #[serial]
    fn missing_file_gives_defaults() {
        let config = DriverConfig::load_from("/nonexistent/stringlight.toml").unwrap();
        assert_eq!(config, DriverConfig::default());
        assert_eq!(config.port.baud_rate, 19200);
        assert_eq!(config.protocol.max_retries, 3);
        assert_eq!(config.protocol.settle_timeout_ms, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn file_overrides_defaults() {
        let file = toml_file(
            r#"
            [port]
            path = "/dev/ttyACM3"
            baud_rate = 9600

            [protocol]
            max_retries = 1
            framing = "deadline"
            color_mode_policy = "force_solid"

            [logging]
            level = "debug"
            format = "json"
            "#,
        );

        let config = DriverConfig::load_from(file.path()).unwrap();
        assert_eq!(config.port.path.as_deref(), Some("/dev/ttyACM3"));
        assert_eq!(config.port.baud_rate, 9600);
        assert_eq!(config.port.discovery, DiscoveryConfig::default());
        assert_eq!(config.protocol.max_retries, 1);
        assert_eq!(config.protocol.settle_timeout_ms, 20);
        assert_eq!(config.protocol.framing, Framing::Deadline);
        assert_eq!(config.protocol.color_mode_policy, ColorModePolicy::ForceSolid);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    #[serial]
    fn env_overrides_file() {
        let file = toml_file("[port]\nbaud_rate = 9600\n");
        std::env::set_var("STRINGLIGHT_PORT__BAUD_RATE", "57600");
        std::env::set_var("STRINGLIGHT_PROTOCOL__SETTLE_TIMEOUT_MS", "35");

        let result = DriverConfig::load_from(file.path());

        std::env::remove_var("STRINGLIGHT_PORT__BAUD_RATE");
        std::env::remove_var("STRINGLIGHT_PROTOCOL__SETTLE_TIMEOUT_MS");

        let config = result.unwrap();
        assert_eq!(config.port.baud_rate, 57600);
        assert_eq!(config.protocol.settle_timeout_ms, 35);
    }

    #[test]
    #[serial]
    fn bad_value_type_is_config_error() {
        let file = toml_file("[port]\nbaud_rate = \"fast\"\n");
        let err = DriverConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, LightError::Config(_)));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = DriverConfig::default();
        config.port.baud_rate = 0;
        assert!(config.validate().is_err());

        let mut config = DriverConfig::default();
        config.protocol.settle_timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = DriverConfig::default();
        config.port.path = Some("  ".to_string());
        assert!(config.validate().is_err());

        let mut config = DriverConfig::default();
        config.logging.level = "verbose".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("verbose"));
    }

    #[test]
    fn engine_settings_follow_protocol_section() {
        let mut config = DriverConfig::default();
        config.protocol.max_retries = 5;
        config.protocol.settle_timeout_ms = 50;
        config.protocol.framing = Framing::Deadline;

        let settings = config.engine_settings();
        assert_eq!(settings.max_retries, 5);
        assert_eq!(settings.settle_timeout, Duration::from_millis(50));
        assert_eq!(settings.framing, Framing::Deadline);
    }
}
