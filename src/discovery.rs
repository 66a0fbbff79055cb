//! Serial port discovery.
//!
//! Kept outside the driver core: the engine only ever sees a port identifier.
//! Two ways to get one:
//!
//! - [`resolve_port`] turns a configured path (direct device path, by-id
//!   symlink or short by-id name) into a canonical device path.
//! - [`DirectoryScan`] lists device nodes whose names start with one of a set
//!   of patterns, e.g. `ttyUSB` and `ttyACM` under `/dev`.
//!
//! ```rust,ignore
//! use stringlight::discovery::{first_port, DirectoryScan};
//!
//! let port = first_port(&DirectoryScan::default())?;
//! ```

use crate::config::DiscoveryConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Directory holding udev's stable serial symlinks.
const BY_ID_DIR: &str = "/dev/serial/by-id";

/// Errors that can occur during port discovery.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The specified port path does not exist.
    #[error("Port not found: {0}")]
    PortNotFound(String),

    /// Discovery ran but found no candidate device.
    #[error("No serial port found ({0})")]
    NoMatch(String),

    /// The directory to scan does not exist.
    #[error("Device directory not available: {0}")]
    DirectoryUnavailable(String),

    /// IO error during discovery.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Source of candidate port identifiers.
pub trait PortDiscovery {
    /// All candidates, best first.
    fn discover(&self) -> Result<Vec<String>, DiscoveryError>;

    /// Short description used in error messages.
    fn describe(&self) -> String {
        "port discovery".to_string()
    }
}

/// Finds ports by scanning a device directory for name prefixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryScan {
    /// Directory to list.
    pub dir: PathBuf,
    /// Accepted file name prefixes.
    pub patterns: Vec<String>,
}

impl Default for DirectoryScan {
    fn default() -> Self {
        Self::from(&DiscoveryConfig::default())
    }
}

impl DirectoryScan {
    /// Scan `dir` for names starting with any of `patterns`.
    pub fn new(dir: impl Into<PathBuf>, patterns: Vec<String>) -> Self {
        Self {
            dir: dir.into(),
            patterns,
        }
    }

    fn matches(&self, name: &str) -> bool {
        self.patterns.iter().any(|p| name.starts_with(p.as_str()))
    }
}

impl From<&DiscoveryConfig> for DirectoryScan {
    fn from(config: &DiscoveryConfig) -> Self {
        Self::new(config.dir.clone(), config.patterns.clone())
    }
}

impl PortDiscovery for DirectoryScan {
    fn discover(&self) -> Result<Vec<String>, DiscoveryError> {
        if !self.dir.is_dir() {
            return Err(DiscoveryError::DirectoryUnavailable(
                self.dir.to_string_lossy().into_owned(),
            ));
        }

        let mut ports = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            if self.matches(&name.to_string_lossy()) {
                ports.push(entry.path().to_string_lossy().into_owned());
            }
        }

        // Sort for consistent ordering
        ports.sort();
        debug!(dir = %self.dir.display(), found = ports.len(), "Scanned for serial ports");
        Ok(ports)
    }

    fn describe(&self) -> String {
        format!("{} matching {:?}", self.dir.display(), self.patterns)
    }
}

/// First port reported by `discovery`.
pub fn first_port(discovery: &dyn PortDiscovery) -> Result<String, DiscoveryError> {
    discovery
        .discover()?
        .into_iter()
        .next()
        .ok_or_else(|| DiscoveryError::NoMatch(discovery.describe()))
}

/// Resolve a configured port to a device path.
///
/// Accepts:
/// - A direct device path (e.g. `/dev/ttyUSB0`)
/// - A by-id symlink path (e.g. `/dev/serial/by-id/usb-FTDI_...`)
/// - A short by-id name (e.g. `usb-FTDI_FT232R_A1B2C3-if00-port0`)
///
/// Symlinks are canonicalised so the result names the actual device.
pub fn resolve_port(port_or_name: &str) -> Result<String, DiscoveryError> {
    let path = if port_or_name.starts_with("usb-") {
        Path::new(BY_ID_DIR).join(port_or_name)
    } else {
        PathBuf::from(port_or_name)
    };

    if !path.exists() {
        return Err(DiscoveryError::PortNotFound(
            path.to_string_lossy().into_owned(),
        ));
    }
    Ok(std::fs::canonicalize(&path)?.to_string_lossy().into_owned())
}
