//! Custom error types for the driver.
//!
//! This module defines the primary error type, `LightError`, for the whole crate.
//! Using the `thiserror` crate, it separates local validation problems from
//! device-level rejections and link faults so callers can decide what is
//! worth retrying.
//!
//! ## Error Hierarchy
//!
//! - **`InvalidCommand`**: local validation failure (unknown opcode, wrong arity,
//!   out-of-range argument). Never reaches the transport.
//! - **`DeviceRejected`**: the controller answered with the FAIL marker. Permanent
//!   for that request.
//! - **`DeviceUnresponsive`**: every attempt in the retry budget produced silence
//!   or a garbled reply.
//! - **`MalformedStatus`**: a query payload could not be decoded, usually a sign
//!   the two ends are out of step.
//! - **`Connection`**: the serial port could not be opened at construction time.
//! - **`Discovery`**, **`Config`**, **`Configuration`**: failures in the
//!   collaborators around the core (port lookup and configuration loading).

use crate::discovery::DiscoveryError;
use crate::protocol::Opcode;
use thiserror::Error;

/// Convenience alias for results using the driver error type.
pub type LightResult<T> = std::result::Result<T, LightError>;

/// Primary error type for the StringLight driver.
#[derive(Error, Debug)]
pub enum LightError {
    /// A command failed local validation and was not transmitted.
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// The controller answered with the FAIL marker.
    ///
    /// **Error Type**: Permanent - the device is reachable but refused this
    /// particular request. Not retried.
    #[error("Device rejected {opcode} command")]
    DeviceRejected {
        /// Opcode of the rejected command.
        opcode: Opcode,
    },

    /// The retry budget ran out without a well-formed reply.
    ///
    /// **Error Type**: Transient - the caller may retry the whole operation later.
    #[error("Device unresponsive to {opcode} after {attempts} attempts")]
    DeviceUnresponsive {
        /// Opcode of the command that went unanswered.
        opcode: Opcode,
        /// Total number of transmissions, including the first.
        attempts: u32,
    },

    /// A status or query payload could not be decoded.
    #[error("Malformed status payload: {0}")]
    MalformedStatus(String),

    /// The serial port could not be opened.
    #[error("Failed to open serial port '{port}': {source}")]
    Connection {
        /// Port identifier that was being opened.
        port: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Serial port discovery failed.
    #[error("Port discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    /// Configuration file or environment could not be parsed.
    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    /// Configuration values parsed but are not usable.
    #[error("Configuration validation error: {0}")]
    Configuration(String),
}

impl LightError {
    /// Whether retrying the whole operation later could plausibly succeed.
    pub fn can_recover(&self) -> bool {
        matches!(
            self,
            LightError::DeviceUnresponsive { .. } | LightError::Connection { .. }
        )
    }
}
