//! # StringLight Driver Library
//!
//! Client-side driver for the StringLight controller, a microcontroller that
//! drives an addressable light strip over a half-duplex serial link. The link
//! has no framing: a reply is whatever the device has written by the end of a
//! fixed settle window after each command.
//!
//! ## Crate Structure
//!
//! - **`protocol`**: Opcodes, the command encoder, reply classification and the
//!   status decoder. Pure functions, no I/O.
//! - **`transport`**: The `Transport`/`Connector` seam, a `serialport`-backed
//!   implementation and an in-memory mock link for tests.
//! - **`engine`**: The request/response engine: flush, write, settle, drain,
//!   classify, with bounded retry and reconnect.
//! - **`device`**: The public facade (`StringLight`) and a mutex-guarded shared
//!   handle for multi-threaded hosts.
//! - **`discovery`**: Serial port lookup, kept outside the core.
//! - **`config`**: Figment-based configuration (TOML file + environment).
//! - **`logging`**: `tracing-subscriber` initialisation.
//! - **`error`**: The `LightError` enum shared by every module.
//!
//! ## Example
//!
//! ```no_run
//! use stringlight::{config::DriverConfig, device::StringLight, protocol::Mode};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = DriverConfig::load()?;
//! let mut light = StringLight::open(&config)?;
//! light.turn_on()?;
//! light.set_mode(Mode::Fade)?;
//! println!("{:?}", light.get_status()?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod device;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod logging;
pub mod protocol;
pub mod transport;

pub use device::{SharedStringLight, StringLight};
pub use error::{LightError, LightResult};
