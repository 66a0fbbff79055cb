//! Byte-stream transport consumed by the engine.
//!
//! The engine never talks to an OS serial port directly. It goes through two
//! traits so that the protocol logic can be exercised against an in-memory
//! link:
//!
//! - [`Transport`]: one open duplex byte stream (write, count buffered input,
//!   read a buffered byte, discard buffered input, close).
//! - [`Connector`]: opens a [`Transport`] for a port identifier and baud rate.
//!   Used once at construction and again on every reconnect.
//!
//! Implementations:
//! - [`serial::SerialConnector`]: real hardware via the `serialport` crate
//!   (requires the `serial` feature)
//! - [`mock::MockConnector`]: scripted in-memory device for tests

pub mod mock;
#[cfg(feature = "serial")]
pub mod serial;

pub use mock::{LinkEvent, MockConnector, MockLink};
#[cfg(feature = "serial")]
pub use serial::{SerialConnector, SerialTransport};

use std::io;

/// An open duplex byte stream.
///
/// `available` and `read_byte` only look at data that has already arrived;
/// neither may block waiting for more.
pub trait Transport: Send {
    /// Write the whole buffer.
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Number of bytes buffered and ready to read.
    fn available(&mut self) -> io::Result<usize>;

    /// Read one already-buffered byte.
    fn read_byte(&mut self) -> io::Result<u8>;

    /// Discard any buffered, unread input.
    fn reset_input_buffer(&mut self) -> io::Result<()>;

    /// Release the underlying device.
    fn close(&mut self) -> io::Result<()>;
}

/// Opens transports against a port identifier.
pub trait Connector: Send {
    /// Open a fresh transport.
    fn open(&mut self, port_id: &str, baud_rate: u32) -> io::Result<Box<dyn Transport>>;
}

pub(crate) fn not_connected() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "transport is closed")
}
