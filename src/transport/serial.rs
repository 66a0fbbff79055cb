//! Serial port transport for RS-232/USB-serial adapters.
//!
//! Wraps the `serialport` crate. All calls are blocking, which matches the
//! engine's synchronous request/response cycle.

use super::{not_connected, Connector, Transport};
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{self, Read, Write};
use std::time::Duration;
use tracing::debug;

/// Internal read timeout of the OS port.
///
/// The engine only reads bytes it has already seen in `available`, so this
/// merely bounds a read that races a device reset.
const PORT_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Opens [`SerialTransport`]s with 8N1 framing and no flow control.
#[derive(Debug, Clone)]
pub struct SerialConnector {
    read_timeout: Duration,
}

impl SerialConnector {
    /// Create a connector with the default internal read timeout.
    pub fn new() -> Self {
        Self {
            read_timeout: PORT_READ_TIMEOUT,
        }
    }

    /// Set the OS-level read timeout.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }
}

impl Default for SerialConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl Connector for SerialConnector {
    fn open(&mut self, port_id: &str, baud_rate: u32) -> io::Result<Box<dyn Transport>> {
        let port = serialport::new(port_id, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(self.read_timeout)
            .open()?;

        debug!(port = port_id, baud_rate, "Serial port opened");
        Ok(Box::new(SerialTransport {
            port_id: port_id.to_string(),
            port: Some(port),
        }))
    }
}

/// An open serial port.
pub struct SerialTransport {
    port_id: String,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialTransport {
    fn port(&mut self) -> io::Result<&mut Box<dyn SerialPort>> {
        self.port.as_mut().ok_or_else(not_connected)
    }
}

impl Transport for SerialTransport {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        let port = self.port()?;
        port.write_all(bytes)?;
        port.flush()
    }

    fn available(&mut self) -> io::Result<usize> {
        let count = self.port()?.bytes_to_read()?;
        Ok(count as usize)
    }

    fn read_byte(&mut self) -> io::Result<u8> {
        let mut buf = [0u8; 1];
        self.port()?.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    fn reset_input_buffer(&mut self) -> io::Result<()> {
        self.port()?.clear(ClearBuffer::Input)?;
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        if self.port.take().is_some() {
            debug!(port = %self.port_id, "Serial port closed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connector_builder() {
        let connector = SerialConnector::new().with_read_timeout(Duration::from_millis(250));
        assert_eq!(connector.read_timeout, Duration::from_millis(250));
        assert_eq!(SerialConnector::default().read_timeout, PORT_READ_TIMEOUT);
    }

    #[test]
    fn opening_missing_port_fails() {
        let mut connector = SerialConnector::new();
        assert!(connector
            .open("/dev/stringlight-does-not-exist", 19200)
            .is_err());
    }

    #[test]
    fn closed_transport_reports_not_connected() {
        let mut transport = SerialTransport {
            port_id: "/dev/ttyUSB0".into(),
            port: None,
        };
        let err = transport.available().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);
        assert!(transport.close().is_ok());
    }
}
