//! Request/response engine.
//!
//! Drives one command at a time through the cycle the controller expects:
//!
//! 1. **Flush** stale input left over from an earlier, possibly timed-out command
//! 2. **Write** the full command in one call
//! 3. **Settle** for the configured window
//! 4. **Drain** whatever has arrived
//! 5. **Classify** the reply
//!
//! A lone FAIL byte ends the call immediately with
//! [`LightError::DeviceRejected`]. Silence, a reply without the ACK prefix and
//! any I/O error during the cycle are transient: the connection is closed and
//! reopened and the identical bytes are sent again, up to `max_retries` times.
//! Worst-case latency of one call is `(max_retries + 1) * settle_timeout`
//! plus the reconnect time.
//!
//! The engine is not internally synchronised. Share it through
//! [`crate::device::SharedStringLight`] or some other exclusive owner.

use crate::error::{LightError, LightResult};
use crate::protocol::{Command, Response};
use crate::transport::{Connector, Transport};
use serde::{Deserialize, Serialize};
use std::io;
use std::time::{Duration, Instant};
use tracing::{debug, error, instrument, warn};

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default settle window.
pub const DEFAULT_SETTLE_TIMEOUT: Duration = Duration::from_millis(20);

/// Poll interval while waiting for a reply in [`Framing::Deadline`] mode.
const DEADLINE_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// How the end of a reply is detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Framing {
    /// Sleep for the whole settle window, then drain everything buffered.
    #[default]
    FixedSettle,
    /// Read incrementally until the expected reply length has arrived or the
    /// settle window has elapsed, whichever comes first.
    Deadline,
}

/// Retry and timing parameters for the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    /// Settle window per attempt.
    pub settle_timeout: Duration,
    /// Reply framing strategy.
    pub framing: Framing,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            settle_timeout: DEFAULT_SETTLE_TIMEOUT,
            framing: Framing::FixedSettle,
        }
    }
}

impl EngineSettings {
    /// Set the retry budget.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the settle window.
    pub fn with_settle_timeout(mut self, timeout: Duration) -> Self {
        self.settle_timeout = timeout;
        self
    }

    /// Set the framing strategy.
    pub fn with_framing(mut self, framing: Framing) -> Self {
        self.framing = framing;
        self
    }
}

/// The one open link to the controller.
///
/// Bound to a port identifier and baud rate for its whole life. Reconnecting
/// closes the current transport and opens a new one against the same port.
pub struct Connection {
    connector: Box<dyn Connector>,
    port_id: String,
    baud_rate: u32,
    transport: Option<Box<dyn Transport>>,
}

impl Connection {
    /// Open a connection. Fails with [`LightError::Connection`] if the port
    /// cannot be opened.
    pub fn open(
        mut connector: Box<dyn Connector>,
        port_id: impl Into<String>,
        baud_rate: u32,
    ) -> LightResult<Self> {
        let port_id = port_id.into();
        let transport = connector
            .open(&port_id, baud_rate)
            .map_err(|source| LightError::Connection {
                port: port_id.clone(),
                source,
            })?;
        debug!(port = %port_id, baud_rate, "Connection opened");
        Ok(Self {
            connector,
            port_id,
            baud_rate,
            transport: Some(transport),
        })
    }

    /// Port identifier this connection is bound to.
    pub fn port_id(&self) -> &str {
        &self.port_id
    }

    /// Baud rate this connection is bound to.
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Whether a transport is currently open.
    pub fn is_open(&self) -> bool {
        self.transport.is_some()
    }

    /// Close the current transport, if any.
    pub fn close(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            if let Err(e) = transport.close() {
                warn!(port = %self.port_id, error = %e, "Error while closing transport");
            }
        }
    }

    /// Close and reopen against the same port and baud rate.
    ///
    /// On failure the connection stays closed; the next reconnect tries again.
    pub fn reconnect(&mut self) -> io::Result<()> {
        self.close();
        let transport = self.connector.open(&self.port_id, self.baud_rate)?;
        self.transport = Some(transport);
        Ok(())
    }

    fn transport(&mut self) -> io::Result<&mut dyn Transport> {
        match self.transport.as_mut() {
            Some(transport) => Ok(transport.as_mut()),
            None => Err(crate::transport::not_connected()),
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}

/// Drives commands over a [`Connection`].
pub struct Engine {
    connection: Connection,
    settings: EngineSettings,
    last_attempts: u32,
    reconnects: u64,
}

impl Engine {
    /// Wrap an open connection.
    pub fn new(connection: Connection, settings: EngineSettings) -> Self {
        Self {
            connection,
            settings,
            last_attempts: 0,
            reconnects: 0,
        }
    }

    /// Current settings.
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// The underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Transmissions made by the most recent [`Engine::send`].
    pub fn last_attempts(&self) -> u32 {
        self.last_attempts
    }

    /// Reconnects performed over the engine's lifetime.
    pub fn reconnects(&self) -> u64 {
        self.reconnects
    }

    /// Close the connection. The next send reopens it before its first write.
    pub fn close(&mut self) {
        self.connection.close();
    }

    /// Send one command and return its payload (ACK stripped).
    #[instrument(skip(self), fields(opcode = %command.opcode()), level = "debug")]
    pub fn send(&mut self, command: &Command) -> LightResult<Vec<u8>> {
        let mut retries_left = self.settings.max_retries;
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            self.last_attempts = attempt;

            // Left closed by `close()` or a failed reconnect
            if !self.connection.is_open() {
                self.reconnects += 1;
                match self.connection.reconnect() {
                    Ok(()) => debug!(
                        port = %self.connection.port_id(),
                        "Reopened closed connection"
                    ),
                    Err(e) => warn!(
                        port = %self.connection.port_id(),
                        error = %e,
                        "Reopen failed"
                    ),
                }
            }

            match self.exchange(command) {
                Ok(Response::Ack(payload)) => {
                    debug!(attempt, payload_len = payload.len(), "Command acknowledged");
                    return Ok(payload);
                }
                Ok(Response::Rejected) => {
                    warn!(attempt, "Device rejected command");
                    return Err(LightError::DeviceRejected {
                        opcode: command.opcode(),
                    });
                }
                Ok(Response::Empty) => {
                    warn!(attempt, retries_left, "No reply from device");
                }
                Ok(Response::Malformed(raw)) => {
                    warn!(attempt, retries_left, reply = ?raw, "Reply missing ACK prefix");
                }
                Err(e) => {
                    warn!(attempt, retries_left, error = %e, "I/O error during exchange");
                }
            }

            if retries_left == 0 {
                error!(attempts = attempt, "Retry budget exhausted");
                return Err(LightError::DeviceUnresponsive {
                    opcode: command.opcode(),
                    attempts: attempt,
                });
            }
            retries_left -= 1;

            self.reconnects += 1;
            match self.connection.reconnect() {
                Ok(()) => warn!(port = %self.connection.port_id(), "Reconnected"),
                Err(e) => warn!(
                    port = %self.connection.port_id(),
                    error = %e,
                    "Reconnect failed"
                ),
            }
        }
    }

    /// One flush/write/settle/drain cycle.
    fn exchange(&mut self, command: &Command) -> io::Result<Response> {
        let settings = self.settings;
        let transport = self.connection.transport()?;

        transport.reset_input_buffer()?;
        transport.write(command.as_bytes())?;
        debug!(bytes = ?command.as_bytes(), "Command written");

        let raw = match settings.framing {
            Framing::FixedSettle => {
                std::thread::sleep(settings.settle_timeout);
                drain(transport)?
            }
            Framing::Deadline => read_until(
                transport,
                command.expected_reply_len(),
                Instant::now() + settings.settle_timeout,
            )?,
        };

        debug!(reply = ?raw, "Reply drained");
        Ok(Response::classify(raw))
    }
}

/// Read the bytes buffered when the settle window ended. Anything arriving
/// after that is left for the next flush.
fn drain(transport: &mut dyn Transport) -> io::Result<Vec<u8>> {
    let available = transport.available()?;
    let mut raw = Vec::with_capacity(available);
    for _ in 0..available {
        raw.push(transport.read_byte()?);
    }
    Ok(raw)
}

/// Read until `expected` bytes have arrived or `deadline` passes.
fn read_until(
    transport: &mut dyn Transport,
    expected: usize,
    deadline: Instant,
) -> io::Result<Vec<u8>> {
    let mut raw = Vec::with_capacity(expected);
    loop {
        let available = transport.available()?;
        for _ in 0..available {
            raw.push(transport.read_byte()?);
        }
        if raw.len() >= expected {
            return Ok(raw);
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(raw);
        }
        std::thread::sleep(DEADLINE_POLL_INTERVAL.min(deadline - now));
    }
}
