//! Mock serial link for testing
//!
//! Simulates the controller end of the wire without hardware. It provides:
//! - Scripted replies, one per write, plus an optional default reply
//! - Failure injection for opens and writes
//! - Stale input that is waiting before the next flush
//! - An ordered call log for test verification
//!
//! # Example
//!
//! ```
//! use stringlight::transport::{Connector, MockLink};
//!
//! let link = MockLink::new();
//! link.push_reply(&[0xFF]);
//!
//! let mut transport = link.connector().open("/dev/ttyUSB0", 19200).unwrap();
//! transport.write(&[0x01]).unwrap();
//! assert_eq!(transport.available().unwrap(), 1);
//! assert_eq!(transport.read_byte().unwrap(), 0xFF);
//! assert_eq!(link.writes(), vec![vec![0x01]]);
//! ```

use super::{not_connected, Connector, Transport};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io;
use std::sync::Arc;

/// One recorded interaction with the mock link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// A transport was opened.
    Open,
    /// Buffered input was discarded.
    Flush,
    /// Bytes were written.
    Write(Vec<u8>),
    /// A transport was closed.
    Close,
}

#[derive(Default)]
struct LinkState {
    replies: VecDeque<Vec<u8>>,
    default_reply: Option<Vec<u8>>,
    rx: VecDeque<u8>,
    call_log: Vec<LinkEvent>,
    opened_with: Vec<(String, u32)>,
    fail_opens: usize,
    fail_writes: usize,
}

/// Handle to the simulated device. Cheap to clone; all clones share state.
#[derive(Clone, Default)]
pub struct MockLink {
    state: Arc<Mutex<LinkState>>,
}

impl MockLink {
    /// Create a silent link: no replies until some are scripted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Connector that opens transports onto this link.
    pub fn connector(&self) -> MockConnector {
        MockConnector { link: self.clone() }
    }

    /// Queue the reply to the next unanswered write.
    pub fn push_reply(&self, reply: &[u8]) {
        self.state.lock().replies.push_back(reply.to_vec());
    }

    /// Reply used when the queue is empty. `None` keeps the device silent.
    pub fn set_default_reply(&self, reply: Option<Vec<u8>>) {
        self.state.lock().default_reply = reply;
    }

    /// Put bytes in the input buffer as if a late reply had just arrived.
    pub fn inject_stale(&self, bytes: &[u8]) {
        self.state.lock().rx.extend(bytes.iter().copied());
    }

    /// Make the next `count` opens fail.
    pub fn fail_next_opens(&self, count: usize) {
        self.state.lock().fail_opens = count;
    }

    /// Make the next `count` writes fail.
    pub fn fail_next_writes(&self, count: usize) {
        self.state.lock().fail_writes = count;
    }

    /// Get a copy of the call log for verification.
    pub fn call_log(&self) -> Vec<LinkEvent> {
        self.state.lock().call_log.clone()
    }

    /// Clear the call log.
    pub fn clear_call_log(&self) {
        self.state.lock().call_log.clear();
    }

    /// Every byte sequence written, in order.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.state
            .lock()
            .call_log
            .iter()
            .filter_map(|event| match event {
                LinkEvent::Write(bytes) => Some(bytes.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of events of the given kind (payload of `Write` is ignored).
    pub fn count(&self, kind: &LinkEvent) -> usize {
        self.state
            .lock()
            .call_log
            .iter()
            .filter(|event| std::mem::discriminant(*event) == std::mem::discriminant(kind))
            .count()
    }

    /// Port id and baud rate of every successful open.
    pub fn opened_with(&self) -> Vec<(String, u32)> {
        self.state.lock().opened_with.clone()
    }

    /// Bytes sitting unread in the input buffer.
    pub fn pending_input(&self) -> usize {
        self.state.lock().rx.len()
    }
}

/// [`Connector`] handing out transports bound to a [`MockLink`].
#[derive(Clone)]
pub struct MockConnector {
    link: MockLink,
}

impl Connector for MockConnector {
    fn open(&mut self, port_id: &str, baud_rate: u32) -> io::Result<Box<dyn Transport>> {
        let mut state = self.link.state.lock();
        if state.fail_opens > 0 {
            state.fail_opens -= 1;
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("mock port '{port_id}' unavailable"),
            ));
        }
        state.call_log.push(LinkEvent::Open);
        state.opened_with.push((port_id.to_string(), baud_rate));
        Ok(Box::new(MockTransport {
            link: self.link.clone(),
            open: true,
        }))
    }
}

struct MockTransport {
    link: MockLink,
    open: bool,
}

impl MockTransport {
    fn ensure_open(&self) -> io::Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(not_connected())
        }
    }
}

impl Transport for MockTransport {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.ensure_open()?;
        let mut state = self.link.state.lock();
        if state.fail_writes > 0 {
            state.fail_writes -= 1;
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "mock write failure"));
        }
        state.call_log.push(LinkEvent::Write(bytes.to_vec()));
        let reply = match state.replies.pop_front() {
            Some(reply) => Some(reply),
            None => state.default_reply.clone(),
        };
        if let Some(reply) = reply {
            state.rx.extend(reply);
        }
        Ok(())
    }

    fn available(&mut self) -> io::Result<usize> {
        self.ensure_open()?;
        Ok(self.link.state.lock().rx.len())
    }

    fn read_byte(&mut self) -> io::Result<u8> {
        self.ensure_open()?;
        self.link
            .state
            .lock()
            .rx
            .pop_front()
            .ok_or_else(|| io::Error::from(io::ErrorKind::WouldBlock))
    }

    fn reset_input_buffer(&mut self) -> io::Result<()> {
        self.ensure_open()?;
        let mut state = self.link.state.lock();
        state.rx.clear();
        state.call_log.push(LinkEvent::Flush);
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        if self.open {
            self.open = false;
            self.link.state.lock().call_log.push(LinkEvent::Close);
        }
        Ok(())
    }
}
