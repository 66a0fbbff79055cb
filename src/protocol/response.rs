//! Reply classification.

use super::{ACK, FAIL};

/// A raw reply, sorted into the four shapes the engine acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Nothing arrived within the settle window.
    Empty,
    /// The device answered with a lone FAIL marker.
    Rejected,
    /// ACK-prefixed reply; holds the payload with the ACK stripped.
    Ack(Vec<u8>),
    /// Non-empty reply that does not start with ACK.
    Malformed(Vec<u8>),
}

impl Response {
    /// Classify the bytes drained from the transport.
    ///
    /// The FAIL check runs first: a lone `0x00` is a rejection, whereas a
    /// longer reply starting with `0x00` is garbage.
    pub fn classify(raw: Vec<u8>) -> Self {
        match raw.as_slice() {
            [] => Response::Empty,
            [FAIL] => Response::Rejected,
            [ACK, ..] => Response::Ack(raw[1..].to_vec()),
            _ => Response::Malformed(raw),
        }
    }

    /// Whether a retry after reconnecting could plausibly fix this reply.
    pub fn is_transient(&self) -> bool {
        matches!(self, Response::Empty | Response::Malformed(_))
    }
}
