//! StringLight wire protocol.
//!
//! Protocol Overview:
//! - Format: `[Opcode][Args...]`, one byte each, no length prefix, no checksum
//! - Replies: `[ACK][Payload...]` on success, a lone `[FAIL]` on rejection
//! - Timing: half-duplex, the reply is complete once the settle window elapses
//!
//! # Supported Commands
//!
//! | Opcode       | Byte | Args        | Payload after ACK |
//! |--------------|------|-------------|-------------------|
//! | `OFF`        | 0x00 | -           | -                 |
//! | `ON`         | 0x01 | -           | -                 |
//! | `SET_COLOR`  | 0x02 | r, g, b     | -                 |
//! | `GET_MODE`   | 0x03 | -           | mode              |
//! | `GET_ON_OFF` | 0x04 | -           | power             |
//! | `GET_COLOR`  | 0x05 | -           | r, g, b           |
//! | `GET_ASYNC`  | 0x06 | -           | async             |
//! | `GET_STATUS` | 0x07 | -           | 7-byte status     |
//! | `SET_MODE`   | 0x08 | mode        | -                 |
//! | `SET_ASYNC`  | 0x09 | ON/OFF byte | -                 |
//! | `GET_SPEED`  | 0x0A | -           | speed             |
//! | `SET_SPEED`  | 0x0B | speed       | -                 |
//!
//! Everything in this module is pure: building and decoding bytes never
//! touches a transport.

mod command;
mod response;
mod status;

pub use command::Command;
pub use response::Response;
pub use status::{decode_color, decode_flag, decode_mode, decode_speed, Mode, Rgb, Status};

use crate::error::LightError;
use std::fmt;

/// Prefix of every successful reply.
pub const ACK: u8 = 0xFF;

/// Sole byte of a rejected command's reply.
pub const FAIL: u8 = 0x00;

/// Flag byte meaning "true" in query payloads. Anything else reads as false.
pub const FLAG_ON: u8 = 0xFF;

/// Command byte understood by the controller firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    /// Power the strip off.
    Off = 0x00,
    /// Power the strip on.
    On = 0x01,
    /// Set the RGB colour.
    SetColor = 0x02,
    /// Query the current mode.
    GetMode = 0x03,
    /// Query the power state.
    GetOnOff = 0x04,
    /// Query the RGB colour.
    GetColor = 0x05,
    /// Query the async flag.
    GetAsync = 0x06,
    /// Query the full status snapshot.
    GetStatus = 0x07,
    /// Set the mode.
    SetMode = 0x08,
    /// Turn async animation on or off.
    SetAsync = 0x09,
    /// Query the animation speed.
    GetSpeed = 0x0A,
    /// Set the animation speed.
    SetSpeed = 0x0B,
}

impl Opcode {
    /// Every recognised opcode, in wire order.
    pub const ALL: [Opcode; 12] = [
        Opcode::Off,
        Opcode::On,
        Opcode::SetColor,
        Opcode::GetMode,
        Opcode::GetOnOff,
        Opcode::GetColor,
        Opcode::GetAsync,
        Opcode::GetStatus,
        Opcode::SetMode,
        Opcode::SetAsync,
        Opcode::GetSpeed,
        Opcode::SetSpeed,
    ];

    /// Wire byte for this opcode.
    pub fn byte(self) -> u8 {
        self as u8
    }

    /// Number of argument bytes that follow the opcode.
    pub fn arity(self) -> usize {
        match self {
            Opcode::SetColor => 3,
            Opcode::SetMode | Opcode::SetAsync | Opcode::SetSpeed => 1,
            _ => 0,
        }
    }

    /// Number of payload bytes expected after the ACK.
    pub fn payload_len(self) -> usize {
        match self {
            Opcode::GetMode | Opcode::GetOnOff | Opcode::GetAsync | Opcode::GetSpeed => 1,
            Opcode::GetColor => 3,
            Opcode::GetStatus => Status::WIRE_LEN,
            _ => 0,
        }
    }

    /// Protocol name, as written in the firmware.
    pub fn name(self) -> &'static str {
        match self {
            Opcode::Off => "OFF",
            Opcode::On => "ON",
            Opcode::SetColor => "SET_COLOR",
            Opcode::GetMode => "GET_MODE",
            Opcode::GetOnOff => "GET_ON_OFF",
            Opcode::GetColor => "GET_COLOR",
            Opcode::GetAsync => "GET_ASYNC",
            Opcode::GetStatus => "GET_STATUS",
            Opcode::SetMode => "SET_MODE",
            Opcode::SetAsync => "SET_ASYNC",
            Opcode::GetSpeed => "GET_SPEED",
            Opcode::SetSpeed => "SET_SPEED",
        }
    }
}

impl TryFrom<u8> for Opcode {
    type Error = LightError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Opcode::ALL
            .iter()
            .copied()
            .find(|op| op.byte() == value)
            .ok_or_else(|| LightError::InvalidCommand(format!("unknown opcode {value:#04x}")))
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
