//! Status decoder and query payload types.

use super::FLAG_ON;
use crate::error::{LightError, LightResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Animation mode reported and accepted by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Mode {
    /// Static colour.
    Solid = 0,
    /// Jump between colours.
    Jump = 1,
    /// Fade smoothly between colours.
    Fade = 2,
    /// Pulses driven directly by the host.
    User = 6,
}

impl Mode {
    /// Every recognised mode.
    pub const ALL: [Mode; 4] = [Mode::Solid, Mode::Jump, Mode::Fade, Mode::User];

    /// Lowercase name used in configuration and on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Mode::Solid => "solid",
            Mode::Jump => "jump",
            Mode::Fade => "fade",
            Mode::User => "user",
        }
    }
}

impl From<Mode> for u8 {
    fn from(mode: Mode) -> Self {
        mode as u8
    }
}

impl TryFrom<u8> for Mode {
    type Error = LightError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Mode::ALL
            .iter()
            .copied()
            .find(|mode| u8::from(*mode) == value)
            .ok_or_else(|| LightError::MalformedStatus(format!("unrecognised mode byte {value}")))
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .iter()
            .copied()
            .find(|mode| mode.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown mode '{s}' (expected solid, jump, fade or user)"))
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// RGB colour, one byte per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// Build a colour from its channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Snapshot of the controller state returned by `GET_STATUS`.
///
/// Read-only; every query produces a fresh one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// Current animation mode.
    pub mode: Mode,
    /// Current colour.
    pub color: Rgb,
    /// Whether the strip is powered.
    pub power_state: bool,
    /// Whether async animation is enabled.
    pub is_async: bool,
    /// Raw animation speed.
    pub speed: u8,
}

impl Status {
    /// Payload length of a status reply, ACK excluded.
    pub const WIRE_LEN: usize = 7;

    /// Decode a status payload.
    ///
    /// Layout: `mode, r, g, b, power, async, speed`. Power and async read as
    /// true only for `0xFF`; any other byte means off. Extra trailing bytes are
    /// ignored.
    pub fn decode(payload: &[u8]) -> LightResult<Self> {
        if payload.len() < Self::WIRE_LEN {
            return Err(LightError::MalformedStatus(format!(
                "expected {} bytes, got {}",
                Self::WIRE_LEN,
                payload.len()
            )));
        }

        Ok(Self {
            mode: Mode::try_from(payload[0])?,
            color: Rgb::new(payload[1], payload[2], payload[3]),
            power_state: payload[4] == FLAG_ON,
            is_async: payload[5] == FLAG_ON,
            speed: payload[6],
        })
    }
}

fn require(payload: &[u8], len: usize, what: &str) -> LightResult<()> {
    if payload.len() < len {
        return Err(LightError::MalformedStatus(format!(
            "{what} reply needs {len} byte(s), got {}",
            payload.len()
        )));
    }
    Ok(())
}

/// Decode a `GET_MODE` payload.
pub fn decode_mode(payload: &[u8]) -> LightResult<Mode> {
    require(payload, 1, "mode")?;
    Mode::try_from(payload[0])
}

/// Decode a `GET_COLOR` payload.
pub fn decode_color(payload: &[u8]) -> LightResult<Rgb> {
    require(payload, 3, "colour")?;
    Ok(Rgb::new(payload[0], payload[1], payload[2]))
}

/// Decode a one-byte flag payload (`GET_ON_OFF`, `GET_ASYNC`).
pub fn decode_flag(payload: &[u8]) -> LightResult<bool> {
    require(payload, 1, "flag")?;
    Ok(payload[0] == FLAG_ON)
}

/// Decode a `GET_SPEED` payload.
pub fn decode_speed(payload: &[u8]) -> LightResult<u8> {
    require(payload, 1, "speed")?;
    Ok(payload[0])
}
