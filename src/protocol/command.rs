//! Command encoder.

use super::Opcode;
use crate::error::{LightError, LightResult};
use std::fmt;

/// A validated, ready-to-send command: `[opcode] ++ args`.
///
/// Built fresh for every facade call and never mutated; the engine resends
/// the identical bytes on retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    opcode: Opcode,
    bytes: Vec<u8>,
}

impl Command {
    /// Encode a command from a raw opcode byte.
    ///
    /// Fails with [`LightError::InvalidCommand`] when the opcode is not one the
    /// firmware recognises or when any argument is rejected by [`Command::new`].
    pub fn encode(raw_opcode: u8, args: &[i32]) -> LightResult<Self> {
        Self::new(Opcode::try_from(raw_opcode)?, args)
    }

    /// Encode a command for a known opcode.
    ///
    /// Arguments are taken as wide integers so that out-of-range values are
    /// representable and rejected here instead of being truncated.
    pub fn new(opcode: Opcode, args: &[i32]) -> LightResult<Self> {
        if args.len() != opcode.arity() {
            return Err(LightError::InvalidCommand(format!(
                "{opcode} takes {} argument(s), got {}",
                opcode.arity(),
                args.len()
            )));
        }

        let mut bytes = Vec::with_capacity(1 + args.len());
        bytes.push(opcode.byte());
        for (index, &arg) in args.iter().enumerate() {
            let byte = u8::try_from(arg).map_err(|_| {
                LightError::InvalidCommand(format!(
                    "{} {arg} out of range [0, 255]",
                    argument_name(opcode, index)
                ))
            })?;
            bytes.push(byte);
        }

        if opcode == Opcode::SetAsync
            && bytes[1] != Opcode::On.byte()
            && bytes[1] != Opcode::Off.byte()
        {
            return Err(LightError::InvalidCommand(format!(
                "async flag must be ON ({:#04x}) or OFF ({:#04x}), got {:#04x}",
                Opcode::On.byte(),
                Opcode::Off.byte(),
                bytes[1]
            )));
        }

        Ok(Self { opcode, bytes })
    }

    /// Parse a command back from its wire bytes, with the same validation as
    /// [`Command::encode`].
    pub fn parse(bytes: &[u8]) -> LightResult<Self> {
        let (&raw, args) = bytes
            .split_first()
            .ok_or_else(|| LightError::InvalidCommand("empty command".into()))?;
        let args: Vec<i32> = args.iter().map(|&b| i32::from(b)).collect();
        Self::encode(raw, &args)
    }

    /// Opcode of this command.
    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    /// Argument bytes, in order.
    pub fn args(&self) -> &[u8] {
        &self.bytes[1..]
    }

    /// Full wire representation.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Reply length (ACK included) a healthy device sends for this command.
    pub fn expected_reply_len(&self) -> usize {
        1 + self.opcode.payload_len()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.opcode)?;
        for arg in self.args() {
            write!(f, " {arg:#04x}")?;
        }
        Ok(())
    }
}

fn argument_name(opcode: Opcode, index: usize) -> &'static str {
    match (opcode, index) {
        (Opcode::SetSpeed, _) => "speed",
        (Opcode::SetMode, _) => "mode",
        (Opcode::SetAsync, _) => "async flag",
        (Opcode::SetColor, 0) => "red",
        (Opcode::SetColor, 1) => "green",
        (Opcode::SetColor, _) => "blue",
        _ => "argument",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_opcode_then_args() {
        let cmd = Command::new(Opcode::SetColor, &[10, 20, 30]).unwrap();
        assert_eq!(cmd.as_bytes(), &[0x02, 10, 20, 30]);
        assert_eq!(cmd.args(), &[10, 20, 30]);
        assert_eq!(cmd.opcode(), Opcode::SetColor);
    }

    #[test]
    fn zero_argument_commands_are_one_byte() {
        assert_eq!(Command::new(Opcode::On, &[]).unwrap().as_bytes(), &[0x01]);
        assert_eq!(Command::new(Opcode::Off, &[]).unwrap().as_bytes(), &[0x00]);
        assert_eq!(
            Command::new(Opcode::GetStatus, &[]).unwrap().as_bytes(),
            &[0x07]
        );
    }

    #[test]
    fn speed_bounds_are_inclusive() {
        assert!(Command::new(Opcode::SetSpeed, &[0]).is_ok());
        assert!(Command::new(Opcode::SetSpeed, &[255]).is_ok());

        let err = Command::new(Opcode::SetSpeed, &[256]).unwrap_err();
        assert!(matches!(err, LightError::InvalidCommand(ref msg) if msg.contains("speed 256")));
        assert!(Command::new(Opcode::SetSpeed, &[-1]).is_err());
    }

    #[test]
    fn unknown_opcode_rejected() {
        assert!(matches!(
            Command::encode(0x42, &[]),
            Err(LightError::InvalidCommand(_))
        ));
    }

    #[test]
    fn wrong_arity_rejected() {
        assert!(Command::new(Opcode::SetColor, &[1, 2]).is_err());
        assert!(Command::new(Opcode::On, &[1]).is_err());
        assert!(Command::new(Opcode::SetSpeed, &[]).is_err());
    }

    #[test]
    fn async_argument_must_be_on_or_off_byte() {
        assert_eq!(
            Command::new(Opcode::SetAsync, &[1]).unwrap().as_bytes(),
            &[0x09, 0x01]
        );
        assert_eq!(
            Command::new(Opcode::SetAsync, &[0]).unwrap().as_bytes(),
            &[0x09, 0x00]
        );
        assert!(Command::new(Opcode::SetAsync, &[2]).is_err());
    }

    #[test]
    fn mode_byte_is_not_range_checked_beyond_a_byte() {
        let cmd = Command::new(Opcode::SetMode, &[5]).unwrap();
        assert_eq!(cmd.as_bytes(), &[0x08, 0x05]);
    }

    #[test]
    fn parse_recovers_command() {
        let cmd = Command::new(Opcode::SetColor, &[255, 0, 128]).unwrap();
        assert_eq!(Command::parse(cmd.as_bytes()).unwrap(), cmd);
        assert!(Command::parse(&[]).is_err());
    }

    #[test]
    fn expected_reply_len_includes_ack() {
        let status = Command::new(Opcode::GetStatus, &[]).unwrap();
        assert_eq!(status.expected_reply_len(), 8);
        let on = Command::new(Opcode::On, &[]).unwrap();
        assert_eq!(on.expected_reply_len(), 1);
    }

    #[test]
    fn display_lists_args_in_hex() {
        let cmd = Command::new(Opcode::SetSpeed, &[42]).unwrap();
        assert_eq!(cmd.to_string(), "SET_SPEED 0x2a");
    }
}
