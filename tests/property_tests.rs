//! Property tests for the wire protocol and the facade's argument checks.

use proptest::prelude::*;
use std::time::Duration;
use stringlight::device::{ColorModePolicy, StringLight};
use stringlight::engine::EngineSettings;
use stringlight::protocol::{Command, Mode, Opcode, Response, Status};
use stringlight::transport::MockLink;
use stringlight::LightError;

/// An opcode together with arguments it accepts.
fn valid_command() -> impl Strategy<Value = (Opcode, Vec<i32>)> {
    proptest::sample::select(Opcode::ALL.to_vec()).prop_flat_map(|opcode| {
        let args = match opcode {
            Opcode::SetAsync => prop_oneof![Just(vec![0]), Just(vec![1])].boxed(),
            _ => proptest::collection::vec(0i32..=255, opcode.arity()).boxed(),
        };
        (Just(opcode), args)
    })
}

fn instant_light(link: &MockLink) -> StringLight {
    StringLight::with_connector(
        Box::new(link.connector()),
        "/dev/ttyUSB0",
        19200,
        EngineSettings::default().with_settle_timeout(Duration::ZERO),
        ColorModePolicy::Preserve,
    )
    .unwrap()
}

// ── Command encoding ──────────────────────────────────────────

proptest! {
    /// Encoding a valid command and parsing its bytes back recovers the
    /// opcode and arguments.
    #[test]
    fn encode_then_parse_recovers_command((opcode, args) in valid_command()) {
        let command = Command::new(opcode, &args).unwrap();
        let bytes = command.as_bytes();

        prop_assert_eq!(bytes.len(), 1 + args.len());
        prop_assert_eq!(bytes[0], opcode.byte());

        let parsed = Command::parse(bytes).unwrap();
        prop_assert_eq!(parsed.opcode(), opcode);
        let parsed_args: Vec<i32> = parsed.args().iter().map(|&b| i32::from(b)).collect();
        prop_assert_eq!(parsed_args, args);
    }

    /// Bytes that are not opcodes never encode.
    #[test]
    fn unknown_opcodes_are_invalid(raw in 0x0Cu8..=0xFF) {
        prop_assert!(matches!(
            Command::encode(raw, &[]),
            Err(LightError::InvalidCommand(_))
        ));
    }

    /// Any out-of-range colour channel is rejected, never clamped.
    #[test]
    fn out_of_range_colour_is_invalid(bad in prop_oneof![i32::MIN..0, 256..=i32::MAX]) {
        prop_assert!(Command::new(Opcode::SetColor, &[0, bad, 0]).is_err());
    }
}

// ── Reply classification and status decoding ──────────────────

proptest! {
    /// An ACK-prefixed reply always succeeds with the remaining bytes.
    #[test]
    fn ack_prefix_is_stripped(payload in proptest::collection::vec(any::<u8>(), 0..16)) {
        let mut raw = vec![0xFF];
        raw.extend_from_slice(&payload);
        prop_assert_eq!(Response::classify(raw), Response::Ack(payload));
    }

    /// Replies that neither start with ACK nor are a lone FAIL are transient.
    #[test]
    fn other_replies_are_transient(raw in proptest::collection::vec(0u8..0xFF, 2..16)) {
        let response = Response::classify(raw);
        prop_assert!(response.is_transient());
    }

    /// Status decoding maps bytes one-to-one for every recognised mode.
    #[test]
    fn status_fields_map_directly(
        mode in proptest::sample::select(Mode::ALL.to_vec()),
        rgb in any::<[u8; 3]>(),
        power in any::<u8>(),
        is_async in any::<u8>(),
        speed in any::<u8>(),
    ) {
        let payload = [u8::from(mode), rgb[0], rgb[1], rgb[2], power, is_async, speed];
        let status = Status::decode(&payload).unwrap();

        prop_assert_eq!(status.mode, mode);
        prop_assert_eq!([status.color.r, status.color.g, status.color.b], rgb);
        prop_assert_eq!(status.power_state, power == 0xFF);
        prop_assert_eq!(status.is_async, is_async == 0xFF);
        prop_assert_eq!(status.speed, speed);
    }

    /// Unrecognised mode bytes never decode.
    #[test]
    fn unknown_mode_is_malformed(
        mode in any::<u8>().prop_filter("recognised mode", |b| ![0, 1, 2, 6].contains(b)),
    ) {
        let payload = [mode, 0, 0, 0, 0, 0, 0];
        prop_assert!(matches!(
            Status::decode(&payload),
            Err(LightError::MalformedStatus(_))
        ));
    }
}

// ── Facade argument checks ────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// In-range speeds reach the transport exactly once.
    #[test]
    fn valid_speed_is_written(speed in 0i32..=255) {
        let link = MockLink::new();
        link.set_default_reply(Some(vec![0xFF]));
        let mut light = instant_light(&link);

        light.set_speed(speed).unwrap();
        prop_assert_eq!(link.writes(), vec![vec![0x0B, speed as u8]]);
    }

    /// Out-of-range speeds fail before any write.
    #[test]
    fn invalid_speed_is_never_written(speed in prop_oneof![i32::MIN..0, 256..=i32::MAX]) {
        let link = MockLink::new();
        let mut light = instant_light(&link);

        prop_assert!(matches!(
            light.set_speed(speed),
            Err(LightError::InvalidCommand(_))
        ));
        prop_assert!(link.writes().is_empty());
    }
}
