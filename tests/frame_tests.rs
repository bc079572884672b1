//! Unit tests for the `frame.rs` module: request encoding, request decoding and
//! response parsing.

use npb_charger::charger::frame::{parse_response, probe_status, RegisterFrame};
use npb_charger::charger::register::REGISTERS;
use npb_charger::ChargerError;

/// Tests that every known register encodes a 2-byte read.
#[test]
fn test_read_frames_for_all_registers() {
    for info in REGISTERS.iter() {
        let data = RegisterFrame::read(info.code.code()).encode();
        assert_eq!(data, vec![info.code.code(), 0x00], "{}", info.name);
    }
}

/// Tests that a write frame carries the value low byte first.
#[test]
fn test_write_frame_layout() {
    let data = RegisterFrame::write(0xB9, 0xABCD).encode();
    assert_eq!(data, vec![0xB9, 0x00, 0xCD, 0xAB]);
}

/// Tests that a read request decodes back to a read.
#[test]
fn test_decode_read_request() {
    let frame = RegisterFrame::decode(&[0x62, 0x00]).unwrap();
    assert_eq!(frame, RegisterFrame::read(0x62));
    assert!(!frame.is_write());
}

/// Tests that a write request decodes back to a write.
#[test]
fn test_decode_write_request() {
    let frame = RegisterFrame::decode(&[0x00, 0x00, 0x01, 0x00]).unwrap();
    assert_eq!(frame, RegisterFrame::write(0x00, 1));
    assert!(frame.is_write());
}

/// Tests that extra bytes after a 4-byte response are ignored.
#[test]
fn test_parse_response_ignores_trailing_bytes() {
    let response = parse_response(&[0xB8, 0x00, 0x05, 0x01, 0xFF, 0xFF]).unwrap();
    assert_eq!(response.raw, 0x0105);
}

/// Tests that an empty response is rejected.
#[test]
fn test_parse_empty_response() {
    assert!(matches!(parse_response(&[]), Err(ChargerError::MalformedFrame(_))));
    assert_eq!(probe_status(&[]), None);
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use npb_charger::{Scale, ScaledValue};
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_read_frame_is_code_then_zero(code in any::<u8>()) {
            let data = RegisterFrame::read(code).encode();
            prop_assert_eq!(data.len(), 2);
            prop_assert_eq!(data, vec![code, 0x00]);
        }

        #[test]
        fn prop_write_frame_round_trips(code in any::<u8>(), raw in any::<u16>()) {
            let data = RegisterFrame::write(code, raw).encode();
            prop_assert_eq!(data.len(), 4);
            prop_assert_eq!(data[2], (raw % 256) as u8);
            prop_assert_eq!(data[3], (raw / 256) as u8);
            let decoded = RegisterFrame::decode(&data).unwrap();
            prop_assert_eq!(decoded.code, code);
            prop_assert_eq!(decoded.value, Some(raw));
        }

        #[test]
        fn prop_response_value_is_byte2_plus_byte3_times_256(
            header in any::<[u8; 2]>(),
            low in any::<u8>(),
            high in any::<u8>(),
        ) {
            let response = parse_response(&[header[0], header[1], low, high]).unwrap();
            prop_assert_eq!(u32::from(response.raw), u32::from(low) + u32::from(high) * 256);
            prop_assert_eq!(response.command, header);
        }

        #[test]
        fn prop_scaling_is_raw_times_factor(raw in any::<u16>()) {
            prop_assert_eq!(ScaledValue::new(raw, Scale::Hundredths).value(), f64::from(raw) * 0.01);
            prop_assert_eq!(ScaledValue::new(raw, Scale::Tenths).value(), f64::from(raw) * 0.1);
        }

        #[test]
        fn prop_short_responses_never_decode(data in proptest::collection::vec(any::<u8>(), 0..4)) {
            prop_assert!(parse_response(&data).is_err());
        }
    }
}
