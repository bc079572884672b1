//! # Charger Frame Codec
//!
//! This module encodes register requests into CAN data payloads and decodes the
//! charger's replies. It leverages the `nom` crate for parsing the binary payloads.
//!
//! ## Wire format
//! - Read request: `[code, 0x00]`
//! - Write request: `[code, 0x00, value_low, value_high]`
//! - Read response: `[command_low, command_high, value_low, value_high]`
//!
//! All frames use the same extended arbitration id. Values are unsigned 16-bit,
//! low byte first.
//!
//! ## Usage
//! ```ignore
//! let frame = RegisterFrame::write(0xB1, 5350);
//! assert_eq!(frame.encode(), vec![0xB1, 0x00, 0xE6, 0x14]);
//!
//! let response = parse_response(&[0xB1, 0x00, 0xE6, 0x14])?;
//! assert_eq!(response.raw, 5350);
//! ```

use crate::constants::{FRAME_RESERVED, READ_FRAME_LEN, RESPONSE_FRAME_LEN, WRITE_FRAME_LEN};
use crate::error::ChargerError;
use nom::{
    bytes::complete::take,
    number::complete::{be_u8, le_u16},
    Err as NomErr, IResult,
};

/// A raw frame as handed to or received from the bus transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusFrame {
    pub id: u32,
    pub extended: bool,
    pub data: Vec<u8>,
}

impl BusFrame {
    /// Creates an extended-id frame.
    pub fn extended(id: u32, data: Vec<u8>) -> Self {
        BusFrame {
            id,
            extended: true,
            data,
        }
    }
}

/// Outbound register request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterFrame {
    pub code: u8,
    /// `None` for a read, `Some(raw)` for a write.
    pub value: Option<u16>,
}

impl RegisterFrame {
    pub fn read(code: u8) -> Self {
        RegisterFrame { code, value: None }
    }

    pub fn write(code: u8, raw: u16) -> Self {
        RegisterFrame {
            code,
            value: Some(raw),
        }
    }

    pub fn is_write(&self) -> bool {
        self.value.is_some()
    }

    /// Packs the request into its 2- or 4-byte payload.
    pub fn encode(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(WRITE_FRAME_LEN);
        data.push(self.code);
        data.push(FRAME_RESERVED);
        if let Some(raw) = self.value {
            data.extend_from_slice(&raw.to_le_bytes());
        }
        data
    }

    /// Decodes a request payload. Rejects a non-zero reserved byte,
    /// lengths other than 2 or 4 and trailing bytes.
    pub fn decode(input: &[u8]) -> Result<Self, ChargerError> {
        if input.len() != READ_FRAME_LEN && input.len() != WRITE_FRAME_LEN {
            return Err(ChargerError::MalformedFrame(format!(
                "request length {} (expected {} or {})",
                input.len(),
                READ_FRAME_LEN,
                WRITE_FRAME_LEN
            )));
        }
        let (_, frame) = parse_request(input)
            .map_err(|e| ChargerError::MalformedFrame(format!("{:?}", e)))?;
        Ok(frame)
    }

    /// Wraps the payload in a bus frame addressed to `id`.
    pub fn to_bus_frame(&self, id: u32) -> BusFrame {
        BusFrame::extended(id, self.encode())
    }
}

/// Decoded register read reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterResponse {
    /// Command bytes echoed by the charger. Byte 0 doubles as the probe status.
    pub command: [u8; 2],
    pub raw: u16,
}

/// Uses the `nom` crate to parse a request payload.
fn parse_request(input: &[u8]) -> IResult<&[u8], RegisterFrame> {
    let (input, code) = be_u8(input)?;
    let (input, reserved) = be_u8(input)?;
    if reserved != FRAME_RESERVED {
        return Err(NomErr::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Tag,
        )));
    }
    if input.is_empty() {
        return Ok((input, RegisterFrame::read(code)));
    }
    let (input, raw) = le_u16(input)?;
    Ok((input, RegisterFrame::write(code, raw)))
}

/// Parses the fixed 4-byte read response.
fn parse_response_payload(input: &[u8]) -> IResult<&[u8], RegisterResponse> {
    let (input, command) = take(2usize)(input)?;
    let (input, raw) = le_u16(input)?;
    Ok((
        input,
        RegisterResponse {
            command: [command[0], command[1]],
            raw,
        },
    ))
}

/// Decodes a read response. Frames shorter than 4 bytes are rejected as a whole;
/// bytes past the fourth are ignored.
pub fn parse_response(input: &[u8]) -> Result<RegisterResponse, ChargerError> {
    if input.len() < RESPONSE_FRAME_LEN {
        return Err(ChargerError::MalformedFrame(format!(
            "response length {} (expected {})",
            input.len(),
            RESPONSE_FRAME_LEN
        )));
    }
    let (_, response) = parse_response_payload(input)
        .map_err(|e| ChargerError::MalformedFrame(format!("{:?}", e)))?;
    Ok(response)
}

/// Interprets the first byte of a probe reply. Only 0 and 1 are valid statuses.
pub fn probe_status(data: &[u8]) -> Option<u8> {
    match data.first() {
        Some(&status) if status <= 1 => Some(status),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_read() {
        assert_eq!(RegisterFrame::read(0xB8).encode(), vec![0xB8, 0x00]);
    }

    #[test]
    fn test_encode_write_little_endian() {
        // 53.50 V -> 5350 = 0x14E6
        assert_eq!(
            RegisterFrame::write(0xB1, 5350).encode(),
            vec![0xB1, 0x00, 0xE6, 0x14]
        );
        assert_eq!(
            RegisterFrame::write(0xB4, 0x0884).encode(),
            vec![0xB4, 0x00, 0x84, 0x08]
        );
    }

    #[test]
    fn test_decode_rejects_reserved_byte() {
        assert!(RegisterFrame::decode(&[0xB1, 0x01]).is_err());
        assert!(RegisterFrame::decode(&[0xB1, 0x01, 0x00, 0x00]).is_err());
    }

    #[test]
    fn test_decode_rejects_bad_lengths() {
        assert!(RegisterFrame::decode(&[]).is_err());
        assert!(RegisterFrame::decode(&[0xB1]).is_err());
        assert!(RegisterFrame::decode(&[0xB1, 0x00, 0x01]).is_err());
        assert!(RegisterFrame::decode(&[0xB1, 0x00, 0x01, 0x02, 0x03]).is_err());
    }

    #[test]
    fn test_parse_response() {
        let response = parse_response(&[0x62, 0x00, 0xFD, 0x00]).unwrap();
        assert_eq!(response.command, [0x62, 0x00]);
        assert_eq!(response.raw, 253);
    }

    #[test]
    fn test_parse_short_response() {
        assert!(matches!(
            parse_response(&[0x62, 0x00, 0xFD]),
            Err(ChargerError::MalformedFrame(_))
        ));
    }

    #[test]
    fn test_probe_status() {
        assert_eq!(probe_status(&[0x00, 0x00, 0x01, 0x00]), Some(0));
        assert_eq!(probe_status(&[0x01]), Some(1));
        assert_eq!(probe_status(&[0x02, 0x00]), None);
        assert_eq!(probe_status(&[]), None);
    }

    #[test]
    fn test_to_bus_frame() {
        let frame = RegisterFrame::read(0x60).to_bus_frame(0xC0103);
        assert_eq!(frame.id, 0xC0103);
        assert!(frame.extended);
        assert_eq!(frame.data, vec![0x60, 0x00]);
    }
}
