//! Schema-registry wire framing.
//!
//! Registry-encoded payloads are laid out as:
//!
//! ```text
//! byte 0       marker (0x00)
//! bytes 1..5   schema id, big-endian u32
//! bytes 5..    schema-encoded body
//! ```

use crate::error::{KafkaTypesError, Result};

/// Leading marker byte of a framed payload.
pub const MAGIC_BYTE: u8 = 0x00;

/// Marker byte plus schema id.
pub const HEADER_LEN: usize = 5;

/// Shortest payload treated as framed: the header plus at least one body byte.
pub const MIN_FRAMED_LEN: usize = HEADER_LEN + 1;

/// A framed payload split into its schema id and body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramedPayload<'a> {
    pub schema_id: u32,
    pub body: &'a [u8],
}

/// Split a framed payload into schema id and body without copying.
pub fn split_framed(bytes: &[u8]) -> Result<FramedPayload<'_>> {
    if bytes.len() < MIN_FRAMED_LEN {
        return Err(KafkaTypesError::PayloadTooShort { len: bytes.len() });
    }
    if bytes[0] != MAGIC_BYTE {
        return Err(KafkaTypesError::UnexpectedMarker(bytes[0]));
    }

    let mut id = [0u8; 4];
    id.copy_from_slice(&bytes[1..HEADER_LEN]);

    Ok(FramedPayload {
        schema_id: u32::from_be_bytes(id),
        body: &bytes[HEADER_LEN..],
    })
}

/// Prefix `body` with the marker byte and `schema_id`.
pub fn encode_framed(schema_id: u32, body: &[u8]) -> Vec<u8> {
    let mut framed = Vec::with_capacity(HEADER_LEN + body.len());
    framed.push(MAGIC_BYTE);
    framed.extend_from_slice(&schema_id.to_be_bytes());
    framed.extend_from_slice(body);
    framed
}
