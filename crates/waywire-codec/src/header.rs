use std::fmt;

use crate::error::{CodecError, Result};

/// Header: object id (4) + size/opcode word (4) = 8 bytes.
pub const HEADER_SIZE: usize = 8;

/// Largest message the 16-bit size field can describe, header included.
pub const MAX_MESSAGE_SIZE: usize = u16::MAX as usize;

/// Largest payload that fits in one message.
pub const MAX_PAYLOAD: usize = MAX_MESSAGE_SIZE - HEADER_SIZE;

/// Handle naming a protocol object within one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ObjectId(u32);

impl ObjectId {
    /// The null object.
    pub const NULL: ObjectId = ObjectId(0);

    /// The root object every connection starts with.
    pub const DISPLAY: ObjectId = ObjectId(1);

    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for ObjectId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<ObjectId> for u32 {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A decoded message header.
///
/// Wire format:
/// ```text
/// ┌──────────────────┬──────────────────┬──────────────────┐
/// │ Object id (4B LE)│ Opcode (2B LE)   │ Size (2B LE)     │
/// │                  │ low half of word │ header + payload │
/// └──────────────────┴──────────────────┴──────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    object: ObjectId,
    opcode: u16,
    payload_len: u16,
}

impl Header {
    /// Build a header for a payload of `payload_len` bytes.
    pub fn new(object: ObjectId, opcode: u16, payload_len: usize) -> Result<Self> {
        if payload_len > MAX_PAYLOAD {
            return Err(CodecError::PayloadTooLarge {
                size: payload_len,
                max: MAX_PAYLOAD,
            });
        }
        Ok(Self {
            object,
            opcode,
            payload_len: payload_len as u16,
        })
    }

    pub fn object(&self) -> ObjectId {
        self.object
    }

    pub fn opcode(&self) -> u16 {
        self.opcode
    }

    /// Payload length in bytes, header excluded.
    pub fn size(&self) -> usize {
        self.payload_len as usize
    }

    /// Value of the on-wire size field (header included).
    pub fn wire_size(&self) -> u16 {
        self.payload_len + HEADER_SIZE as u16
    }

    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let word = (u32::from(self.wire_size()) << 16) | u32::from(self.opcode);
        let mut out = [0u8; HEADER_SIZE];
        out[..4].copy_from_slice(&self.object.get().to_le_bytes());
        out[4..].copy_from_slice(&word.to_le_bytes());
        out
    }

    pub fn decode(bytes: &[u8; HEADER_SIZE]) -> Result<Self> {
        let object = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let word = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        let wire_size = (word >> 16) as u16;
        if (wire_size as usize) < HEADER_SIZE {
            return Err(CodecError::InvalidHeader(wire_size));
        }
        Ok(Self {
            object: ObjectId(object),
            opcode: word as u16,
            payload_len: wire_size - HEADER_SIZE as u16,
        })
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "header{{object: {:08x}, opcode: {}, size: {}}}",
            self.object.get(),
            self.opcode,
            self.payload_len
        )
    }
}
