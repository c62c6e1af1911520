use std::fmt;
use std::os::fd::RawFd;

use bytes::{BufMut, BytesMut};

use crate::error::{CodecError, Result};
use crate::fixed::Fixed;
use crate::header::{Header, ObjectId, MAX_PAYLOAD};

/// One protocol message: a target object, an opcode, a payload and the
/// descriptors passed alongside it.
///
/// Arguments are written and read sequentially. The payload and the
/// descriptor list keep independent cursors, so a message is decoded by
/// calling the `read_*` methods in argument order.
///
/// Descriptors obtained from [`Message::read_fd`] on a received message are
/// owned by the caller, who is responsible for closing them. Descriptors
/// handed to [`Message::write_fd`] must stay open until the message is
/// written.
#[derive(Clone, PartialEq, Eq)]
pub struct Message {
    object: ObjectId,
    opcode: u16,
    payload: BytesMut,
    pos: usize,
    fds: Vec<RawFd>,
    fd_pos: usize,
}

impl Message {
    /// Start an empty outgoing message.
    pub fn new(object: ObjectId, opcode: u16) -> Self {
        Self {
            object,
            opcode,
            payload: BytesMut::new(),
            pos: 0,
            fds: Vec::new(),
            fd_pos: 0,
        }
    }

    /// Reassemble a received message from its parts.
    pub fn from_parts(header: Header, payload: BytesMut, fds: Vec<RawFd>) -> Self {
        Self {
            object: header.object(),
            opcode: header.opcode(),
            payload,
            pos: 0,
            fds,
            fd_pos: 0,
        }
    }

    pub fn object(&self) -> ObjectId {
        self.object
    }

    pub fn opcode(&self) -> u16 {
        self.opcode
    }

    /// The encoded payload.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// All descriptors carried by this message, read or not.
    pub fn fds(&self) -> &[RawFd] {
        &self.fds
    }

    /// Payload bytes not yet consumed by `read_*`.
    pub fn remaining(&self) -> usize {
        self.payload.len() - self.pos
    }

    /// Descriptors not yet consumed by [`Message::read_fd`].
    pub fn unread_fds(&self) -> &[RawFd] {
        &self.fds[self.fd_pos..]
    }

    /// Header describing this message as it would go on the wire.
    pub fn header(&self) -> Result<Header> {
        Header::new(self.object, self.opcode, self.payload.len())
    }

    /// Rewind both cursors to the first argument.
    pub fn rewind(&mut self) {
        self.pos = 0;
        self.fd_pos = 0;
    }

    // ── decode ───────────────────────────────────────────────────────────

    fn take(&mut self, len: usize) -> Result<&[u8]> {
        let remaining = self.remaining();
        if len > remaining {
            return Err(CodecError::Truncated {
                needed: len,
                remaining,
            });
        }
        let start = self.pos;
        self.pos += len;
        Ok(&self.payload[start..self.pos])
    }

    fn take_word(&mut self) -> Result<[u8; 4]> {
        let bytes = self.take(4)?;
        Ok([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    pub fn read_int(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.take_word()?))
    }

    pub fn read_uint(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take_word()?))
    }

    pub fn read_fixed(&mut self) -> Result<Fixed> {
        Ok(Fixed::from_raw(self.read_int()?))
    }

    pub fn read_object_id(&mut self) -> Result<ObjectId> {
        Ok(ObjectId::new(self.read_uint()?))
    }

    /// Read a string argument; a null string is an error.
    pub fn read_string(&mut self) -> Result<String> {
        self.read_nullable_string()?.ok_or(CodecError::NullString)
    }

    /// Read a string argument that may be null (zero length field).
    pub fn read_nullable_string(&mut self) -> Result<Option<String>> {
        let len = self.read_uint()? as usize;
        if len == 0 {
            return Ok(None);
        }
        let region = self.take(padded_len(len))?;
        let bytes = &region[..len];
        let Some((&0, text)) = bytes.split_last() else {
            return Err(CodecError::InvalidString(
                "missing NUL terminator".to_string(),
            ));
        };
        String::from_utf8(text.to_vec())
            .map(Some)
            .map_err(|err| CodecError::InvalidString(err.to_string()))
    }

    pub fn read_array(&mut self) -> Result<Vec<u8>> {
        let len = self.read_uint()? as usize;
        let region = self.take(padded_len(len))?;
        Ok(region[..len].to_vec())
    }

    /// Take the next passed descriptor.
    pub fn read_fd(&mut self) -> Result<RawFd> {
        let fd = *self
            .fds
            .get(self.fd_pos)
            .ok_or(CodecError::FdExhausted { index: self.fd_pos })?;
        self.fd_pos += 1;
        Ok(fd)
    }

    // ── encode ───────────────────────────────────────────────────────────

    fn reserve(&mut self, additional: usize) -> Result<()> {
        let size = self.payload.len() + additional;
        if size > MAX_PAYLOAD {
            return Err(CodecError::PayloadTooLarge {
                size,
                max: MAX_PAYLOAD,
            });
        }
        self.payload.reserve(additional);
        Ok(())
    }

    pub fn write_int(&mut self, value: i32) -> Result<()> {
        self.reserve(4)?;
        self.payload.put_i32_le(value);
        Ok(())
    }

    pub fn write_uint(&mut self, value: u32) -> Result<()> {
        self.reserve(4)?;
        self.payload.put_u32_le(value);
        Ok(())
    }

    pub fn write_fixed(&mut self, value: Fixed) -> Result<()> {
        self.write_int(value.raw())
    }

    pub fn write_object_id(&mut self, id: ObjectId) -> Result<()> {
        self.write_uint(id.get())
    }

    /// Write a string argument: length (bytes + NUL), bytes, NUL, padding.
    pub fn write_string(&mut self, value: &str) -> Result<()> {
        if value.as_bytes().contains(&0) {
            return Err(CodecError::InvalidString(
                "interior NUL byte".to_string(),
            ));
        }
        let len = value.len() + 1;
        let padded = padded_len(len);
        self.reserve(4 + padded)?;
        self.payload.put_u32_le(len as u32);
        self.payload.put_slice(value.as_bytes());
        self.payload.put_bytes(0, padded - value.len());
        Ok(())
    }

    /// Write a string argument that may be null.
    pub fn write_nullable_string(&mut self, value: Option<&str>) -> Result<()> {
        match value {
            Some(value) => self.write_string(value),
            None => self.write_uint(0),
        }
    }

    pub fn write_array(&mut self, value: &[u8]) -> Result<()> {
        let padded = padded_len(value.len());
        self.reserve(4 + padded)?;
        self.payload.put_u32_le(value.len() as u32);
        self.payload.put_slice(value);
        self.payload.put_bytes(0, padded - value.len());
        Ok(())
    }

    /// Queue a descriptor to be passed with this message.
    pub fn write_fd(&mut self, fd: RawFd) -> Result<()> {
        self.fds.push(fd);
        Ok(())
    }
}

/// Round `len` up to the next multiple of four.
pub fn padded_len(len: usize) -> usize {
    (len + 3) & !3
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("object", &self.object)
            .field("opcode", &self.opcode)
            .field("payload_len", &self.payload.len())
            .field("fds", &self.fds)
            .finish()
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Message{{obj: {}, opcode: {}, payload: {:02x?}, fds: {:?}}}",
            self.object,
            self.opcode,
            &self.payload[..],
            self.fds
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_round_trips_in_order() {
        let mut msg = Message::new(ObjectId::new(7), 3);
        msg.write_int(-42).unwrap();
        msg.write_uint(0xdead_beef).unwrap();
        msg.write_fixed(Fixed::from_f64(12.75)).unwrap();
        msg.write_string("wl_compositor").unwrap();
        msg.write_object_id(ObjectId::new(9)).unwrap();
        msg.write_array(&[1, 2, 3, 4, 5]).unwrap();
        msg.write_fd(4).unwrap();
        msg.write_fd(5).unwrap();

        assert_eq!(msg.read_int().unwrap(), -42);
        assert_eq!(msg.read_uint().unwrap(), 0xdead_beef);
        assert_eq!(msg.read_fixed().unwrap().to_f64(), 12.75);
        assert_eq!(msg.read_string().unwrap(), "wl_compositor");
        assert_eq!(msg.read_object_id().unwrap(), ObjectId::new(9));
        assert_eq!(msg.read_array().unwrap(), vec![1, 2, 3, 4, 5]);
        assert_eq!(msg.read_fd().unwrap(), 4);
        assert_eq!(msg.read_fd().unwrap(), 5);
        assert_eq!(msg.remaining(), 0);
    }

    #[test]
    fn string_padding_law() {
        let mut msg = Message::new(ObjectId::DISPLAY, 0);
        msg.write_string("ab").unwrap();
        assert_eq!(msg.payload(), &[3, 0, 0, 0, b'a', b'b', 0, 0]);

        for (text, region) in [("", 4), ("abc", 4), ("abcd", 8), ("abcdefg", 8)] {
            let mut msg = Message::new(ObjectId::DISPLAY, 0);
            msg.write_string(text).unwrap();
            assert_eq!(msg.payload().len(), 4 + region, "string {text:?}");
            assert_eq!(msg.read_string().unwrap(), text);
        }
    }

    #[test]
    fn array_is_padded_and_opaque() {
        let mut msg = Message::new(ObjectId::DISPLAY, 0);
        msg.write_array(&[0, 0xff, 0]).unwrap();
        assert_eq!(msg.payload(), &[3, 0, 0, 0, 0, 0xff, 0, 0]);
        assert_eq!(msg.read_array().unwrap(), vec![0, 0xff, 0]);

        let mut empty = Message::new(ObjectId::DISPLAY, 0);
        empty.write_array(&[]).unwrap();
        assert_eq!(empty.payload(), &[0, 0, 0, 0]);
        assert!(empty.read_array().unwrap().is_empty());
    }

    #[test]
    fn fds_come_back_in_order_then_exhaust() {
        let mut msg = Message::new(ObjectId::DISPLAY, 0);
        for fd in [7, 9, 11] {
            msg.write_fd(fd).unwrap();
        }
        assert!(msg.payload().is_empty());

        assert_eq!(msg.read_fd().unwrap(), 7);
        assert_eq!(msg.read_fd().unwrap(), 9);
        assert_eq!(msg.read_fd().unwrap(), 11);
        assert!(matches!(
            msg.read_fd(),
            Err(CodecError::FdExhausted { index: 3 })
        ));
    }

    #[test]
    fn null_string() {
        let mut msg = Message::new(ObjectId::DISPLAY, 0);
        msg.write_nullable_string(None).unwrap();
        msg.write_nullable_string(None).unwrap();
        assert_eq!(msg.read_nullable_string().unwrap(), None);
        assert!(matches!(msg.read_string(), Err(CodecError::NullString)));
    }

    #[test]
    fn short_payload_fails_the_read() {
        let header = Header::new(ObjectId::DISPLAY, 0, 2).unwrap();
        let mut msg = Message::from_parts(header, BytesMut::from(&[1u8, 2][..]), Vec::new());
        assert!(matches!(
            msg.read_uint(),
            Err(CodecError::Truncated {
                needed: 4,
                remaining: 2
            })
        ));
    }

    #[test]
    fn string_length_past_payload_is_truncated() {
        let mut payload = BytesMut::new();
        payload.put_u32_le(64);
        payload.put_slice(b"abcd");
        let header = Header::new(ObjectId::DISPLAY, 0, payload.len()).unwrap();
        let mut msg = Message::from_parts(header, payload, Vec::new());
        assert!(matches!(
            msg.read_string(),
            Err(CodecError::Truncated { .. })
        ));
    }

    #[test]
    fn string_without_terminator_is_rejected() {
        let mut payload = BytesMut::new();
        payload.put_u32_le(4);
        payload.put_slice(b"abcd");
        let header = Header::new(ObjectId::DISPLAY, 0, payload.len()).unwrap();
        let mut msg = Message::from_parts(header, payload, Vec::new());
        assert!(matches!(
            msg.read_string(),
            Err(CodecError::InvalidString(_))
        ));
    }

    #[test]
    fn interior_nul_is_rejected_on_write() {
        let mut msg = Message::new(ObjectId::DISPLAY, 0);
        assert!(matches!(
            msg.write_string("a\0b"),
            Err(CodecError::InvalidString(_))
        ));
        assert!(msg.payload().is_empty());
    }

    #[test]
    fn payload_cap_is_enforced() {
        let mut msg = Message::new(ObjectId::DISPLAY, 0);
        // 4 + 65516 + 4 = 65524, the largest 4-aligned payload.
        msg.write_array(&vec![0u8; 65516]).unwrap();
        msg.write_uint(1).unwrap();
        assert_eq!(msg.payload().len(), 65524);
        assert!(matches!(
            msg.write_uint(2),
            Err(CodecError::PayloadTooLarge { .. })
        ));
        assert!(msg.header().is_ok());
    }

    #[test]
    fn rewind_restarts_both_cursors() {
        let mut msg = Message::new(ObjectId::DISPLAY, 0);
        msg.write_uint(5).unwrap();
        msg.write_fd(3).unwrap();
        assert_eq!(msg.read_uint().unwrap(), 5);
        assert_eq!(msg.read_fd().unwrap(), 3);

        msg.rewind();
        assert_eq!(msg.unread_fds(), &[3]);
        assert_eq!(msg.read_uint().unwrap(), 5);
    }

    #[test]
    fn padded_len_rounds_up() {
        assert_eq!(padded_len(0), 0);
        assert_eq!(padded_len(1), 4);
        assert_eq!(padded_len(4), 4);
        assert_eq!(padded_len(5), 8);
    }
}
