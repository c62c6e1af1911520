use std::os::fd::RawFd;

use tracing::trace;
use waywire_transport::FdTransport;

use crate::error::{CodecError, Result};
use crate::message::Message;

/// Write one complete message (blocking).
///
/// The header goes out in one send; the payload and its descriptors in the
/// next. A message without payload or descriptors is a single send. If a
/// message has descriptors but no payload, the descriptors ride on the
/// header send.
pub fn write_message<T: FdTransport>(transport: &mut T, message: &Message) -> Result<()> {
    let header = message.header()?;
    let payload = message.payload();
    let fds = message.fds();

    trace!(%header, fds = fds.len(), "write message");

    if payload.is_empty() {
        return send_all(transport, &header.encode(), fds);
    }
    send_all(transport, &header.encode(), &[])?;
    send_all(transport, payload, fds)
}

/// Send all of `bytes`, attaching `fds` to the first chunk only.
fn send_all<T: FdTransport>(transport: &mut T, bytes: &[u8], fds: &[RawFd]) -> Result<()> {
    let mut offset = 0usize;
    let mut pending_fds = fds;
    while offset < bytes.len() {
        let n = transport.send_with_fds(&bytes[offset..], pending_fds)?;
        if n == 0 {
            return Err(CodecError::ConnectionClosed);
        }
        offset += n;
        pending_fds = &[];
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::{Header, ObjectId, HEADER_SIZE};
    use crate::testing::MemoryTransport;

    #[test]
    fn header_and_payload_are_separate_sends() {
        let mut transport = MemoryTransport::default();
        let mut msg = Message::new(ObjectId::new(3), 2);
        msg.write_uint(1).unwrap();
        msg.write_fd(10).unwrap();
        write_message(&mut transport, &msg).unwrap();

        assert_eq!(transport.sends, vec![(HEADER_SIZE, vec![]), (4, vec![10])]);

        let raw: Vec<u8> = transport.bytes.iter().copied().collect();
        let header = Header::decode(raw[..HEADER_SIZE].try_into().unwrap()).unwrap();
        assert_eq!(header.object(), ObjectId::new(3));
        assert_eq!(header.opcode(), 2);
        assert_eq!(header.wire_size(), 12);
    }

    #[test]
    fn empty_message_is_header_only() {
        let mut transport = MemoryTransport::default();
        let msg = Message::new(ObjectId::new(4), 0);
        write_message(&mut transport, &msg).unwrap();

        assert_eq!(transport.sends, vec![(HEADER_SIZE, vec![])]);
        assert_eq!(transport.bytes.len(), HEADER_SIZE);
    }

    #[test]
    fn fds_without_payload_ride_on_header() {
        let mut transport = MemoryTransport::default();
        let mut msg = Message::new(ObjectId::new(4), 1);
        msg.write_fd(20).unwrap();
        write_message(&mut transport, &msg).unwrap();

        assert_eq!(transport.sends, vec![(HEADER_SIZE, vec![20])]);
    }

    #[test]
    fn short_sends_attach_fds_once() {
        let mut transport = MemoryTransport {
            chunk: Some(4),
            ..Default::default()
        };
        let mut msg = Message::new(ObjectId::new(5), 0);
        msg.write_array(&[9; 8]).unwrap();
        msg.write_fd(30).unwrap();
        write_message(&mut transport, &msg).unwrap();

        let with_fds: Vec<_> = transport
            .sends
            .iter()
            .filter(|(_, fds)| !fds.is_empty())
            .collect();
        assert_eq!(with_fds.len(), 1);
        assert_eq!(transport.bytes.len(), HEADER_SIZE + 12);
    }
}
