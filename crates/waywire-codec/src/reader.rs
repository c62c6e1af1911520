use std::os::fd::RawFd;

use bytes::BytesMut;
use tracing::trace;
use waywire_transport::scm::close_all;
use waywire_transport::FdTransport;

use crate::error::{CodecError, Result};
use crate::header::{Header, HEADER_SIZE};
use crate::message::Message;

/// Read one complete message (blocking).
///
/// Reads the 8-byte header, then exactly the payload length it announces.
/// Descriptors passed with either part become the message's fd list, in
/// the order they arrived. Returns [`CodecError::ConnectionClosed`] if the
/// stream ends before the message is complete; any descriptors received
/// for the incomplete message are closed.
pub fn read_message<T: FdTransport>(transport: &mut T) -> Result<Message> {
    let mut fds = Vec::new();
    let result = read_parts(transport, &mut fds);
    match result {
        Ok((header, payload)) => {
            trace!(%header, fds = fds.len(), "read message");
            Ok(Message::from_parts(header, payload, fds))
        }
        Err(err) => {
            close_all(fds);
            Err(err)
        }
    }
}

fn read_parts<T: FdTransport>(
    transport: &mut T,
    fds: &mut Vec<RawFd>,
) -> Result<(Header, BytesMut)> {
    let mut raw = [0u8; HEADER_SIZE];
    fill(transport, &mut raw, fds)?;
    let header = Header::decode(&raw)?;

    let mut payload = BytesMut::zeroed(header.size());
    fill(transport, &mut payload, fds)?;
    Ok((header, payload))
}

fn fill<T: FdTransport>(transport: &mut T, buf: &mut [u8], fds: &mut Vec<RawFd>) -> Result<()> {
    let mut filled = 0usize;
    while filled < buf.len() {
        let n = transport.recv_with_fds(&mut buf[filled..], fds)?;
        if n == 0 {
            return Err(CodecError::ConnectionClosed);
        }
        filled += n;
    }
    Ok(())
}
