use std::collections::VecDeque;
use std::os::fd::RawFd;

use waywire_transport::FdTransport;

/// In-memory transport delivering at most `chunk` bytes per receive.
///
/// Descriptors are handed out with the first receive after they were sent.
#[derive(Default)]
pub(crate) struct MemoryTransport {
    pub bytes: VecDeque<u8>,
    pub fds: VecDeque<RawFd>,
    pub chunk: Option<usize>,
    pub sends: Vec<(usize, Vec<RawFd>)>,
}

impl FdTransport for MemoryTransport {
    fn send_with_fds(&mut self, bytes: &[u8], fds: &[RawFd]) -> waywire_transport::Result<usize> {
        let n = self.chunk.unwrap_or(usize::MAX).min(bytes.len());
        self.bytes.extend(&bytes[..n]);
        self.fds.extend(fds);
        self.sends.push((n, fds.to_vec()));
        Ok(n)
    }

    fn recv_with_fds(
        &mut self,
        buf: &mut [u8],
        fds: &mut Vec<RawFd>,
    ) -> waywire_transport::Result<usize> {
        let limit = self.chunk.unwrap_or(usize::MAX).min(buf.len());
        let n = limit.min(self.bytes.len());
        for (slot, byte) in buf.iter_mut().zip(self.bytes.drain(..n)) {
            *slot = byte;
        }
        fds.extend(self.fds.drain(..));
        Ok(n)
    }
}
