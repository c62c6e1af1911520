use std::io::{Read, Write};
use std::net::Shutdown;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, RawFd};
use std::os::unix::net::UnixStream;

use crate::error::Result;
use crate::scm;

/// Byte transport that can carry file descriptors alongside the data.
///
/// This is the seam between the protocol engine and the operating system.
/// [`IpcStream`] implements it with `SCM_RIGHTS`; tests may substitute an
/// in-memory implementation.
pub trait FdTransport {
    /// Send `bytes`, attaching `fds` to this send. Returns bytes accepted.
    fn send_with_fds(&mut self, bytes: &[u8], fds: &[RawFd]) -> Result<usize>;

    /// Receive up to `buf.len()` bytes, appending passed descriptors to
    /// `fds`. Returns `0` at end of stream.
    fn recv_with_fds(&mut self, buf: &mut [u8], fds: &mut Vec<RawFd>) -> Result<usize>;
}

impl<T: FdTransport + ?Sized> FdTransport for &mut T {
    fn send_with_fds(&mut self, bytes: &[u8], fds: &[RawFd]) -> Result<usize> {
        (**self).send_with_fds(bytes, fds)
    }

    fn recv_with_fds(&mut self, buf: &mut [u8], fds: &mut Vec<RawFd>) -> Result<usize> {
        (**self).recv_with_fds(buf, fds)
    }
}

/// A connected Unix domain socket stream.
pub struct IpcStream {
    inner: UnixStream,
}

impl IpcStream {
    pub(crate) fn from_unix(inner: UnixStream) -> Self {
        Self { inner }
    }

    /// Create a connected, unnamed pair of streams.
    pub fn pair() -> Result<(Self, Self)> {
        let (a, b) = UnixStream::pair()?;
        Ok((Self::from_unix(a), Self::from_unix(b)))
    }

    /// Try to clone this stream (creates a new file descriptor for the same
    /// socket).
    pub fn try_clone(&self) -> Result<Self> {
        Ok(Self::from_unix(self.inner.try_clone()?))
    }

    /// Shut down both directions of the socket.
    ///
    /// This wakes any thread blocked reading from a clone of this stream.
    pub fn shutdown(&self) -> Result<()> {
        match self.inner.shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            // Already torn down by the peer or another clone.
            Err(err) if err.kind() == std::io::ErrorKind::NotConnected => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Get the credentials of the connected peer (Linux only).
    ///
    /// Returns `(uid, gid, pid)` via `SO_PEERCRED`, or `None` if unavailable.
    #[cfg(target_os = "linux")]
    pub fn peer_credentials(&self) -> Option<(u32, u32, u32)> {
        let mut cred = libc::ucred {
            pid: 0,
            uid: 0,
            gid: 0,
        };
        let mut len = std::mem::size_of::<libc::ucred>() as libc::socklen_t;

        // SAFETY: `cred` and `len` are valid writable pointers for the provided
        // sizes, and the descriptor is an open Unix socket owned by `self`.
        let rc = unsafe {
            libc::getsockopt(
                self.inner.as_raw_fd(),
                libc::SOL_SOCKET,
                libc::SO_PEERCRED,
                (&mut cred as *mut libc::ucred).cast::<libc::c_void>(),
                &mut len,
            )
        };

        if rc == 0 && len as usize == std::mem::size_of::<libc::ucred>() {
            Some((cred.uid, cred.gid, cred.pid as u32))
        } else {
            None
        }
    }

    /// Get the credentials of the connected peer.
    ///
    /// Returns `None` on platforms that do not expose peer credentials.
    #[cfg(not(target_os = "linux"))]
    pub fn peer_credentials(&self) -> Option<(u32, u32, u32)> {
        None
    }
}

impl FdTransport for IpcStream {
    fn send_with_fds(&mut self, bytes: &[u8], fds: &[RawFd]) -> Result<usize> {
        scm::send_with_fds(self.inner.as_raw_fd(), bytes, fds)
    }

    fn recv_with_fds(&mut self, buf: &mut [u8], fds: &mut Vec<RawFd>) -> Result<usize> {
        scm::recv_with_fds(self.inner.as_raw_fd(), buf, fds)
    }
}

impl Read for IpcStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for IpcStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

impl AsFd for IpcStream {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.inner.as_fd()
    }
}

impl AsRawFd for IpcStream {
    fn as_raw_fd(&self) -> RawFd {
        self.inner.as_raw_fd()
    }
}

impl std::fmt::Debug for IpcStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IpcStream")
            .field("fd", &self.inner.as_raw_fd())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_round_trips_bytes() {
        let (mut a, mut b) = IpcStream::pair().unwrap();
        a.send_with_fds(b"ping", &[]).unwrap();

        let mut buf = [0u8; 4];
        let mut fds = Vec::new();
        let n = b.recv_with_fds(&mut buf, &mut fds).unwrap();
        assert_eq!(&buf[..n], b"ping");
        assert!(fds.is_empty());
    }

    #[test]
    fn shutdown_wakes_reader_on_clone() {
        let (a, _b) = IpcStream::pair().unwrap();
        let mut reader = a.try_clone().unwrap();

        let handle = std::thread::spawn(move || {
            let mut buf = [0u8; 4];
            let mut fds = Vec::new();
            reader.recv_with_fds(&mut buf, &mut fds)
        });

        std::thread::sleep(std::time::Duration::from_millis(20));
        a.shutdown().unwrap();
        let n = handle.join().unwrap().unwrap();
        assert_eq!(n, 0);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn peer_credentials_report_own_pid() {
        let (a, _b) = IpcStream::pair().unwrap();
        let (_, _, pid) = a.peer_credentials().expect("socketpair has credentials");
        assert_eq!(pid, std::process::id());
    }
}
