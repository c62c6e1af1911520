//! `sendmsg`/`recvmsg` with `SCM_RIGHTS` ancillary data.

use std::os::fd::{FromRawFd, OwnedFd, RawFd};

use tracing::trace;

use crate::error::{Result, TransportError};

/// Maximum number of descriptors carried by one message.
pub const MAX_FDS_PER_MESSAGE: usize = 28;

#[cfg(target_os = "linux")]
const SEND_FLAGS: libc::c_int = libc::MSG_NOSIGNAL;
#[cfg(not(target_os = "linux"))]
const SEND_FLAGS: libc::c_int = 0;

#[cfg(target_os = "linux")]
const RECV_FLAGS: libc::c_int = libc::MSG_CMSG_CLOEXEC;
#[cfg(not(target_os = "linux"))]
const RECV_FLAGS: libc::c_int = 0;

const FD_SIZE: usize = std::mem::size_of::<libc::c_int>();

/// Control buffer backed by `u64` so `cmsghdr` alignment holds.
fn control_buffer(fd_count: usize) -> (Vec<u64>, usize) {
    // SAFETY: CMSG_SPACE is a pure size computation.
    let space = unsafe { libc::CMSG_SPACE((fd_count * FD_SIZE) as u32) } as usize;
    let words = space.div_ceil(std::mem::size_of::<u64>());
    (vec![0u64; words], space)
}

/// Send `bytes` with `fds` attached as one `SCM_RIGHTS` record.
///
/// Returns the number of payload bytes the kernel accepted. Descriptors are
/// attached only to this call; callers looping over a short send must pass
/// an empty slice on subsequent calls.
pub fn send_with_fds(socket: RawFd, bytes: &[u8], fds: &[RawFd]) -> Result<usize> {
    if fds.len() > MAX_FDS_PER_MESSAGE {
        return Err(TransportError::TooManyFds {
            count: fds.len(),
            max: MAX_FDS_PER_MESSAGE,
        });
    }
    sendmsg_rights(socket, bytes, fds)
}

fn sendmsg_rights(socket: RawFd, bytes: &[u8], fds: &[RawFd]) -> Result<usize> {
    let mut iov = libc::iovec {
        iov_base: bytes.as_ptr() as *mut libc::c_void,
        iov_len: bytes.len(),
    };

    // SAFETY: msghdr is plain data; all-zero is a valid empty header.
    let mut msg: libc::msghdr = unsafe { std::mem::zeroed() };
    msg.msg_iov = &mut iov;
    msg.msg_iovlen = 1;

    let (mut cmsg_buf, space) = control_buffer(fds.len());
    if !fds.is_empty() {
        msg.msg_control = cmsg_buf.as_mut_ptr().cast::<libc::c_void>();
        msg.msg_controllen = space as _;

        // SAFETY: the control buffer is sized by CMSG_SPACE for exactly
        // `fds.len()` descriptors and is suitably aligned, so the first
        // header and its data region are in bounds.
        unsafe {
            let cmsg = libc::CMSG_FIRSTHDR(&msg);
            (*cmsg).cmsg_level = libc::SOL_SOCKET;
            (*cmsg).cmsg_type = libc::SCM_RIGHTS;
            (*cmsg).cmsg_len = libc::CMSG_LEN((fds.len() * FD_SIZE) as u32) as _;
            let data = libc::CMSG_DATA(cmsg).cast::<libc::c_int>();
            for (i, fd) in fds.iter().enumerate() {
                std::ptr::write_unaligned(data.add(i), *fd);
            }
        }
    }

    loop {
        // SAFETY: `msg` points at live iovec and control buffers for the
        // duration of the call; `socket` is an open descriptor.
        let n = unsafe { libc::sendmsg(socket, &msg, SEND_FLAGS) };
        if n >= 0 {
            trace!(bytes = n, fds = fds.len(), "sendmsg");
            return Ok(n as usize);
        }
        let err = std::io::Error::last_os_error();
        if err.kind() != std::io::ErrorKind::Interrupted {
            return Err(TransportError::Io(err));
        }
    }
}

/// Receive into `buf`, appending any passed descriptors to `fds`.
///
/// Returns the number of bytes read; `0` means the peer closed the stream.
/// At most one control record is accepted per call.
pub fn recv_with_fds(socket: RawFd, buf: &mut [u8], fds: &mut Vec<RawFd>) -> Result<usize> {
    let mut iov = libc::iovec {
        iov_base: buf.as_mut_ptr().cast::<libc::c_void>(),
        iov_len: buf.len(),
    };

    let (mut cmsg_buf, space) = control_buffer(MAX_FDS_PER_MESSAGE);
    // SAFETY: msghdr is plain data; all-zero is a valid empty header.
    let mut msg: libc::msghdr = unsafe { std::mem::zeroed() };
    msg.msg_iov = &mut iov;
    msg.msg_iovlen = 1;
    msg.msg_control = cmsg_buf.as_mut_ptr().cast::<libc::c_void>();
    msg.msg_controllen = space as _;

    let n = loop {
        // SAFETY: `msg` points at live, writable iovec and control buffers.
        let n = unsafe { libc::recvmsg(socket, &mut msg, RECV_FLAGS) };
        if n >= 0 {
            break n as usize;
        }
        let err = std::io::Error::last_os_error();
        if err.kind() != std::io::ErrorKind::Interrupted {
            return Err(TransportError::Io(err));
        }
    };

    let received = parse_rights(&msg)?;
    if msg.msg_flags & libc::MSG_CTRUNC != 0 {
        close_all(received);
        return Err(TransportError::ControlData(
            "ancillary data truncated".to_string(),
        ));
    }

    if !received.is_empty() {
        trace!(bytes = n, fds = received.len(), "recvmsg with descriptors");
    }
    fds.extend(received);
    Ok(n)
}

fn parse_rights(msg: &libc::msghdr) -> Result<Vec<RawFd>> {
    let mut records = 0usize;
    let mut foreign = false;
    let mut out = Vec::new();

    // SAFETY: `msg` was filled by recvmsg; the CMSG_* macros walk only the
    // `msg_controllen` bytes the kernel reported.
    unsafe {
        let mut cmsg = libc::CMSG_FIRSTHDR(msg);
        while !cmsg.is_null() {
            records += 1;
            if (*cmsg).cmsg_level == libc::SOL_SOCKET && (*cmsg).cmsg_type == libc::SCM_RIGHTS {
                let data = libc::CMSG_DATA(cmsg).cast::<libc::c_int>();
                let count = ((*cmsg).cmsg_len as usize - libc::CMSG_LEN(0) as usize) / FD_SIZE;
                for i in 0..count {
                    out.push(std::ptr::read_unaligned(data.add(i)));
                }
            } else {
                foreign = true;
            }
            cmsg = libc::CMSG_NXTHDR(msg, cmsg);
        }
    }

    if records > 1 || foreign {
        close_all(out);
        return Err(TransportError::ControlData(format!(
            "expected 1 SCM_RIGHTS record, got {records}"
        )));
    }
    Ok(out)
}

/// Close descriptors this process received but will not hand out.
pub fn close_all(fds: impl IntoIterator<Item = RawFd>) {
    for fd in fds {
        // SAFETY: callers pass descriptors received via SCM_RIGHTS that are
        // owned by this process and not referenced elsewhere.
        drop(unsafe { OwnedFd::from_raw_fd(fd) });
    }
}
