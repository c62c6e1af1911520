use std::thread;

use tracing::{debug, info, warn};
use waywire_transport::scm::close_all;
use waywire_transport::{FdTransport, IpcStream};

use crate::connection::Connection;
use crate::error::{ConnError, Result};

/// Message counts for a finished bridge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeStats {
    pub client_to_server: u64,
    pub server_to_client: u64,
}

/// Copy messages from `src` to `dst` until either side fails.
///
/// Descriptors travel with their message and are closed locally once
/// written. Returns the number of messages forwarded when `src` reaches end
/// of stream, or `dst` has gone away; any other failure is returned as an
/// error.
pub fn forward<A, B>(src: &mut Connection<A>, dst: &mut Connection<B>) -> Result<u64>
where
    A: FdTransport,
    B: FdTransport,
{
    let mut forwarded = 0u64;
    loop {
        let message = match src.read_message() {
            Ok(message) => message,
            Err(err) if err.is_disconnect() => return Ok(forwarded),
            Err(err) => return Err(err),
        };
        debug!(%message, "forward");

        let written = dst.write_message(&message);
        close_all(message.fds().iter().copied());
        match written {
            Ok(()) => forwarded += 1,
            Err(err) if err.is_disconnect() => return Ok(forwarded),
            Err(err) => return Err(err),
        }
    }
}

/// Relay traffic between an accepted client and an upstream server.
///
/// Runs one forwarding loop per direction, each on its own thread and each
/// owning its own pair of connections over cloned sockets. When either loop
/// stops it shuts down both of its sockets, which ends the other loop's
/// blocking read. Returns once both loops have finished.
pub fn bridge(client: IpcStream, server: IpcStream) -> Result<BridgeStats> {
    let upstream = spawn_loop("c->s", client.try_clone()?, server.try_clone()?)?;
    let downstream = spawn_loop("s->c", server, client)?;

    let client_to_server = join_loop(upstream);
    let server_to_client = join_loop(downstream);

    let stats = BridgeStats {
        client_to_server: client_to_server?,
        server_to_client: server_to_client?,
    };
    info!(
        client_to_server = stats.client_to_server,
        server_to_client = stats.server_to_client,
        "bridge finished"
    );
    Ok(stats)
}

fn spawn_loop(
    name: &'static str,
    src: IpcStream,
    dst: IpcStream,
) -> Result<thread::JoinHandle<Result<u64>>> {
    let handle = thread::Builder::new()
        .name(format!("bridge {name}"))
        .spawn(move || {
            let mut src = Connection::new(src);
            let mut dst = Connection::new(dst);
            let result = forward(&mut src, &mut dst);
            if let Err(err) = &result {
                warn!(direction = name, error = %err, "forwarding stopped");
            }
            let _ = src.close();
            let _ = dst.close();
            result
        })
        .map_err(|err| ConnError::Bridge(format!("failed to spawn {name} loop: {err}")))?;
    Ok(handle)
}

fn join_loop(handle: thread::JoinHandle<Result<u64>>) -> Result<u64> {
    handle
        .join()
        .map_err(|_| ConnError::Bridge("forwarding thread panicked".to_string()))?
}

#[cfg(test)]
mod tests {
    use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

    use waywire_codec::{Message, ObjectId};

    use super::*;

    #[test]
    fn relays_both_directions_and_stops_on_close() {
        let (client_end, bridge_client) = IpcStream::pair().unwrap();
        let (bridge_server, server_end) = IpcStream::pair().unwrap();

        let relay = thread::spawn(move || bridge(bridge_client, bridge_server));

        let mut client = Connection::new(client_end);
        let mut server = Connection::new(server_end);

        let mut request = Message::new(ObjectId::DISPLAY, 1);
        request.write_object_id(ObjectId::new(2)).unwrap();
        client.write_message(&request).unwrap();

        let mut seen = server.read_message().unwrap();
        assert_eq!(seen.opcode(), 1);
        assert_eq!(seen.read_object_id().unwrap(), ObjectId::new(2));

        let mut event = Message::new(ObjectId::new(2), 0);
        event.write_string("wl_compositor").unwrap();
        server.write_message(&event).unwrap();

        let mut seen = client.read_message().unwrap();
        assert_eq!(seen.read_string().unwrap(), "wl_compositor");

        client.close().unwrap();
        assert!(matches!(server.read_message(), Err(ConnError::Disconnected)));

        let stats = relay.join().unwrap().unwrap();
        assert_eq!(
            stats,
            BridgeStats {
                client_to_server: 1,
                server_to_client: 1,
            }
        );
    }

    #[test]
    fn forwards_descriptors() {
        let (client_end, bridge_client) = IpcStream::pair().unwrap();
        let (bridge_server, server_end) = IpcStream::pair().unwrap();
        let relay = thread::spawn(move || bridge(bridge_client, bridge_server));

        let mut raw = [0 as libc::c_int; 2];
        // SAFETY: `raw` is a valid two-element buffer.
        assert_eq!(unsafe { libc::pipe(raw.as_mut_ptr()) }, 0);
        // SAFETY: pipe() returned two fresh descriptors we now own.
        let (read_end, write_end) =
            unsafe { (OwnedFd::from_raw_fd(raw[0]), OwnedFd::from_raw_fd(raw[1])) };

        let mut client = Connection::new(client_end);
        let mut server = Connection::new(server_end);

        let mut msg = Message::new(ObjectId::new(3), 0);
        msg.write_object_id(ObjectId::new(4)).unwrap();
        msg.write_fd(read_end.as_raw_fd()).unwrap();
        msg.write_int(64).unwrap();
        client.write_message(&msg).unwrap();
        drop(read_end);

        let mut seen = server.read_message().unwrap();
        assert_eq!(seen.read_object_id().unwrap(), ObjectId::new(4));
        // SAFETY: the received descriptor is owned by this process.
        let fd = unsafe { OwnedFd::from_raw_fd(seen.read_fd().unwrap()) };
        assert_eq!(seen.read_int().unwrap(), 64);

        // SAFETY: valid buffers on open pipe descriptors.
        unsafe {
            libc::write(write_end.as_raw_fd(), b"x".as_ptr().cast::<libc::c_void>(), 1);
        }
        let mut out = [0u8; 1];
        // SAFETY: valid buffers on open pipe descriptors.
        let n = unsafe { libc::read(fd.as_raw_fd(), out.as_mut_ptr().cast::<libc::c_void>(), 1) };
        assert_eq!(n, 1);
        assert_eq!(out[0], b'x');

        server.close().unwrap();
        let stats = relay.join().unwrap().unwrap();
        assert_eq!(stats.client_to_server, 1);
        drop(client);
    }
}
