use std::path::Path;

use tracing::debug;
use waywire_transport::DisplaySocket;

use crate::connection::Connection;
use crate::error::Result;

/// Listens for and accepts client connections.
#[derive(Debug)]
pub struct Listener {
    socket: DisplaySocket,
}

impl Listener {
    /// Bind to the display socket path resolved from the environment.
    pub fn bind_default() -> Result<Self> {
        Ok(Self {
            socket: DisplaySocket::bind_default()?,
        })
    }

    /// Bind to an explicit socket path.
    pub fn bind(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            socket: DisplaySocket::bind(path)?,
        })
    }

    /// Accept the next client as a fresh connection with an empty table.
    pub fn accept(&self) -> Result<Connection> {
        let stream = self.socket.accept()?;
        if let Some((uid, _gid, pid)) = stream.peer_credentials() {
            debug!(uid, pid, "client connected");
        }
        Ok(Connection::new(stream))
    }

    /// Bound socket path.
    pub fn path(&self) -> &Path {
        self.socket.path()
    }
}
