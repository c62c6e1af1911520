use std::os::unix::fs::{FileTypeExt, MetadataExt, PermissionsExt};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::socket_path;
use crate::error::{Result, TransportError};
use crate::stream::IpcStream;

/// A listening display socket on a filesystem path.
///
/// The socket file is removed on drop, unless the path was replaced by
/// something else in the meantime.
pub struct DisplaySocket {
    listener: UnixListener,
    path: PathBuf,
    identity: Option<(u64, u64)>,
}

impl DisplaySocket {
    /// Default permission mode for created socket paths.
    pub const DEFAULT_SOCKET_MODE: u32 = 0o600;

    /// `sockaddr_un.sun_path` capacity.
    #[cfg(target_os = "linux")]
    const MAX_PATH_LEN: usize = 108;
    #[cfg(not(target_os = "linux"))]
    const MAX_PATH_LEN: usize = 104;

    /// Listen on the socket path resolved from the environment.
    pub fn bind_default() -> Result<Self> {
        Self::bind(socket_path()?)
    }

    /// Listen on an explicit path.
    ///
    /// A stale socket at `path` is replaced; any other kind of file is left
    /// alone and reported as a bind error.
    pub fn bind(path: impl AsRef<Path>) -> Result<Self> {
        Self::bind_with_mode(path, Self::DEFAULT_SOCKET_MODE)
    }

    /// Listen on an explicit path with an explicit permission mode.
    pub fn bind_with_mode(path: impl AsRef<Path>, mode: u32) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        check_path_len(&path)?;

        let bind_err = |source: std::io::Error| TransportError::Bind {
            path: path.clone(),
            source,
        };

        if let Ok(metadata) = std::fs::symlink_metadata(&path) {
            if !metadata.file_type().is_socket() {
                return Err(bind_err(std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    "existing path is not a unix socket",
                )));
            }
            debug!(?path, "removing stale socket");
            std::fs::remove_file(&path).map_err(bind_err)?;
        }

        let listener = UnixListener::bind(&path).map_err(bind_err)?;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(mode))
            .map_err(bind_err)?;
        let created = std::fs::symlink_metadata(&path).map_err(bind_err)?;

        info!(?path, "listening on display socket");

        Ok(Self {
            identity: Some((created.dev(), created.ino())),
            listener,
            path,
        })
    }

    /// Accept the next client (blocking).
    pub fn accept(&self) -> Result<IpcStream> {
        let (stream, _addr) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!(path = ?self.path, "accepted client");
        Ok(IpcStream::from_unix(stream))
    }

    /// Connect to the socket path resolved from the environment.
    pub fn connect_default() -> Result<IpcStream> {
        Self::connect(socket_path()?)
    }

    /// Connect to a listening socket (blocking).
    pub fn connect(path: impl AsRef<Path>) -> Result<IpcStream> {
        let path = path.as_ref();
        check_path_len(path)?;
        let stream = UnixStream::connect(path).map_err(|source| TransportError::Connect {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(?path, "connected to display socket");
        Ok(IpcStream::from_unix(stream))
    }

    /// The path this socket is bound to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn check_path_len(path: &Path) -> Result<()> {
    let len = path.as_os_str().len();
    if len >= DisplaySocket::MAX_PATH_LEN {
        return Err(TransportError::PathTooLong {
            path: path.to_path_buf(),
            len,
            max: DisplaySocket::MAX_PATH_LEN,
        });
    }
    Ok(())
}

impl Drop for DisplaySocket {
    fn drop(&mut self) {
        let Some((dev, ino)) = self.identity else {
            return;
        };
        match std::fs::symlink_metadata(&self.path) {
            Ok(metadata)
                if metadata.file_type().is_socket()
                    && metadata.dev() == dev
                    && metadata.ino() == ino =>
            {
                debug!(path = ?self.path, "removing socket file");
                let _ = std::fs::remove_file(&self.path);
            }
            Ok(_) => debug!(path = ?self.path, "socket path was replaced; leaving it"),
            Err(_) => {}
        }
    }
}

impl std::fmt::Debug for DisplaySocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisplaySocket")
            .field("path", &self.path)
            .finish()
    }
}
