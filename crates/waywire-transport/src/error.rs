use std::path::PathBuf;

/// Errors that can occur in socket transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to bind to the specified path.
    #[error("failed to bind to {path}: {source}")]
    Bind {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to connect to the specified path.
    #[error("failed to connect to {path}: {source}")]
    Connect {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to accept an incoming connection.
    #[error("failed to accept connection: {0}")]
    Accept(std::io::Error),

    /// An I/O error occurred on the socket.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The socket path is too long for `sockaddr_un`.
    #[error("socket path too long ({len} bytes, max {max}): {path}")]
    PathTooLong {
        path: PathBuf,
        len: usize,
        max: usize,
    },

    /// Neither the runtime directory nor the home directory is set.
    #[error("cannot resolve socket path: neither {runtime_env} nor {home_env} is set")]
    NoRuntimeDir {
        runtime_env: &'static str,
        home_env: &'static str,
    },

    /// Received ancillary data that is not a single `SCM_RIGHTS` record.
    #[error("malformed control data: {0}")]
    ControlData(String),

    /// More descriptors than a single message may carry.
    #[error("too many file descriptors ({count}, max {max})")]
    TooManyFds { count: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, TransportError>;
