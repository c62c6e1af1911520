//! Unix domain socket transport for the waywire protocol.
//!
//! This is the lowest layer of waywire. It provides:
//! - socket path resolution from the session environment
//! - bind/accept/connect over filesystem-path sockets
//! - the [`FdTransport`] capability: byte send/receive with file
//!   descriptors passed as `SCM_RIGHTS` ancillary data
//!
//! Everything above this crate talks to a [`FdTransport`], never to a raw
//! socket, so framing and dispatch can be exercised over any transport.

pub mod config;
pub mod error;
pub mod scm;
pub mod stream;
pub mod uds;

pub use config::{socket_path, SocketConfig, DEFAULT_DISPLAY};
pub use error::{Result, TransportError};
pub use scm::MAX_FDS_PER_MESSAGE;
pub use stream::{FdTransport, IpcStream};
pub use uds::DisplaySocket;
