//! Object-addressed binary messaging over Unix domain sockets.
//!
//! waywire implements a display-server style wire protocol: 8-byte message
//! headers addressed to object ids, 32-bit aligned argument encoding, file
//! descriptors passed alongside messages, and per-connection object
//! dispatch. A scanner turns XML protocol descriptions into typed bindings.
//!
//! # Crate Structure
//!
//! - [`transport`] — Unix sockets, socket path resolution, descriptor passing
//! - [`codec`] — Message headers, argument encoding, blocking read/write
//! - [`conn`] — Connections, object tables, dispatch (behind `conn` feature)
//! - [`scanner`] — Protocol parser and binding generator (behind `scanner` feature)

/// Re-export transport types.
pub mod transport {
    pub use waywire_transport::*;
}

/// Re-export codec types.
pub mod codec {
    pub use waywire_codec::*;
}

/// Re-export connection types (requires `conn` feature).
#[cfg(feature = "conn")]
pub mod conn {
    pub use waywire_conn::*;
}

/// Re-export scanner types (requires `scanner` feature).
#[cfg(feature = "scanner")]
pub mod scanner {
    pub use waywire_scanner::*;
}
