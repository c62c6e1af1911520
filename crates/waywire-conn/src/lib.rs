//! Connections, object tables and dispatch.
//!
//! A [`Connection`] owns one socket, an id allocator and a table mapping
//! object ids to [`Object`] handlers. Reading a message and dispatching it
//! to its target object is one step of an event loop ([`Connection::next`]).
//!
//! A connection is driven by a single thread. The [`bridge`] helper shows
//! the one supported multi-threaded topology: two forwarding loops, one per
//! direction, each owning its own pair of connections.

pub mod bridge;
pub mod connection;
pub mod connector;
pub mod error;
pub mod listener;
pub mod object;

pub use bridge::{bridge, forward, BridgeStats};
pub use connection::{Connection, FIRST_ALLOCATED_ID};
pub use connector::{dial, dial_path};
pub use error::{ConnError, Result};
pub use listener::Listener;
pub use object::Object;

pub use waywire_codec::{Fixed, Header, Message, ObjectId};
pub use waywire_transport::{FdTransport, IpcStream};
