//! Message envelope and framing for the waywire protocol.
//!
//! Every message on the wire is an 8-byte header followed by its payload:
//! - a 4-byte little-endian target object id
//! - a 4-byte little-endian word packing the total size (high 16 bits,
//!   header included) and the opcode (low 16 bits)
//!
//! Payload arguments are 32-bit aligned. File descriptors never appear in
//! the payload; they travel as ancillary data and are matched to arguments
//! by position.

pub mod error;
pub mod fixed;
pub mod header;
pub mod message;
pub mod reader;
pub mod writer;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{CodecError, Result};
pub use fixed::Fixed;
pub use header::{Header, ObjectId, HEADER_SIZE, MAX_MESSAGE_SIZE, MAX_PAYLOAD};
pub use message::Message;
pub use reader::read_message;
pub use writer::write_message;
