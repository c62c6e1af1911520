use std::io::ErrorKind;

use waywire_codec::{CodecError, ObjectId};
use waywire_transport::TransportError;

/// Errors that can occur on a connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Malformed or oversized message.
    #[error("codec error: {0}")]
    Codec(CodecError),

    /// The peer closed the connection.
    #[error("peer disconnected")]
    Disconnected,

    /// A message addressed an id with no registered object.
    #[error("object {0} is not registered")]
    UnknownObject(ObjectId),

    /// An object was registered under an id already in use.
    #[error("object {0} is already registered")]
    ObjectExists(ObjectId),

    /// A handler received an opcode its interface does not define.
    #[error("object {object} has no opcode {opcode}")]
    UnknownOpcode { object: ObjectId, opcode: u16 },

    /// A handler rejected a message.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A bridge forwarding thread failed to run to completion.
    #[error("bridge failed: {0}")]
    Bridge(String),
}

impl ConnError {
    /// True when the error means the peer went away rather than misbehaved.
    pub fn is_disconnect(&self) -> bool {
        match self {
            ConnError::Disconnected => true,
            ConnError::Transport(TransportError::Io(err)) => matches!(
                err.kind(),
                ErrorKind::BrokenPipe
                    | ErrorKind::ConnectionReset
                    | ErrorKind::ConnectionAborted
                    | ErrorKind::NotConnected
            ),
            _ => false,
        }
    }
}

impl From<CodecError> for ConnError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Transport(err) => ConnError::Transport(err),
            CodecError::ConnectionClosed => ConnError::Disconnected,
            other => ConnError::Codec(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConnError>;
