use waywire_transport::TransportError;

/// Errors that can occur while encoding, decoding or framing messages.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// A read ran past the end of the payload.
    #[error("payload truncated (needed {needed} bytes, {remaining} remaining)")]
    Truncated { needed: usize, remaining: usize },

    /// A descriptor was read after all passed descriptors were consumed.
    #[error("message does not contain fd #{index}")]
    FdExhausted { index: usize },

    /// The payload would not fit in the 16-bit size field.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// A string argument is not a valid NUL-terminated UTF-8 string.
    #[error("invalid string argument: {0}")]
    InvalidString(String),

    /// A non-nullable string argument was sent as null.
    #[error("unexpected null string")]
    NullString,

    /// The header size field is smaller than the header itself.
    #[error("invalid header size field {0}")]
    InvalidHeader(u16),

    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The peer closed the stream before a complete message arrived.
    #[error("connection closed (incomplete message)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, CodecError>;
