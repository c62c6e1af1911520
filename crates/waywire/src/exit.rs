use std::fmt;
use std::io;

use waywire_codec::CodecError;
use waywire_conn::ConnError;
use waywire_scanner::{GenerateError, SchemaError};
use waywire_transport::TransportError;

// Exit codes follow sysexits(3) where one applies.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const USAGE: i32 = 64;
pub const DATA_ERR: i32 = 65;
pub const NO_INPUT: i32 = 66;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::NotFound | io::ErrorKind::ConnectionRefused => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Bind { source, .. }
        | TransportError::Connect { source, .. }
        | TransportError::Accept(source)
        | TransportError::Io(source) => io_error(context, source),
        TransportError::NoRuntimeDir { .. } | TransportError::PathTooLong { .. } => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn codec_error(context: &str, err: CodecError) -> CliError {
    match err {
        CodecError::Transport(err) => transport_error(context, err),
        CodecError::ConnectionClosed => CliError::new(FAILURE, format!("{context}: {err}")),
        other => CliError::new(DATA_ERR, format!("{context}: {other}")),
    }
}

pub fn conn_error(context: &str, err: ConnError) -> CliError {
    match err {
        ConnError::Transport(err) => transport_error(context, err),
        ConnError::Codec(err) => codec_error(context, err),
        ConnError::Disconnected => CliError::new(FAILURE, format!("{context}: {err}")),
        ConnError::Bridge(_) => CliError::new(INTERNAL, format!("{context}: {err}")),
        other => CliError::new(DATA_ERR, format!("{context}: {other}")),
    }
}

/// Unreadable input is `NO_INPUT`; anything wrong with its content is
/// `DATA_ERR`.
pub fn schema_error(context: &str, err: SchemaError) -> CliError {
    match err {
        SchemaError::Io { .. } => CliError::new(NO_INPUT, format!("{context}: {err}")),
        other => CliError::new(DATA_ERR, format!("{context}: {other}")),
    }
}

pub fn generate_error(context: &str, err: GenerateError) -> CliError {
    CliError::new(DATA_ERR, format!("{context}: {err}"))
}
