use std::path::Path;

use crate::connection::Connection;
use crate::error::Result;

/// Connect to the display socket named by the session environment.
///
/// The path is `$XDG_RUNTIME_DIR/$WAYLAND_DISPLAY`, falling back to `$HOME`
/// for the directory and `wayland-0` for the name.
pub fn dial() -> Result<Connection> {
    Connection::dial()
}

/// Connect to an explicit socket path.
pub fn dial_path(path: impl AsRef<Path>) -> Result<Connection> {
    Connection::dial_path(path)
}
