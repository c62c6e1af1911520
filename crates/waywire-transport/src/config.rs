use std::ffi::OsString;
use std::path::PathBuf;

use crate::error::{Result, TransportError};

/// Environment variable naming the per-user runtime directory.
pub const RUNTIME_DIR_ENV: &str = "XDG_RUNTIME_DIR";
/// Fallback base directory when the runtime directory is unset.
pub const HOME_ENV: &str = "HOME";
/// Environment variable naming the display socket.
pub const DISPLAY_ENV: &str = "WAYLAND_DISPLAY";
/// Socket name used when no display is configured.
pub const DEFAULT_DISPLAY: &str = "wayland-0";

/// Inputs for resolving the display socket path.
///
/// Empty values are treated as unset, matching how shells commonly clear
/// variables with `VAR=`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SocketConfig {
    pub runtime_dir: Option<PathBuf>,
    pub home_dir: Option<PathBuf>,
    pub display: Option<OsString>,
}

impl SocketConfig {
    /// Capture the relevant variables from the process environment.
    pub fn from_env() -> Self {
        Self {
            runtime_dir: non_empty(std::env::var_os(RUNTIME_DIR_ENV)).map(PathBuf::from),
            home_dir: non_empty(std::env::var_os(HOME_ENV)).map(PathBuf::from),
            display: non_empty(std::env::var_os(DISPLAY_ENV)),
        }
    }

    /// The display name, or [`DEFAULT_DISPLAY`].
    pub fn display_name(&self) -> OsString {
        self.display
            .clone()
            .unwrap_or_else(|| OsString::from(DEFAULT_DISPLAY))
    }

    /// Join the base directory with the display name.
    ///
    /// An absolute display name replaces the base directory entirely.
    pub fn resolve(&self) -> Result<PathBuf> {
        let base = self
            .runtime_dir
            .as_ref()
            .or(self.home_dir.as_ref())
            .ok_or(TransportError::NoRuntimeDir {
                runtime_env: RUNTIME_DIR_ENV,
                home_env: HOME_ENV,
            })?;
        Ok(base.join(self.display_name()))
    }
}

/// Resolve the display socket path from the process environment.
pub fn socket_path() -> Result<PathBuf> {
    SocketConfig::from_env().resolve()
}

fn non_empty(value: Option<OsString>) -> Option<OsString> {
    value.filter(|v| !v.is_empty())
}
