//! Error taxonomy and logging helpers.
//!
//! One enum per error-handling policy bucket, not per call site. The Coordinator
//! and IpcDispatcher are the only places a `DaemonError` becomes a user-visible
//! side effect (a log line, an IPC response code); everything below them returns
//! structured values and never panics on recoverable failure.

use thiserror::Error;
use tracing::{error, warn};

/// Closed set of IPC response codes (see EXTERNAL INTERFACES).
pub const CODE_OK: &str = "OK";
pub const CODE_UNKNOWN_COMMAND: &str = "UNKNOWN_COMMAND";
pub const CODE_NOT_RUNNING: &str = "NOT_RUNNING";
pub const CODE_ALREADY_RUNNING: &str = "ALREADY_RUNNING";
pub const CODE_MODE_DISABLED: &str = "MODE_DISABLED";
pub const CODE_INVALID_INPUT: &str = "INVALID_INPUT";
pub const CODE_ACTION_FAILED: &str = "ACTION_FAILED";

/// Daemon-wide error taxonomy. Each variant maps to one of the five policy
/// buckets in the error-handling design.
#[derive(Error, Debug)]
pub enum DaemonError {
    /// Accessibility / permission errors. Fatal at startup, a warning+no-op at runtime.
    #[error("accessibility permission not granted: {0}")]
    Permission(String),

    /// Configuration errors. Caller falls back to defaults and continues.
    #[error("configuration error: {0}")]
    Config(String),

    /// Mode-activation preconditions not met (no elements, no focused app, disabled).
    #[error("activation failed: {0}")]
    Activation(String),

    /// Platform primitive failed (move cursor, click, scroll, element query).
    #[error("platform operation failed: {0}")]
    Platform(String),

    /// Malformed or unrecognised IPC request.
    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DaemonError {
    /// Map this error onto the closed IPC response-code set. Only the
    /// Coordinator/IpcDispatcher boundary should call this.
    pub fn ipc_code(&self) -> &'static str {
        match self {
            Self::Permission(_) => CODE_ACTION_FAILED,
            Self::Config(_) => CODE_ACTION_FAILED,
            Self::Activation(_) => CODE_MODE_DISABLED,
            Self::Platform(_) => CODE_ACTION_FAILED,
            Self::Protocol(_) => CODE_INVALID_INPUT,
            Self::Io(_) | Self::Json(_) => CODE_INVALID_INPUT,
        }
    }
}

pub type Result<T> = std::result::Result<T, DaemonError>;

/// Extension trait for logging-and-discarding recoverable errors, with caller
/// location attached via `#[track_caller]`.
pub trait ResultExt<T> {
    /// Log at error level and return None. Use when the failure is unexpected.
    fn log_err(self) -> Option<T>;
    /// Log at warn level and return None. Use when the failure is routine.
    fn warn_on_err(self) -> Option<T>;
}

impl<T, E: std::fmt::Debug> ResultExt<T> for std::result::Result<T, E> {
    #[track_caller]
    fn log_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                error!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "operation failed"
                );
                None
            }
        }
    }

    #[track_caller]
    fn warn_on_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                warn!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "operation had a warning"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ipc_code_mapping_is_closed_set() {
        assert_eq!(DaemonError::Activation("no elements".into()).ipc_code(), CODE_MODE_DISABLED);
        assert_eq!(DaemonError::Platform("click failed".into()).ipc_code(), CODE_ACTION_FAILED);
        assert_eq!(DaemonError::Protocol("bad json".into()).ipc_code(), CODE_INVALID_INPUT);
    }

    #[test]
    fn log_err_passes_through_ok() {
        let r: std::result::Result<i32, &str> = Ok(5);
        assert_eq!(r.log_err(), Some(5));
    }

    #[test]
    fn warn_on_err_swallows_error() {
        let r: std::result::Result<i32, &str> = Err("boom");
        assert_eq!(r.warn_on_err(), None);
    }
}
