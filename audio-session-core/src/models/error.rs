use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::audio_models::SessionMode;

/// Errors surfaced by the session core.
///
/// Every public operation of a session or the coordinator reports failures
/// through this type; device handles are released before one is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    #[error("{active} session is active")]
    SessionConflict { active: SessionMode },

    #[error("microphone permission denied")]
    PermissionDenied,

    #[error("device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("prepare failed: {0}")]
    PrepareFailed(String),

    #[error("format error: {0}")]
    FormatError(String),

    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
}

impl SessionError {
    /// Map an I/O error on `path` into the session taxonomy.
    pub fn from_io(err: &io::Error, path: &Path) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::FileNotFound(path.to_path_buf()),
            _ => Self::PrepareFailed(format!("{}: {}", path.display(), err)),
        }
    }
}
