//! Error taxonomy for the bridge.

use std::io;

use thiserror::Error;

/// Result alias used throughout the bridge.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors surfaced by bridge operations.
///
/// Payloads are plain strings so errors stay `Clone` and can cross the
/// tool boundary as text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// A virtual path, folder name, or folder id did not resolve.
    #[error("not found: {0}")]
    NotFound(String),

    /// A capability reported its permission as denied or revoked.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The user dismissed a folder picker or confirmation prompt.
    #[error("aborted by user")]
    AbortedByUser,

    /// A read operation failed below the capability layer.
    #[error("read failure: {0}")]
    ReadFailure(String),

    /// A write operation failed below the capability layer.
    #[error("write failure: {0}")]
    WriteFailure(String),

    /// A glob or regex pattern could not be compiled.
    #[error("invalid pattern: {0}")]
    Pattern(String),

    /// The persistent store failed.
    #[error("store error: {0}")]
    Store(String),

    /// Malformed tool arguments or an operation that makes no sense
    /// against the target node.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}

impl BridgeError {
    /// Map an I/O error from a read path onto the taxonomy.
    pub fn from_read_io(err: io::Error, path: &str) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_string()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_string()),
            _ => Self::ReadFailure(format!("{path}: {err}")),
        }
    }

    /// Map an I/O error from a write path onto the taxonomy.
    pub fn from_write_io(err: io::Error, path: &str) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_string()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_string()),
            _ => Self::WriteFailure(format!("{path}: {err}")),
        }
    }
}

impl From<rusqlite::Error> for BridgeError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Store(err.to_string())
    }
}

impl From<folio_glob::PatternError> for BridgeError {
    fn from(err: folio_glob::PatternError) -> Self {
        Self::Pattern(err.to_string())
    }
}
