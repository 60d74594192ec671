//! Error types for filesystem observation operations.

use std::path::PathBuf;
use std::time::Duration;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FsError>;

/// Errors surfaced by the filesystem observation core.
///
/// Per-entry failures inside fan-out operations (listing, translation)
/// are contained where they occur and never reach the caller as one of
/// these; only top-level failures propagate.
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    /// Both the no-follow and follow stat variants failed for a path.
    #[error("failed to stat {path}: {source}")]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Top-level directory enumeration failed.
    #[error("failed to read directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The native watch mechanism rejected a watch request.
    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),

    /// A bounded operation exceeded its deadline.
    #[error("{operation} timed out after {timeout:?}")]
    Timeout { operation: String, timeout: Duration },

    /// Delivery to the external transport failed.
    #[error("dispatch to channel '{channel}' failed: {message}")]
    Dispatch { channel: String, message: String },

    /// Payload serialization failed.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Other I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
