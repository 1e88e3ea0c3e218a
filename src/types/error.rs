//! Error types for snapmill

use std::path::PathBuf;
use thiserror::Error;

/// Error types for snapshot operations
#[derive(Debug, Error)]
pub enum SnapmillError {
    /// Standard IO error (automatically converted via #[from])
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration or arguments
    #[error("Configuration error: {0}")]
    Config(String),

    /// Traversal failure (unreadable directory, stat failure)
    #[error("Traversal error: {0}")]
    Walk(#[from] walkdir::Error),

    /// Entry of a kind the engine cannot reproduce (device, FIFO, socket)
    #[error("Unsupported entry kind: {path}")]
    UnsupportedEntry { path: PathBuf },

    /// Failure to create a directory, file, or symlink in the snapshot
    #[error("Failed to materialize {path}: {source}")]
    Materialize {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A snapshot with this run's timestamp already exists
    #[error("Snapshot already exists: {path}")]
    SnapshotExists { path: PathBuf },
}

impl SnapmillError {
    /// Wrap an IO error with the destination path it occurred on
    pub fn materialize(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SnapmillError::Materialize {
            path: path.into(),
            source,
        }
    }

    /// Check if this error is an argument/configuration error
    ///
    /// These are reported before the engine runs and map to a distinct
    /// exit code from walk failures.
    pub fn is_config_error(&self) -> bool {
        matches!(self, SnapmillError::Config(_))
    }

    /// Check if this error came from an unsupported entry kind
    pub fn is_unsupported(&self) -> bool {
        matches!(self, SnapmillError::UnsupportedEntry { .. })
    }
}
