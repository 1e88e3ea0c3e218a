//! # snapmill - Rotating Hardlink Snapshots
//!
//! Unchanged files cost an inode, not a copy.
//!
//! Each run materializes a timestamped snapshot of a source tree under a
//! destination root. Files that are byte-for-byte unchanged since the
//! previous snapshot (same owner, group, size, mode, and mtime) are
//! hardlinked to it; everything else is copied fresh. A finished snapshot
//! is published atomically by renaming away its `.inprogress` suffix and
//! repointing the `latest` symlink.

// Module declarations
pub mod commands;
pub mod config;
pub mod scanner;
pub mod snapshot;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use types::{EntryKind, SnapmillError, SourceEntry};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
