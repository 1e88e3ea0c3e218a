//! SourceEntry - one filesystem object as seen during the walk

use filetime::FileTime;
use std::fs::Metadata;
use std::path::PathBuf;

/// Kind of a source entry, classified without following symlinks.
///
/// One materialization handler exists per variant; `Other` covers devices,
/// FIFOs, and sockets, which the engine refuses to reproduce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
    Symlink,
    Other,
}

impl EntryKind {
    /// Classify a file type obtained from a physical (non-following) stat.
    pub fn from_file_type(file_type: std::fs::FileType) -> Self {
        if file_type.is_dir() {
            EntryKind::Directory
        } else if file_type.is_file() {
            EntryKind::File
        } else if file_type.is_symlink() {
            EntryKind::Symlink
        } else {
            EntryKind::Other
        }
    }
}

/// Metadata of a source entry, captured once at visit time.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceEntry {
    /// Path relative to the source root; empty for the root itself
    pub rel_path: PathBuf,

    /// Entry kind at capture time
    pub kind: EntryKind,

    /// Owner user id
    pub uid: u32,

    /// Owner group id
    pub gid: u32,

    /// Full `st_mode` (file type + permission bits)
    pub mode: u32,

    /// Size in bytes
    pub size: u64,

    /// Last modification time, full precision
    pub mtime: FileTime,

    /// Last access time, full precision
    pub atime: FileTime,

    /// Verbatim symlink target, for `EntryKind::Symlink` only
    pub symlink_target: Option<PathBuf>,
}

impl SourceEntry {
    /// Build a SourceEntry from metadata obtained via a physical stat.
    ///
    /// `symlink_target` must be `Some` exactly when `kind` is `Symlink`.
    #[cfg(unix)]
    pub fn from_metadata(
        rel_path: PathBuf,
        kind: EntryKind,
        metadata: &Metadata,
        symlink_target: Option<PathBuf>,
    ) -> Self {
        use std::os::unix::fs::MetadataExt;

        Self {
            rel_path,
            kind,
            uid: metadata.uid(),
            gid: metadata.gid(),
            mode: metadata.mode(),
            size: metadata.len(),
            mtime: FileTime::from_last_modification_time(metadata),
            atime: FileTime::from_last_access_time(metadata),
            symlink_target,
        }
    }

    /// True for the source root itself (relative path is empty).
    pub fn is_root(&self) -> bool {
        self.rel_path.as_os_str().is_empty()
    }
}
