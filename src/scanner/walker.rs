//! Depth-first physical walker over the source tree

use crate::types::{EntryKind, SnapmillError, SourceEntry};
use std::path::Path;
use tracing::trace;
use walkdir::WalkDir;

/// Maximum traversal depth below the source root.
///
/// Guards against runaway recursion on pathological structures; entries
/// deeper than this are deterministically left out of the snapshot.
pub const MAX_DEPTH: usize = 10;

/// Walk a source tree and drive a visitor for every entry.
///
/// Traversal is depth-first pre-order (a directory is visited before its
/// children) and physical: symlinks are reported as symlinks, never
/// followed as directories. Each entry's metadata is captured exactly once,
/// at visit time, into a [`SourceEntry`].
///
/// # Errors
/// * An unreadable directory or failed stat aborts the walk.
/// * An entry the engine cannot reproduce (device, FIFO, socket) aborts
///   the walk with [`SnapmillError::UnsupportedEntry`].
/// * The first visitor error aborts the walk and is propagated unchanged.
///
/// The walker itself performs no I/O beyond enumeration, stat, and
/// readlink; all snapshot side effects happen inside the visitor.
pub fn walk_source<F>(root: &Path, mut visit: F) -> Result<(), SnapmillError>
where
    F: FnMut(&SourceEntry) -> Result<(), SnapmillError>,
{
    let walker = WalkDir::new(root)
        .follow_links(false)
        .max_depth(MAX_DEPTH)
        .contents_first(false);

    for result in walker {
        let dir_entry = result?;

        let kind = EntryKind::from_file_type(dir_entry.file_type());
        if kind == EntryKind::Other {
            return Err(SnapmillError::UnsupportedEntry {
                path: dir_entry.path().to_path_buf(),
            });
        }

        let rel_path = dir_entry
            .path()
            .strip_prefix(root)
            .unwrap_or(dir_entry.path())
            .to_path_buf();

        let metadata = dir_entry.metadata()?;

        let symlink_target = if kind == EntryKind::Symlink {
            Some(std::fs::read_link(dir_entry.path())?)
        } else {
            None
        };

        let entry = SourceEntry::from_metadata(rel_path, kind, &metadata, symlink_target);
        trace!(path = %entry.rel_path.display(), kind = ?entry.kind, "visit");

        visit(&entry)?;
    }

    Ok(())
}
