//! Previous-snapshot discovery

use crate::snapshot::{IN_PROGRESS_SUFFIX, LATEST_NAME};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Locate the previous snapshot under a destination root.
///
/// The `latest` marker is authoritative: if it dereferences to an existing
/// directory, that directory is the reference point. When the marker is
/// missing or dangling (for example after a crash between unlink and
/// recreate), fall back to the lexicographically greatest timestamp-named
/// directory; the fixed-width name format makes that the chronologically
/// newest one. In-progress directories are never candidates.
///
/// Returns `None` when nothing qualifies; the run then copies everything.
pub fn resolve_previous(destination_root: &Path) -> Option<PathBuf> {
    if let Some(path) = latest_marker(destination_root) {
        debug!(previous = %path.display(), "previous snapshot from latest marker");
        return Some(path);
    }
    if let Some(path) = latest_by_name(destination_root) {
        debug!(previous = %path.display(), "previous snapshot from name ordering");
        return Some(path);
    }
    debug!("no previous snapshot, full copy");
    None
}

fn latest_marker(destination_root: &Path) -> Option<PathBuf> {
    let marker = destination_root.join(LATEST_NAME);
    let target = fs::read_link(&marker).ok()?;
    let path = destination_root.join(target);
    if path.is_dir() {
        Some(path)
    } else {
        warn!(marker = %marker.display(), "latest marker is dangling");
        None
    }
}

fn latest_by_name(destination_root: &Path) -> Option<PathBuf> {
    let pattern = destination_root.join("????-??-??T??:??:??");
    let candidates = glob::glob(pattern.to_str()?).ok()?;

    candidates
        .filter_map(Result::ok)
        .filter(|path| path.is_dir())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| !n.ends_with(IN_PROGRESS_SUFFIX))
        })
        .max_by(|a, b| a.file_name().cmp(&b.file_name()))
}
