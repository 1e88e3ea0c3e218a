//! Hardlink-eligibility comparison

use crate::types::SourceEntry;
use filetime::FileTime;
use std::fs::Metadata;

/// Decide whether a previous snapshot's file can stand in for the source.
///
/// Eligible only when all five metadata fields match exactly: owner id,
/// group id, size, mode bits, and modification time. Equality is exact on
/// every field; there is deliberately no tolerant comparison (no
/// truncate-to-second mtime leniency, no size-only shortcut). A single-bit
/// difference forces a full recopy even when the content is identical.
#[cfg(unix)]
pub fn hardlink_eligible(source: &SourceEntry, previous: &Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;

    previous.uid() == source.uid
        && previous.gid() == source.gid
        && previous.len() == source.size
        && previous.mode() == source.mode
        && FileTime::from_last_modification_time(previous) == source.mtime
}
