//! Snapshot publication: staging directory lifecycle and the latest marker

use crate::types::SnapmillError;
use chrono::{DateTime, Local};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Suffix carried by a snapshot directory until it is published.
pub const IN_PROGRESS_SUFFIX: &str = ".inprogress";

/// Name of the marker symlink pointing at the most recent snapshot.
pub const LATEST_NAME: &str = "latest";

/// Snapshot name format. Fixed-width so that lexicographic string order
/// equals chronological order; previous-snapshot discovery relies on this.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Format a run start time into a snapshot name.
pub fn timestamp_name(at: DateTime<Local>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// A snapshot under construction.
///
/// Created by [`PendingSnapshot::begin`], which stakes out the staging
/// directory `<destination>/<name>.inprogress`. [`publish`] consumes the
/// value and atomically renames the staging directory to its final name.
/// A dropped, unpublished `PendingSnapshot` leaves the staging directory in
/// place for operator inspection; it is never cleaned up automatically and
/// never eligible as a previous-snapshot reference.
///
/// [`publish`]: PendingSnapshot::publish
#[derive(Debug)]
pub struct PendingSnapshot {
    destination_root: PathBuf,
    name: String,
    staging_dir: PathBuf,
    final_dir: PathBuf,
}

impl PendingSnapshot {
    /// Create the staging directory for a new snapshot run.
    ///
    /// Creates the destination root if it does not exist yet. Refuses to
    /// run when a published snapshot with this name already exists
    /// (same-second rerun or concurrent run).
    pub fn begin(destination_root: &Path, name: &str) -> Result<Self, SnapmillError> {
        fs::create_dir_all(destination_root)?;

        let final_dir = destination_root.join(name);
        if final_dir.exists() {
            return Err(SnapmillError::SnapshotExists { path: final_dir });
        }

        let staging_dir = destination_root.join(format!("{name}{IN_PROGRESS_SUFFIX}"));
        fs::create_dir(&staging_dir)?;
        debug!(staging = %staging_dir.display(), "staging directory created");

        Ok(Self {
            destination_root: destination_root.to_path_buf(),
            name: name.to_string(),
            staging_dir,
            final_dir,
        })
    }

    /// Directory the walk materializes into.
    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Publish the completed snapshot.
    ///
    /// Renames the staging directory to its final timestamped name (atomic
    /// on POSIX), then repoints the latest marker: unlink, then recreate.
    /// The marker update is deliberately not atomic; a crash in between
    /// leaves no marker, and discovery falls back to name ordering.
    pub fn publish(self) -> Result<PathBuf, SnapmillError> {
        fs::rename(&self.staging_dir, &self.final_dir)?;

        let latest = self.destination_root.join(LATEST_NAME);
        match fs::remove_file(&latest) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        std::os::unix::fs::symlink(&self.name, &latest)?;

        info!(snapshot = %self.final_dir.display(), "snapshot published");
        Ok(self.final_dir)
    }
}
