//! One snapshot run, end to end

use crate::scanner::walk_source;
use crate::snapshot::{
    resolve_previous, timestamp_name, MaterializeStats, Materializer, PendingSnapshot,
};
use crate::types::SnapmillError;
use crate::Config;
use chrono::Local;
use std::path::PathBuf;
use tracing::info;

/// Outcome of a published snapshot run.
#[derive(Debug)]
pub struct SnapshotReport {
    /// Snapshot name (the run timestamp)
    pub name: String,
    /// Final published path
    pub path: PathBuf,
    /// Previous snapshot diffed against, if any
    pub previous: Option<PathBuf>,
    /// Materialization counters
    pub stats: MaterializeStats,
}

/// Run the snapshot engine once.
///
/// Resolves the previous snapshot, stakes out the staging directory, walks
/// the source tree driving the materializer, and publishes on success. On
/// any hard error publication is skipped: the staging directory is left in
/// place and the latest marker keeps pointing at the last good snapshot.
pub fn run(config: &Config) -> Result<SnapshotReport, SnapmillError> {
    config.validate()?;

    let name = timestamp_name(Local::now());
    let previous = config
        .previous
        .clone()
        .or_else(|| resolve_previous(&config.destination));

    let previous_label = previous
        .as_deref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "none".to_string());
    info!(
        source = %config.source.display(),
        snapshot = %name,
        previous = %previous_label,
        "starting snapshot run"
    );

    let pending = PendingSnapshot::begin(&config.destination, &name)?;

    let mut materializer = Materializer::new(
        config.source.clone(),
        pending.staging_dir().to_path_buf(),
        previous.clone(),
    );
    walk_source(&config.source, |entry| materializer.apply(entry))?;

    let path = pending.publish()?;
    let stats = materializer.into_stats();

    info!(
        linked = stats.files_linked,
        copied = stats.files_copied,
        bytes = stats.bytes_copied,
        dirs = stats.dirs_created,
        symlinks = stats.symlinks_created,
        skipped = stats.skipped,
        "snapshot run finished"
    );

    Ok(SnapshotReport {
        name,
        path,
        previous,
        stats,
    })
}
