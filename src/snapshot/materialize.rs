//! Entry materialization: reproduce one source entry inside the staging tree

use crate::snapshot::compare::hardlink_eligible;
use crate::types::{EntryKind, SnapmillError, SourceEntry};
use std::fs::{self, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Fixed copy buffer size. A tuning constant, not a correctness parameter;
/// files larger than one buffer are copied by looping until EOF.
const COPY_BUFFER_SIZE: usize = 128 * 1024;

/// Counters for one snapshot run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterializeStats {
    /// Directories created in the staging tree
    pub dirs_created: u64,
    /// Files satisfied by hardlinking into the previous snapshot
    pub files_linked: u64,
    /// Files copied byte-for-byte
    pub files_copied: u64,
    /// Bytes written by full copies
    pub bytes_copied: u64,
    /// Symlinks recreated
    pub symlinks_created: u64,
    /// Non-regular files skipped with a warning
    pub skipped: u64,
}

/// Reproduces source entries inside an in-progress snapshot directory.
///
/// Owns the change-detection policy (hardlink vs copy) and all metadata
/// propagation. Holds no global state; every buffer is per-call.
pub struct Materializer {
    source_root: PathBuf,
    staging_root: PathBuf,
    previous: Option<PathBuf>,
    stats: MaterializeStats,
}

impl Materializer {
    /// Create a materializer writing into `staging_root`.
    ///
    /// `previous` is a read-only published snapshot used purely as the
    /// hardlink reference; it is never mutated.
    pub fn new(source_root: PathBuf, staging_root: PathBuf, previous: Option<PathBuf>) -> Self {
        Self {
            source_root,
            staging_root,
            previous,
            stats: MaterializeStats::default(),
        }
    }

    /// Counters accumulated so far.
    pub fn stats(&self) -> &MaterializeStats {
        &self.stats
    }

    /// Consume the materializer, returning its counters.
    pub fn into_stats(self) -> MaterializeStats {
        self.stats
    }

    /// Reproduce one entry at the destination. Dispatches on entry kind.
    pub fn apply(&mut self, entry: &SourceEntry) -> Result<(), SnapmillError> {
        match entry.kind {
            EntryKind::Directory => self.make_directory(entry),
            EntryKind::File => self.place_file(entry),
            EntryKind::Symlink => self.place_symlink(entry),
            EntryKind::Other => Err(SnapmillError::UnsupportedEntry {
                path: entry.rel_path.clone(),
            }),
        }
    }

    /// Create a directory with the source's permission bits.
    ///
    /// The snapshot root itself is pre-created before the walk starts and
    /// is skipped here; an already existing nested directory is benign.
    fn make_directory(&mut self, entry: &SourceEntry) -> Result<(), SnapmillError> {
        if entry.is_root() {
            return Ok(());
        }

        let dest = self.staging_root.join(&entry.rel_path);
        debug!(path = %entry.rel_path.display(), "mkdir");

        match fs::create_dir(&dest) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
            Err(e) => return Err(SnapmillError::materialize(&entry.rel_path, e)),
        }

        set_mode(&dest, entry.mode).map_err(|e| SnapmillError::materialize(&entry.rel_path, e))?;
        self.stats.dirs_created += 1;
        Ok(())
    }

    /// Materialize a regular file: hardlink to the previous snapshot when
    /// the five-field metadata comparison matches, full copy otherwise.
    fn place_file(&mut self, entry: &SourceEntry) -> Result<(), SnapmillError> {
        let src = self.source_root.join(&entry.rel_path);
        let dest = self.staging_root.join(&entry.rel_path);

        // Re-check against the live filesystem: anything that is no longer
        // a regular file at the file path is skipped, not copied.
        let live = fs::symlink_metadata(&src)
            .map_err(|e| SnapmillError::materialize(&entry.rel_path, e))?;
        if !live.file_type().is_file() {
            warn!(
                path = %entry.rel_path.display(),
                "ignored: not a regular file"
            );
            self.stats.skipped += 1;
            return Ok(());
        }

        if let Some(previous_root) = &self.previous {
            let previous = previous_root.join(&entry.rel_path);
            if let Ok(prev_meta) = fs::symlink_metadata(&previous) {
                if prev_meta.file_type().is_file() && hardlink_eligible(entry, &prev_meta) {
                    debug!(
                        path = %entry.rel_path.display(),
                        previous = %previous.display(),
                        "hardlink"
                    );
                    fs::hard_link(&previous, &dest)
                        .map_err(|e| SnapmillError::materialize(&entry.rel_path, e))?;
                    self.stats.files_linked += 1;
                    return Ok(());
                }
            }
        }

        debug!(path = %entry.rel_path.display(), size = entry.size, "copy");
        let written = copy_contents(&src, &dest)
            .map_err(|e| SnapmillError::materialize(&entry.rel_path, e))?;
        self.apply_file_metadata(&dest, entry)?;

        self.stats.files_copied += 1;
        self.stats.bytes_copied += written;
        Ok(())
    }

    /// Recreate a symlink with the captured target string, verbatim.
    fn place_symlink(&mut self, entry: &SourceEntry) -> Result<(), SnapmillError> {
        let target = entry.symlink_target.as_ref().ok_or_else(|| {
            SnapmillError::materialize(
                &entry.rel_path,
                std::io::Error::new(ErrorKind::InvalidInput, "symlink entry without a target"),
            )
        })?;

        let dest = self.staging_root.join(&entry.rel_path);
        debug!(
            path = %entry.rel_path.display(),
            target = %target.display(),
            "symlink"
        );

        std::os::unix::fs::symlink(target, &dest)
            .map_err(|e| SnapmillError::materialize(&entry.rel_path, e))?;
        self.stats.symlinks_created += 1;
        Ok(())
    }

    /// Copy owner, group, mode bits, and both timestamps onto a fresh copy.
    fn apply_file_metadata(&self, dest: &Path, entry: &SourceEntry) -> Result<(), SnapmillError> {
        // Ownership can legitimately fail for unprivileged runs; keep the
        // copy and warn instead of aborting the whole snapshot.
        if let Err(e) = nix::unistd::chown(
            dest,
            Some(nix::unistd::Uid::from_raw(entry.uid)),
            Some(nix::unistd::Gid::from_raw(entry.gid)),
        ) {
            warn!(
                path = %entry.rel_path.display(),
                uid = entry.uid,
                gid = entry.gid,
                "could not preserve ownership: {e}"
            );
        }

        set_mode(dest, entry.mode).map_err(|e| SnapmillError::materialize(&entry.rel_path, e))?;

        filetime::set_file_times(dest, entry.atime, entry.mtime)
            .map_err(|e| SnapmillError::materialize(&entry.rel_path, e))?;
        Ok(())
    }
}

/// Stream all bytes from `src` to a newly created `dest`.
///
/// Every successful read is fully written before the next read, so an
/// interrupted run can leave a short file in the staging tree but never a
/// silently truncated one in a published snapshot.
fn copy_contents(src: &Path, dest: &Path) -> std::io::Result<u64> {
    let mut reader = File::open(src)?;
    let mut writer = File::create(dest)?;

    let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
    let mut total = 0u64;

    loop {
        let read = reader.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        writer.write_all(&buffer[..read])?;
        total += read as u64;
    }

    Ok(total)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::walk_source;
    use filetime::FileTime;
    use std::os::unix::fs::{MetadataExt, PermissionsExt};
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn entry_at(root: &Path, rel: &str) -> SourceEntry {
        let path = root.join(rel);
        let metadata = fs::symlink_metadata(&path).expect("stat entry");
        let kind = EntryKind::from_file_type(metadata.file_type());
        let target = (kind == EntryKind::Symlink).then(|| fs::read_link(&path).expect("readlink"));
        SourceEntry::from_metadata(PathBuf::from(rel), kind, &metadata, target)
    }

    fn materialize_tree(source: &Path, staging: &Path, previous: Option<PathBuf>) -> MaterializeStats {
        let mut materializer =
            Materializer::new(source.to_path_buf(), staging.to_path_buf(), previous);
        walk_source(source, |entry| materializer.apply(entry)).expect("walk should succeed");
        materializer.into_stats()
    }

    #[test]
    fn test_directory_op_skips_root_and_applies_mode() {
        let src = TempDir::new().expect("create src tempdir");
        let dst = TempDir::new().expect("create dst tempdir");

        fs::create_dir(src.path().join("sub")).expect("create subdir");
        fs::set_permissions(src.path().join("sub"), fs::Permissions::from_mode(0o750))
            .expect("chmod subdir");

        let mut materializer =
            Materializer::new(src.path().to_path_buf(), dst.path().to_path_buf(), None);

        let root = entry_at(src.path(), "");
        materializer.apply(&root).expect("root entry is a no-op");

        let sub = entry_at(src.path(), "sub");
        materializer.apply(&sub).expect("create subdir");

        let created = fs::symlink_metadata(dst.path().join("sub")).expect("stat created dir");
        assert!(created.is_dir());
        assert_eq!(created.permissions().mode() & 0o777, 0o750);
        assert_eq!(materializer.stats().dirs_created, 1);
    }

    #[test]
    fn test_repeated_directory_op_is_benign() {
        let src = TempDir::new().expect("create src tempdir");
        let dst = TempDir::new().expect("create dst tempdir");
        fs::create_dir(src.path().join("sub")).expect("create subdir");

        let mut materializer =
            Materializer::new(src.path().to_path_buf(), dst.path().to_path_buf(), None);
        let sub = entry_at(src.path(), "sub");
        materializer.apply(&sub).expect("first create");
        materializer.apply(&sub).expect("second create is benign");
    }

    #[test]
    fn test_copy_preserves_content_mode_and_mtime() {
        let src = TempDir::new().expect("create src tempdir");
        let dst = TempDir::new().expect("create dst tempdir");

        let file = src.path().join("b.txt");
        fs::write(&file, vec![b'x'; 500]).expect("write file");
        fs::set_permissions(&file, fs::Permissions::from_mode(0o644)).expect("chmod file");

        let mut materializer =
            Materializer::new(src.path().to_path_buf(), dst.path().to_path_buf(), None);
        let entry = entry_at(src.path(), "b.txt");
        materializer.apply(&entry).expect("copy file");

        let copied = dst.path().join("b.txt");
        assert_eq!(fs::read(&copied).expect("read copy").len(), 500);

        let meta = fs::symlink_metadata(&copied).expect("stat copy");
        assert_eq!(meta.permissions().mode() & 0o777, 0o644);
        assert_eq!(FileTime::from_last_modification_time(&meta), entry.mtime);
        assert_eq!(materializer.stats().files_copied, 1);
        assert_eq!(materializer.stats().bytes_copied, 500);
    }

    #[test]
    fn test_copy_handles_files_larger_than_one_buffer() {
        let src = TempDir::new().expect("create src tempdir");
        let dst = TempDir::new().expect("create dst tempdir");

        let size = COPY_BUFFER_SIZE * 2 + 4321;
        fs::write(src.path().join("big.bin"), vec![7u8; size]).expect("write big file");

        let mut materializer =
            Materializer::new(src.path().to_path_buf(), dst.path().to_path_buf(), None);
        let entry = entry_at(src.path(), "big.bin");
        materializer.apply(&entry).expect("copy big file");

        let copied = fs::read(dst.path().join("big.bin")).expect("read copy");
        assert_eq!(copied.len(), size);
        assert!(copied.iter().all(|&b| b == 7));
        assert_eq!(materializer.stats().bytes_copied, size as u64);
    }

    #[test]
    fn test_unchanged_file_is_hardlinked_to_previous() {
        let src = TempDir::new().expect("create src tempdir");
        let dst = TempDir::new().expect("create dst tempdir");

        fs::write(src.path().join("keep.txt"), b"stable contents").expect("write file");

        let first = dst.path().join("first");
        fs::create_dir(&first).expect("create first snapshot dir");
        materialize_tree(src.path(), &first, None);

        let second = dst.path().join("second");
        fs::create_dir(&second).expect("create second snapshot dir");
        let stats = materialize_tree(src.path(), &second, Some(first.clone()));

        let first_ino = fs::symlink_metadata(first.join("keep.txt"))
            .expect("stat first copy")
            .ino();
        let second_ino = fs::symlink_metadata(second.join("keep.txt"))
            .expect("stat second copy")
            .ino();
        assert_eq!(first_ino, second_ino, "unchanged file must share its inode");
        assert_eq!(stats.files_linked, 1);
        assert_eq!(stats.files_copied, 0);
    }

    #[test]
    fn test_changed_file_is_recopied() {
        let src = TempDir::new().expect("create src tempdir");
        let dst = TempDir::new().expect("create dst tempdir");

        fs::write(src.path().join("file.txt"), b"version one").expect("write v1");

        let first = dst.path().join("first");
        fs::create_dir(&first).expect("create first snapshot dir");
        materialize_tree(src.path(), &first, None);

        fs::write(src.path().join("file.txt"), b"version two is longer").expect("write v2");

        let second = dst.path().join("second");
        fs::create_dir(&second).expect("create second snapshot dir");
        let stats = materialize_tree(src.path(), &second, Some(first.clone()));

        assert_eq!(stats.files_copied, 1);
        assert_eq!(stats.files_linked, 0);
        assert_eq!(
            fs::read(second.join("file.txt")).expect("read second copy"),
            b"version two is longer"
        );

        let first_ino = fs::symlink_metadata(first.join("file.txt"))
            .expect("stat first")
            .ino();
        let second_ino = fs::symlink_metadata(second.join("file.txt"))
            .expect("stat second")
            .ino();
        assert_ne!(first_ino, second_ino, "changed file must get its own inode");
    }

    #[test]
    fn test_file_missing_from_previous_is_copied() {
        let src = TempDir::new().expect("create src tempdir");
        let dst = TempDir::new().expect("create dst tempdir");

        fs::write(src.path().join("new.txt"), b"brand new").expect("write file");

        let previous = dst.path().join("previous");
        fs::create_dir(&previous).expect("create empty previous snapshot");

        let staging = dst.path().join("staging");
        fs::create_dir(&staging).expect("create staging dir");
        let stats = materialize_tree(src.path(), &staging, Some(previous));

        assert_eq!(stats.files_copied, 1);
        assert_eq!(stats.files_linked, 0);
        assert_eq!(
            fs::read(staging.join("new.txt")).expect("read copy"),
            b"brand new"
        );
    }

    #[test]
    #[cfg(unix)]
    fn test_symlink_target_is_reproduced_verbatim() {
        let src = TempDir::new().expect("create src tempdir");
        let dst = TempDir::new().expect("create dst tempdir");

        fs::write(src.path().join("b.txt"), b"target").expect("write target");
        std::os::unix::fs::symlink("b.txt", src.path().join("link")).expect("create symlink");

        let mut materializer =
            Materializer::new(src.path().to_path_buf(), dst.path().to_path_buf(), None);
        let entry = entry_at(src.path(), "link");
        materializer.apply(&entry).expect("recreate symlink");

        let target = fs::read_link(dst.path().join("link")).expect("readlink copy");
        assert_eq!(target, PathBuf::from("b.txt"));
        assert_eq!(materializer.stats().symlinks_created, 1);
    }

    #[test]
    #[cfg(unix)]
    fn test_non_regular_file_at_file_path_is_soft_skipped() {
        use nix::sys::stat::Mode;
        use nix::unistd::mkfifo;

        let src = TempDir::new().expect("create src tempdir");
        let dst = TempDir::new().expect("create dst tempdir");

        // Capture metadata as if this were a regular file, then replace the
        // source with a FIFO to simulate the race the guard exists for.
        fs::write(src.path().join("swap"), b"was a file").expect("write file");
        let entry = entry_at(src.path(), "swap");
        fs::remove_file(src.path().join("swap")).expect("remove file");
        mkfifo(&src.path().join("swap"), Mode::from_bits_truncate(0o644)).expect("create fifo");

        let mut materializer =
            Materializer::new(src.path().to_path_buf(), dst.path().to_path_buf(), None);
        materializer
            .apply(&entry)
            .expect("non-regular file is skipped, not fatal");

        assert!(!dst.path().join("swap").exists());
        assert_eq!(materializer.stats().skipped, 1);
        assert_eq!(materializer.stats().files_copied, 0);
    }
}
