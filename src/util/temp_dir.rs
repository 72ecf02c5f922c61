//! Per-session temporary directories.
//!
//! Every decompression gets a fresh directory from [`tempfile::Builder`], so
//! two sessions never share a directory or a file path. The directory is
//! detached from `TempDir`'s drop guard: its lifetime belongs to the
//! displayed buffer, and [`remove_session_artifacts`] tears it down in a
//! fixed order (file, then the now-empty directory).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::TEMP_DIR_PREFIX;
use crate::displaylevel;

/// Creates a new, uniquely named directory under `root` (or the platform
/// temp directory) and returns its path. The caller owns its removal.
pub fn create_session_dir(root: Option<&Path>) -> io::Result<PathBuf> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(TEMP_DIR_PREFIX);
    let dir = match root {
        Some(root) => builder.tempdir_in(root)?,
        None => builder.tempdir()?,
    };
    Ok(dir.keep())
}

/// What [`remove_session_artifacts`] managed to delete.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// The file is gone (removed now, or already absent).
    pub file_removed: bool,
    /// The directory is gone (removed now, or already absent).
    pub dir_removed: bool,
}

impl CleanupReport {
    pub fn is_complete(&self) -> bool {
        self.file_removed && self.dir_removed
    }
}

/// Removes `file`, then `dir` if the file is gone.
///
/// The directory is removed with `remove_dir`, never recursively: if
/// something else was placed in it, removal fails and is logged. No failure
/// here propagates.
pub fn remove_session_artifacts(file: &Path, dir: &Path) -> CleanupReport {
    let mut report = CleanupReport::default();

    match fs::remove_file(file) {
        Ok(()) => report.file_removed = true,
        Err(e) if e.kind() == io::ErrorKind::NotFound => report.file_removed = true,
        Err(e) => {
            displaylevel!(1, "cannot remove temp file {}: {}\n", file.display(), e);
            return report;
        }
    }

    match fs::remove_dir(dir) {
        Ok(()) => report.dir_removed = true,
        Err(e) if e.kind() == io::ErrorKind::NotFound => report.dir_removed = true,
        Err(e) => {
            displaylevel!(1, "cannot remove temp directory {}: {}\n", dir.display(), e);
        }
    }

    report
}

// ── Tests ─────────────────────────────────────────────────────────────────────
