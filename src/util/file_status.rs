//! File status helpers.
//!
//! Thin wrappers over `std::fs::metadata` used by the sniffer (size probe)
//! and the session manager (modification-time provenance). Modification
//! times are carried as [`filetime::FileTime`] so they compare with
//! nanosecond precision where the platform records it.

use std::fs;
use std::io;
use std::path::Path;

use filetime::FileTime;

/// Size in bytes of the regular file at `path`, or `None` when the path is
/// missing, unreadable, or not a regular file.
pub fn file_size(path: &Path) -> Option<u64> {
    let meta = fs::metadata(path).ok()?;
    meta.file_type().is_file().then(|| meta.len())
}

/// Last-modification time of `path`.
pub fn modified_time(path: &Path) -> io::Result<FileTime> {
    let meta = fs::metadata(path)?;
    Ok(FileTime::from_last_modification_time(&meta))
}

/// Last-modification time of `path`, or `None` when it no longer exists.
/// Other stat failures are returned as errors.
pub fn modified_time_if_exists(path: &Path) -> io::Result<Option<FileTime>> {
    match modified_time(path) {
        Ok(t) => Ok(Some(t)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
