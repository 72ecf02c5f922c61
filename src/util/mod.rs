//! Filesystem utilities shared by the sniffer and the session manager.
//!
//! - [`file_status`] — size and mtime probes
//! - [`temp_dir`]    — unique per-session temp directories and their removal

pub mod file_status;
pub mod temp_dir;

// ── Re-exports at `util::` level ─────────────────────────────────────────────

pub use file_status::{file_size, modified_time, modified_time_if_exists};

pub use temp_dir::{create_session_dir, remove_session_artifacts, CleanupReport};
