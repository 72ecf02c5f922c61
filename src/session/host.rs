//! Capabilities the session manager needs from the embedding editor.
//!
//! The editor owns windows, tabs and buffers; this crate only asks it to
//! open a buffer backed by a path, close the active buffer, and adjust a
//! buffer's name, read-only flag and focus. Calls that can fail return
//! `anyhow::Result` because their error types belong to the host.

use std::fmt;
use std::path::{Path, PathBuf};

/// Opaque identity of a displayed buffer, assigned by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u64);

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "buffer#{}", self.0)
    }
}

/// Buffer and view operations provided by the editor.
///
/// Implementations may call back into the session manager from inside
/// `open_buffer` (an editor typically fires its own "loaded" event there);
/// the manager holds no lock across host calls.
pub trait ViewHost: Send + Sync {
    /// Backing file of `buffer`, if it has one.
    fn buffer_path(&self, buffer: BufferId) -> Option<PathBuf>;

    /// Opens a new displayed buffer backed by `path` and makes it active.
    fn open_buffer(&self, path: &Path) -> anyhow::Result<BufferId>;

    /// Closes whichever buffer is currently active.
    fn close_active_buffer(&self) -> anyhow::Result<()>;

    fn set_read_only(&self, buffer: BufferId, read_only: bool);

    /// Sets the title shown for `buffer`.
    fn set_name(&self, buffer: BufferId, name: &str);

    /// Buffers currently open, in any order.
    fn list_open_buffers(&self) -> Vec<BufferId>;

    fn focus(&self, buffer: BufferId);

    /// Re-reads `buffer` from its backing file after the file was rewritten.
    /// Hosts that already watch their files can keep the default.
    fn reload_buffer(&self, _buffer: BufferId) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Sink for short, transient user-visible messages (a status bar).
pub trait StatusReporter: Send + Sync {
    fn report_transient_message(&self, message: &str);
}

impl<F> StatusReporter for F
where
    F: Fn(&str) + Send + Sync,
{
    fn report_transient_message(&self, message: &str) {
        self(message)
    }
}

/// Discards every message.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullReporter;

impl StatusReporter for NullReporter {
    fn report_transient_message(&self, _message: &str) {}
}
