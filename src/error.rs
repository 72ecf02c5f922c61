//! Error types for the decompression pipeline and session lifecycle.
//!
//! Low-level file primitives return `std::io::Result`; these enums attach the
//! path or codec involved at the boundary where that context is known.
//! "No codec matched" is never an error: detection returns `Option`.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure while streaming a compressed source into its destination.
#[derive(Error, Debug)]
pub enum DecompressError {
    #[error("cannot open {}: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },

    #[error("cannot create {}: {source}", path.display())]
    Create { path: PathBuf, source: io::Error },

    #[error("{codec} stream is corrupt or unreadable: {source}")]
    Decode {
        codec: &'static str,
        source: io::Error,
    },

    #[error("write to {} failed: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("decompression cancelled")]
    Cancelled,
}

/// Failure while opening or re-syncing a decompressed view.
///
/// Event handlers on `SessionManager` never propagate this to the host; it
/// is logged and folded into the handler's outcome value.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("cannot stat {}: {source}", path.display())]
    Stat { path: PathBuf, source: io::Error },

    #[error("cannot create temporary directory: {0}")]
    TempDir(#[source] io::Error),

    #[error(transparent)]
    Decompress(#[from] DecompressError),

    #[error("cannot rename {} to {}: {source}", from.display(), to.display())]
    Rename {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },

    #[error("editor host call failed: {0:#}")]
    Host(#[from] anyhow::Error),

    #[error("decompression worker exited without reporting a result")]
    Worker,

    #[error("cannot start {0} decompression worker(s)")]
    WorkerPool(usize),
}

impl DecompressError {
    /// True when the job stopped because its cancel flag was raised.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DecompressError::Cancelled)
    }
}

impl SessionError {
    /// True when the underlying decompression was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SessionError::Decompress(e) if e.is_cancelled())
    }
}
