// decompview — transparent read-only viewing of compressed files

pub mod codec;
pub mod config;
pub mod display;
pub mod error;
pub mod io;
pub mod progress;
pub mod session;
pub mod util;
pub mod worker;

// ── Top-level re-exports ──────────────────────────────────────────────────────
pub use codec::{CodecDescriptor, CodecRegistry, LoadState};
pub use error::{DecompressError, SessionError};
pub use io::{decompress_file, detect, DecompressStats, Detected, Prefs};
pub use session::{
    ActivateOutcome, BufferId, CloseOutcome, DecompressionSession, LoadOutcome, NullReporter,
    SessionManager, StatusReporter, ViewHost,
};
pub use worker::{CancelToken, DecompressPool, JobHandle};
