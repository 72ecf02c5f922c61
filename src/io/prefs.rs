// prefs.rs — Runtime preferences for sniffing, decompression and sessions.
//
// Decisions:
// - Compile-time defaults live in `crate::config`; `Prefs` is the value type
//   the caller owns and hands to `SessionManager::new`.
// - Setters take `&mut self`, clamp to the accepted range and return the value
//   actually stored.
// - `from_env` layers DECOMPVIEW_* environment overrides on top of the
//   defaults. Unparseable values are reported at level 2 and ignored.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::{
    CHUNK_SIZE, CHUNK_SIZE_MAX, CHUNK_SIZE_MIN, ENV_CHUNK_SIZE, ENV_TMPDIR, ENV_WORKERS,
    NB_WORKERS_DEFAULT, NB_WORKERS_MAX, PROGRESS_INTERVAL, QUEUE_SIZE_DEFAULT,
};
use crate::displaylevel;

// ---------------------------------------------------------------------------
// Preferences struct
// ---------------------------------------------------------------------------

/// Tunables for the decompression pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prefs {
    /// Bytes moved per read/write step of the streaming copy. Default: 4096.
    pub chunk_size: usize,
    /// Minimum spacing between progress updates. Default: 100 ms.
    pub progress_interval: Duration,
    /// Parent directory for per-session temp directories.
    /// `None` uses the platform temp directory.
    pub temp_root: Option<PathBuf>,
    /// Background decompression workers. Default: see [`default_nb_workers`].
    pub nb_workers: usize,
    /// Jobs allowed to queue for a worker before `submit` blocks. Default: 4.
    pub queue_size: usize,
}

/// Returns the default worker count: `NB_WORKERS_DEFAULT`, never more than
/// the machine's logical CPU count.
pub fn default_nb_workers() -> usize {
    NB_WORKERS_DEFAULT.min(num_cpus::get()).max(1)
}

impl Default for Prefs {
    fn default() -> Self {
        Prefs {
            chunk_size: CHUNK_SIZE,
            progress_interval: PROGRESS_INTERVAL,
            temp_root: None,
            nb_workers: default_nb_workers(),
            queue_size: QUEUE_SIZE_DEFAULT,
        }
    }
}

// ---------------------------------------------------------------------------
// Setters
// ---------------------------------------------------------------------------

impl Prefs {
    /// Creates a new `Prefs` with all defaults applied.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `DECOMPVIEW_TMPDIR`, `DECOMPVIEW_WORKERS` and
    /// `DECOMPVIEW_CHUNK_SIZE` when they are set.
    pub fn from_env() -> Self {
        let mut prefs = Self::default();

        if let Some(dir) = env::var_os(ENV_TMPDIR) {
            if !dir.is_empty() {
                prefs.set_temp_root(Some(Path::new(&dir)));
            }
        }
        if let Some(n) = read_env_usize(ENV_WORKERS) {
            prefs.set_nb_workers(n);
        }
        if let Some(n) = read_env_usize(ENV_CHUNK_SIZE) {
            prefs.set_chunk_size(n);
        }
        prefs
    }

    /// Sets the copy chunk size, clamped to [`CHUNK_SIZE_MIN`, `CHUNK_SIZE_MAX`].
    pub fn set_chunk_size(&mut self, chunk_size: usize) -> usize {
        self.chunk_size = chunk_size.clamp(CHUNK_SIZE_MIN, CHUNK_SIZE_MAX);
        self.chunk_size
    }

    /// Sets the progress interval. Zero is allowed (report every chunk).
    pub fn set_progress_interval(&mut self, interval: Duration) -> Duration {
        self.progress_interval = interval;
        interval
    }

    /// Sets the parent directory for temp directories; `None` restores the
    /// platform default. Returns true if a custom root is now active.
    pub fn set_temp_root(&mut self, root: Option<&Path>) -> bool {
        self.temp_root = root.map(Path::to_path_buf);
        self.temp_root.is_some()
    }

    /// Sets the worker count, clamped to [1, `NB_WORKERS_MAX`].
    pub fn set_nb_workers(&mut self, nb_workers: usize) -> usize {
        self.nb_workers = nb_workers.clamp(1, NB_WORKERS_MAX);
        self.nb_workers
    }

    /// Sets the queue size; at least 1.
    pub fn set_queue_size(&mut self, queue_size: usize) -> usize {
        self.queue_size = queue_size.max(1);
        self.queue_size
    }
}

fn read_env_usize(name: &str) -> Option<usize> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse::<usize>() {
        Ok(n) => Some(n),
        Err(_) => {
            displaylevel!(2, "warning: ignoring {}={:?}: not a number\n", name, raw);
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
