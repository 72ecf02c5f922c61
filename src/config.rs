// config.rs — Compile-time configuration constants.
//
// Every value here is a default; `Prefs` carries the runtime copy and may be
// overridden from the environment (see `prefs::Prefs::from_env`).

use std::time::Duration;

// Size of each read/write step of the streaming copy.
// Can be overridden at runtime with DECOMPVIEW_CHUNK_SIZE.
pub const CHUNK_SIZE: usize = 4096;

// Bounds accepted for a runtime chunk size.
pub const CHUNK_SIZE_MIN: usize = 512;
pub const CHUNK_SIZE_MAX: usize = 4 * 1024 * 1024;

// Minimum spacing between two progress updates sent to the status reporter.
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

// Prefix of every temporary directory created for a decompressed view.
pub const TEMP_DIR_PREFIX: &str = "decompview-";

// Appended to the staging file name when it would collide with the final name.
pub const PARTIAL_SUFFIX: &str = ".part";

// Name used when stripping the codec suffix leaves nothing (source named ".gz").
pub const FALLBACK_FILE_NAME: &str = "decompressed";

// Default number of background decompression workers.
// Can be overridden with DECOMPVIEW_WORKERS.
pub const NB_WORKERS_DEFAULT: usize = 2;

// Upper bound on runtime-selectable workers.
pub const NB_WORKERS_MAX: usize = 16;

// Jobs that may wait for a free worker before `submit` blocks.
pub const QUEUE_SIZE_DEFAULT: usize = 4;

// Environment variable names read by `Prefs::from_env`.
pub const ENV_TMPDIR: &str = "DECOMPVIEW_TMPDIR";
pub const ENV_WORKERS: &str = "DECOMPVIEW_WORKERS";
pub const ENV_CHUNK_SIZE: &str = "DECOMPVIEW_CHUNK_SIZE";
