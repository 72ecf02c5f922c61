//! Streaming decompression of one source file into one destination file.
//!
//! [`decompress_to`] sniffs `src`, opens the matching decode stream and
//! copies it into a freshly created `dst` in `prefs.chunk_size` steps. It is
//! the body of every background job and of the synchronous
//! [`decompress_file`] convenience.
//!
//! # Design notes
//!
//! - **No match is not an error**: when the sniffer finds nothing the
//!   function returns `Ok(None)` and `dst` is never created.
//!
//! - **Progress**: the running byte count is handed to `on_progress` at most
//!   once per `prefs.progress_interval`, plus once at the end so observers
//!   always see the final total.
//!
//! - **Cancellation**: the shared flag is polled once per chunk. A raised
//!   flag ends the copy with [`DecompressError::Cancelled`]; the partial
//!   destination is left for the caller to clean up.
//!
//! - **Stream lifetime**: the decode stream is owned by the copy frame and
//!   dropped (closing the source file) on every exit path, including
//!   mid-stream read or write errors.
//!
//! - **Partial output**: on any error `dst` may hold a prefix of the data.
//!   The source file is only ever read.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::codec::CodecRegistry;
use crate::error::DecompressError;
use crate::io::prefs::Prefs;
use crate::io::sniff::{detect, Detected};
use crate::progress::RefreshGate;

// ---------------------------------------------------------------------------
// Public stats
// ---------------------------------------------------------------------------

/// Result of a completed decompression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecompressStats {
    /// Codec that decoded the source.
    pub codec: &'static str,
    /// Suffix to strip from the source name, e.g. `".gz"`.
    pub suffix: &'static str,
    /// Bytes written to the destination.
    pub decompressed_bytes: u64,
}

// ---------------------------------------------------------------------------
// copy_stream
// ---------------------------------------------------------------------------

/// Moves every byte of `src` into `dst`, `chunk_size` at a time.
///
/// Read failures are attributed to the codec, write failures to `dst_path`.
fn copy_stream<R: Read + ?Sized, W: Write + ?Sized>(
    src: &mut R,
    dst: &mut W,
    codec: &'static str,
    dst_path: &Path,
    prefs: &Prefs,
    cancel: &AtomicBool,
    on_progress: &mut dyn FnMut(u64),
) -> Result<u64, DecompressError> {
    let mut buf = vec![0u8; prefs.chunk_size];
    let mut gate = RefreshGate::new(prefs.progress_interval);
    let mut total: u64 = 0;

    loop {
        if cancel.load(Ordering::Relaxed) {
            return Err(DecompressError::Cancelled);
        }
        let n = match src.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(source) => return Err(DecompressError::Decode { codec, source }),
        };
        dst.write_all(&buf[..n])
            .map_err(|source| DecompressError::Write {
                path: dst_path.to_path_buf(),
                source,
            })?;
        total += n as u64;
        if gate.ready() {
            on_progress(total);
        }
    }

    dst.flush().map_err(|source| DecompressError::Write {
        path: dst_path.to_path_buf(),
        source,
    })?;
    on_progress(total);
    Ok(total)
}

// ---------------------------------------------------------------------------
// decompress_detected
// ---------------------------------------------------------------------------

/// Decodes `src` with an already detected codec into a new file at `dst`.
pub fn decompress_detected(
    detected: &Detected,
    src: &Path,
    dst: &Path,
    prefs: &Prefs,
    cancel: &AtomicBool,
    on_progress: &mut dyn FnMut(u64),
) -> Result<DecompressStats, DecompressError> {
    let mut stream = (detected.open)(src).map_err(|source| DecompressError::Open {
        path: src.to_path_buf(),
        source,
    })?;
    let mut out = File::create(dst).map_err(|source| DecompressError::Create {
        path: dst.to_path_buf(),
        source,
    })?;

    let bytes = copy_stream(
        &mut stream,
        &mut out,
        detected.name,
        dst,
        prefs,
        cancel,
        on_progress,
    )?;

    Ok(DecompressStats {
        codec: detected.name,
        suffix: detected.suffix,
        decompressed_bytes: bytes,
    })
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Sniffs `src` and, if a codec applies, decompresses it into `dst`.
///
/// Returns `Ok(None)` when no available codec matches.
///
/// # Errors
///
/// Returns an error when the decode stream cannot be opened, the
/// destination cannot be created or written, the compressed data is
/// corrupt, or `cancel` is raised mid-copy.
pub fn decompress_to(
    registry: &CodecRegistry,
    src: &Path,
    dst: &Path,
    prefs: &Prefs,
    cancel: &AtomicBool,
    on_progress: &mut dyn FnMut(u64),
) -> Result<Option<DecompressStats>, DecompressError> {
    let Some(detected) = detect(registry, src) else {
        return Ok(None);
    };
    decompress_detected(&detected, src, dst, prefs, cancel, on_progress).map(Some)
}

/// Synchronous, uncancellable [`decompress_to`] with default preferences
/// and no progress reporting.
pub fn decompress_file(
    registry: &CodecRegistry,
    src: &Path,
    dst: &Path,
) -> Result<Option<DecompressStats>, DecompressError> {
    let never = AtomicBool::new(false);
    decompress_to(registry, src, dst, &Prefs::default(), &never, &mut |_| {})
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
