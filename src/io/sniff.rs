//! Format detection by binary signature.
//!
//! [`detect`] walks the registry in precedence order, reading the file's
//! leading bytes lazily: a candidate whose header disagrees with what is
//! already buffered is rejected without touching the file again, and only a
//! prefix-compatible candidate causes more bytes to be read (up to its
//! header length). If no header matches, extension-only codecs are tried by
//! file name.
//!
//! # Design notes
//!
//! - **Length cutoff**: a file must hold strictly more bytes than a codec's
//!   header to match it. A file that is nothing but a magic number (or a
//!   truncated prefix of one) is not a usable stream.
//!
//! - **Unavailable codecs**: a header match whose codec fails
//!   `ensure_loaded` is treated as a mismatch and the search continues.
//!
//! - **Errors**: detection never fails. Missing, empty, unreadable and
//!   unrecognised files all yield `None`; I/O problems are logged at
//!   level 4 because callers probe speculatively.

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use crate::codec::{CodecDescriptor, CodecRegistry, DecodeOpen};
use crate::displaylevel;
use crate::util::file_size;

/// A successful detection.
#[derive(Clone, Copy)]
pub struct Detected {
    /// Codec name, e.g. `"gzip"`.
    pub name: &'static str,
    /// Suffix stripped to name the decompressed file, e.g. `".gz"`.
    pub suffix: &'static str,
    /// Bound decode entry point.
    pub open: DecodeOpen,
}

impl Detected {
    fn from_codec(codec: &CodecDescriptor, open: DecodeOpen) -> Self {
        Detected {
            name: codec.name(),
            suffix: codec.extension(),
            open,
        }
    }
}

impl fmt::Debug for Detected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Detected")
            .field("name", &self.name)
            .field("suffix", &self.suffix)
            .finish_non_exhaustive()
    }
}

/// Identifies the codec for `path`, preferring its byte signature over its
/// name. Returns `None` when nothing applies.
pub fn detect(registry: &CodecRegistry, path: &Path) -> Option<Detected> {
    let len = match file_size(path) {
        Some(0) | None => return None,
        Some(n) => n,
    };

    match detect_by_header(registry, path, len) {
        Ok(Some(hit)) => return Some(hit),
        Ok(None) => {}
        Err(e) => {
            displaylevel!(4, "sniff {}: {}\n", path.display(), e);
            return None;
        }
    }

    let codec = registry.lookup_by_extension(path)?;
    let open = codec.decode_open()?;
    displaylevel!(4, "{}: matched {} by extension\n", path.display(), codec.name());
    Some(Detected::from_codec(codec, open))
}

/// First pass: incremental magic-header comparison in registry order.
fn detect_by_header(
    registry: &CodecRegistry,
    path: &Path,
    len: u64,
) -> io::Result<Option<Detected>> {
    let mut file = File::open(path)?;
    let mut prefix: Vec<u8> = Vec::with_capacity(registry.max_header_len());

    for codec in registry.iter() {
        let Some(header) = codec.magic() else {
            continue;
        };

        // Reject on what is already buffered before reading anything more.
        let known = prefix.len().min(header.len());
        if prefix[..known] != header[..known] {
            continue;
        }
        if len <= header.len() as u64 {
            continue;
        }

        if prefix.len() < header.len() {
            let start = prefix.len();
            prefix.resize(header.len(), 0);
            file.read_exact(&mut prefix[start..])?;
        }

        if prefix[..header.len()] != *header {
            continue;
        }
        match codec.decode_open() {
            Some(open) => {
                displaylevel!(4, "{}: matched {} by header\n", path.display(), codec.name());
                return Ok(Some(Detected::from_codec(codec, open)));
            }
            None => continue,
        }
    }

    Ok(None)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
