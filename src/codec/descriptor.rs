//! Codec descriptors and the write-once loader state they carry.
//!
//! A descriptor names a single-stream compression format: its file-name
//! suffix, an optional magic header, and a *resolver* that binds the decode
//! entry point. Resolution happens at most once per descriptor; the result
//! (bound function or "unavailable") is frozen in a [`OnceLock`] and every
//! later lookup reads it without retrying.

use std::fmt;
use std::io::{self, Read};
use std::path::Path;
use std::sync::OnceLock;

use crate::displaylevel;

/// Readable stream of decompressed bytes.
pub type DecodeStream = Box<dyn Read + Send>;

/// Opens a decode stream over the compressed file at `path`.
pub type DecodeOpen = fn(&Path) -> io::Result<DecodeStream>;

/// Binds a codec's decode entry point, or reports that the backing library
/// is absent from this build.
pub type Resolver = fn() -> Option<DecodeOpen>;

/// Resolution progress of a descriptor. Moves from `NotAttempted` to one of
/// the other two exactly once and never reverts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadState {
    NotAttempted,
    Loaded,
    Unavailable,
}

/// A known compression format.
pub struct CodecDescriptor {
    name: &'static str,
    extension: &'static str,
    magic: Option<&'static [u8]>,
    resolver: Resolver,
    resolved: OnceLock<Option<DecodeOpen>>,
}

impl CodecDescriptor {
    /// Descriptor recognised by its leading `magic` bytes first and by
    /// `extension` only for naming the decompressed file.
    pub const fn with_magic(
        name: &'static str,
        extension: &'static str,
        magic: &'static [u8],
        resolver: Resolver,
    ) -> Self {
        CodecDescriptor {
            name,
            extension,
            magic: Some(magic),
            resolver,
            resolved: OnceLock::new(),
        }
    }

    /// Extension-only descriptor. Only consulted by the suffix fallback.
    pub const fn extension_only(
        name: &'static str,
        extension: &'static str,
        resolver: Resolver,
    ) -> Self {
        CodecDescriptor {
            name,
            extension,
            magic: None,
            resolver,
            resolved: OnceLock::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Suffix including the leading dot, e.g. `".gz"`.
    pub fn extension(&self) -> &'static str {
        self.extension
    }

    pub fn magic(&self) -> Option<&'static [u8]> {
        self.magic
    }

    pub fn load_state(&self) -> LoadState {
        match self.resolved.get() {
            None => LoadState::NotAttempted,
            Some(Some(_)) => LoadState::Loaded,
            Some(None) => LoadState::Unavailable,
        }
    }

    /// Resolves the decode entry point on first call and reports whether it
    /// is usable. Concurrent first calls run the resolver once; the loser
    /// observes the winner's result.
    pub fn ensure_loaded(&self) -> bool {
        self.resolved
            .get_or_init(|| {
                let bound = (self.resolver)();
                match bound {
                    Some(_) => displaylevel!(4, "codec {} loaded\n", self.name),
                    None => displaylevel!(
                        2,
                        "warning: codec {} is not available in this build; {} files will open as-is\n",
                        self.name,
                        self.extension
                    ),
                }
                bound
            })
            .is_some()
    }

    /// The bound decode function, resolving it first if needed.
    pub fn decode_open(&self) -> Option<DecodeOpen> {
        if self.ensure_loaded() {
            self.resolved.get().copied().flatten()
        } else {
            None
        }
    }

    /// True when the final component of `path` ends with this codec's
    /// extension (ASCII case-insensitive) and is longer than it.
    pub fn matches_extension(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        has_suffix_ignore_case(name, self.extension)
    }

    /// True when `prefix` starts with this codec's full magic header.
    pub fn matches_header(&self, prefix: &[u8]) -> bool {
        matches!(self.magic, Some(magic) if prefix.starts_with(magic))
    }
}

impl fmt::Debug for CodecDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecDescriptor")
            .field("name", &self.name)
            .field("extension", &self.extension)
            .field("magic", &self.magic)
            .field("load_state", &self.load_state())
            .finish()
    }
}

/// `name` ends with `suffix` ignoring ASCII case, and has at least one byte
/// in front of it.
pub(crate) fn has_suffix_ignore_case(name: &str, suffix: &str) -> bool {
    let (n, s) = (name.as_bytes(), suffix.as_bytes());
    !s.is_empty() && n.len() > s.len() && n[n.len() - s.len()..].eq_ignore_ascii_case(s)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
