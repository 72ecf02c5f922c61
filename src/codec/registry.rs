//! Ordered codec table.
//!
//! Insertion order is precedence order: when two headers could both match a
//! short prefix, the earlier descriptor wins. The registry is built once by
//! the embedding process and shared by reference (typically behind an
//! `Arc`); the only mutation after construction is each descriptor's
//! write-once load state.

use std::path::Path;

use super::builtin::default_codecs;
use super::descriptor::{CodecDescriptor, LoadState};
use crate::displaylevel;

#[derive(Debug, Default)]
pub struct CodecRegistry {
    codecs: Vec<CodecDescriptor>,
}

impl CodecRegistry {
    /// Empty registry; add codecs with [`register`](Self::register).
    pub fn new() -> Self {
        CodecRegistry { codecs: Vec::new() }
    }

    /// Registry holding gzip, bzip2 and xz, in that order.
    pub fn with_defaults() -> Self {
        CodecRegistry {
            codecs: default_codecs(),
        }
    }

    /// Appends `codec` at the lowest precedence.
    pub fn register(&mut self, codec: CodecDescriptor) {
        self.codecs.push(codec);
    }

    pub fn iter(&self) -> impl Iterator<Item = &CodecDescriptor> {
        self.codecs.iter()
    }

    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&CodecDescriptor> {
        self.codecs.iter().find(|c| c.name() == name)
    }

    /// Longest magic header in the table; the most a sniff ever reads.
    pub fn max_header_len(&self) -> usize {
        self.codecs
            .iter()
            .filter_map(|c| c.magic().map(<[u8]>::len))
            .max()
            .unwrap_or(0)
    }

    /// First available codec whose magic header begins `prefix`.
    ///
    /// `prefix` must hold strictly more bytes than the header: a buffer that
    /// is exactly the header (or shorter) never matches.
    pub fn lookup_by_header(&self, prefix: &[u8]) -> Option<&CodecDescriptor> {
        self.codecs.iter().find(|c| {
            matches!(c.magic(), Some(m) if prefix.len() > m.len())
                && c.matches_header(prefix)
                && c.ensure_loaded()
        })
    }

    /// First available extension-only codec whose suffix ends `path`'s file
    /// name. Codecs that declare a header are never matched by name alone.
    pub fn lookup_by_extension(&self, path: &Path) -> Option<&CodecDescriptor> {
        self.codecs.iter().find(|c| {
            c.magic().is_none() && c.matches_extension(path) && c.ensure_loaded()
        })
    }

    /// Binds every codec now instead of on first use. Returns how many are
    /// usable. Codecs already resolved are not probed again.
    pub fn probe_all(&self) -> usize {
        let loaded = self.codecs.iter().filter(|c| c.ensure_loaded()).count();
        displaylevel!(
            4,
            "codec probe: {}/{} available\n",
            loaded,
            self.codecs.len()
        );
        loaded
    }

    /// Snapshot of `(name, state)` for every codec, in precedence order.
    pub fn load_states(&self) -> Vec<(&'static str, LoadState)> {
        self.codecs
            .iter()
            .map(|c| (c.name(), c.load_state()))
            .collect()
    }
}

impl FromIterator<CodecDescriptor> for CodecRegistry {
    fn from_iter<I: IntoIterator<Item = CodecDescriptor>>(iter: I) -> Self {
        CodecRegistry {
            codecs: iter.into_iter().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
