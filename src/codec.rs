//! Codec registry and loader.
//!
//! - [`descriptor`] — one format's name, suffix, magic header and write-once
//!   decode binding ([`CodecDescriptor::ensure_loaded`])
//! - [`registry`] — the ordered table and its header / extension lookups
//! - [`builtin`] — the default gzip, bzip2 and xz descriptors

pub mod builtin;
pub mod descriptor;
pub mod registry;

pub use builtin::{default_codecs, BZIP2_MAGIC, GZIP_MAGIC, XZ_MAGIC};
pub use descriptor::{CodecDescriptor, DecodeOpen, DecodeStream, LoadState, Resolver};
pub use registry::CodecRegistry;
