//! Detection and streaming decompression of single compressed files.
//!
//! - [`sniff`]      — signature-first codec detection ([`detect`])
//! - [`decompress`] — chunked, cancellable, progress-reporting copy from a
//!   decode stream into a destination file
//! - [`prefs`]      — runtime tunables shared with the worker pool and the
//!   session manager

pub mod decompress;
pub mod prefs;
pub mod sniff;

pub use decompress::{decompress_detected, decompress_file, decompress_to, DecompressStats};
pub use prefs::Prefs;
pub use sniff::{detect, Detected};
