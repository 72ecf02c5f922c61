//! The default codec table.
//!
//! | format | suffix | magic header        |
//! |--------|--------|---------------------|
//! | gzip   | `.gz`  | `1F 8B`             |
//! | bzip2  | `.bz2` | `42 5A` ("BZ")      |
//! | xz     | `.xz`  | `FD 37 7A 58 5A 00` |
//!
//! Each decoder library sits behind a Cargo feature of the same name. With
//! the feature off, the resolver returns `None` and the loader marks the
//! codec unavailable, so those files display as-is.
//!
//! All three decoders accept concatenated members/streams, matching what
//! `gzip -d`, `bunzip2` and `xz -d` produce for multi-part files.

#[cfg(any(feature = "gzip", feature = "bzip2", feature = "xz"))]
use std::{fs::File, io, io::BufReader, path::Path};

#[cfg(any(feature = "gzip", feature = "bzip2", feature = "xz"))]
use super::descriptor::DecodeStream;
use super::descriptor::{CodecDescriptor, DecodeOpen};

pub const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];
pub const BZIP2_MAGIC: [u8; 2] = [0x42, 0x5A];
pub const XZ_MAGIC: [u8; 6] = [0xFD, 0x37, 0x7A, 0x58, 0x5A, 0x00];

/// Builds fresh descriptors for the default codecs, in precedence order.
pub fn default_codecs() -> Vec<CodecDescriptor> {
    vec![
        CodecDescriptor::with_magic("gzip", ".gz", &GZIP_MAGIC, resolve_gzip),
        CodecDescriptor::with_magic("bzip2", ".bz2", &BZIP2_MAGIC, resolve_bzip2),
        CodecDescriptor::with_magic("xz", ".xz", &XZ_MAGIC, resolve_xz),
    ]
}

// ── gzip ─────────────────────────────────────────────────────────────────────

fn resolve_gzip() -> Option<DecodeOpen> {
    #[cfg(feature = "gzip")]
    {
        Some(open_gzip)
    }
    #[cfg(not(feature = "gzip"))]
    {
        None
    }
}

#[cfg(feature = "gzip")]
fn open_gzip(path: &Path) -> io::Result<DecodeStream> {
    let file = File::open(path)?;
    Ok(Box::new(flate2::read::MultiGzDecoder::new(BufReader::new(
        file,
    ))))
}

// ── bzip2 ────────────────────────────────────────────────────────────────────

fn resolve_bzip2() -> Option<DecodeOpen> {
    #[cfg(feature = "bzip2")]
    {
        Some(open_bzip2)
    }
    #[cfg(not(feature = "bzip2"))]
    {
        None
    }
}

#[cfg(feature = "bzip2")]
fn open_bzip2(path: &Path) -> io::Result<DecodeStream> {
    let file = File::open(path)?;
    Ok(Box::new(bzip2::read::MultiBzDecoder::new(BufReader::new(
        file,
    ))))
}

// ── xz ───────────────────────────────────────────────────────────────────────

fn resolve_xz() -> Option<DecodeOpen> {
    #[cfg(feature = "xz")]
    {
        Some(open_xz)
    }
    #[cfg(not(feature = "xz"))]
    {
        None
    }
}

#[cfg(feature = "xz")]
fn open_xz(path: &Path) -> io::Result<DecodeStream> {
    let file = File::open(path)?;
    Ok(Box::new(xz2::read::XzDecoder::new_multi_decoder(
        BufReader::new(file),
    )))
}
