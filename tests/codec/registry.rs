// Integration tests for the codec table (codec/registry.rs)
//
// Coverage:
//   - Default order and descriptors (gzip, bzip2, xz)
//   - Header lookup: precedence, strictly-longer rule, unavailable skip
//   - Extension lookup only consults headerless codecs
//   - max_header_len

use std::io;
use std::path::Path;

use decompview::codec::{default_codecs, DecodeOpen, DecodeStream, GZIP_MAGIC, XZ_MAGIC};
use decompview::{CodecDescriptor, CodecRegistry};

fn open_nothing(_path: &Path) -> io::Result<DecodeStream> {
    Ok(Box::new(io::empty()))
}

fn resolve_present() -> Option<DecodeOpen> {
    Some(open_nothing)
}

fn resolve_absent() -> Option<DecodeOpen> {
    None
}

// ─────────────────────────────────────────────────────────────────────────────
// Defaults
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn defaults_are_in_precedence_order() {
    let names: Vec<_> = default_codecs().iter().map(|c| c.name()).collect();
    assert_eq!(names, ["gzip", "bzip2", "xz"]);

    let reg = CodecRegistry::with_defaults();
    assert_eq!(reg.len(), 3);
    assert_eq!(reg.get("xz").unwrap().extension(), ".xz");
    assert_eq!(reg.get("bzip2").unwrap().magic(), Some(&b"BZ"[..]));
    assert_eq!(reg.max_header_len(), XZ_MAGIC.len());
}

#[test]
fn empty_registry_matches_nothing() {
    let reg = CodecRegistry::new();
    assert!(reg.is_empty());
    assert_eq!(reg.max_header_len(), 0);
    assert!(reg.lookup_by_header(b"\x1F\x8B\x08\x00").is_none());
    assert!(reg.lookup_by_extension(Path::new("a.gz")).is_none());
}

// ─────────────────────────────────────────────────────────────────────────────
// Header lookup
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn header_requires_more_bytes_than_the_magic() {
    let mut reg = CodecRegistry::new();
    reg.register(CodecDescriptor::with_magic("g", ".gz", &GZIP_MAGIC, resolve_present));
    assert!(reg.lookup_by_header(&GZIP_MAGIC).is_none());
    assert_eq!(reg.lookup_by_header(b"\x1F\x8B\x08").unwrap().name(), "g");
}

#[test]
fn first_registered_match_wins() {
    let reg: CodecRegistry = vec![
        CodecDescriptor::with_magic("first", ".one", b"AB", resolve_present),
        CodecDescriptor::with_magic("second", ".two", b"ABC", resolve_present),
    ]
    .into_iter()
    .collect();
    assert_eq!(reg.lookup_by_header(b"ABCD").unwrap().name(), "first");
}

#[test]
fn unavailable_header_match_falls_through() {
    let reg: CodecRegistry = vec![
        CodecDescriptor::with_magic("missing", ".m", b"AB", resolve_absent),
        CodecDescriptor::with_magic("backup", ".b", b"ABC", resolve_present),
    ]
    .into_iter()
    .collect();
    assert_eq!(reg.lookup_by_header(b"ABCD").unwrap().name(), "backup");
}

// ─────────────────────────────────────────────────────────────────────────────
// Extension lookup
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn extension_lookup_skips_codecs_with_magic() {
    let reg: CodecRegistry = vec![
        CodecDescriptor::with_magic("g", ".gz", &GZIP_MAGIC, resolve_present),
        CodecDescriptor::extension_only("raw", ".raw", resolve_present),
    ]
    .into_iter()
    .collect();
    assert!(reg.lookup_by_extension(Path::new("a.gz")).is_none());
    assert_eq!(reg.lookup_by_extension(Path::new("a.RAW")).unwrap().name(), "raw");
    assert!(reg.lookup_by_extension(Path::new(".raw")).is_none());
}

#[test]
fn unavailable_extension_codec_is_skipped() {
    let reg: CodecRegistry = vec![
        CodecDescriptor::extension_only("gone", ".raw", resolve_absent),
        CodecDescriptor::extension_only("here", ".raw", resolve_present),
    ]
    .into_iter()
    .collect();
    assert_eq!(reg.lookup_by_extension(Path::new("x.raw")).unwrap().name(), "here");
}
