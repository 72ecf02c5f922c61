//! E2E: a full editing session against an in-memory host.
//!
//! Opens one file per supported format plus a plain file, checks what the
//! host ends up showing, then closes everything and checks that no temp
//! state is left behind.

#![cfg(all(feature = "gzip", feature = "bzip2", feature = "xz"))]

#[path = "../tests/support/fixtures.rs"]
mod fixtures;
#[path = "../tests/support/mock_host.rs"]
mod mock_host;

use std::sync::Arc;

use decompview::{
    CloseOutcome, CodecRegistry, LoadOutcome, NullReporter, Prefs, SessionManager, ViewHost,
};

use fixtures::{bzip2, entries, gzip, sample_text, write, xz};
use mock_host::MockHost;

// ═════════════════════════════════════════════════════════════════════════════
// Mixed formats
// ═════════════════════════════════════════════════════════════════════════════

#[test]
fn every_format_opens_and_cleans_up() {
    let files = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let text = sample_text(64 * 1024);

    let sources = [
        (write(files.path(), "server.log.gz", &gzip(&text)), "server.log"),
        (write(files.path(), "dump.sql.bz2", &bzip2(&text)), "dump.sql"),
        (write(files.path(), "trace.JSON.XZ", &xz(&text)), "trace.JSON"),
    ];
    let plain = write(files.path(), "notes.txt", b"not compressed");

    let mut prefs = Prefs::default();
    prefs.set_temp_root(Some(root.path()));
    let mgr = SessionManager::new(
        Arc::new(CodecRegistry::with_defaults()),
        MockHost::new(),
        NullReporter,
        prefs,
    )
    .unwrap();

    let mut views = Vec::new();
    for (src, expected_name) in &sources {
        let origin = mgr.host().user_opens(src);
        let LoadOutcome::Opened(view) = mgr.on_load(origin) else {
            panic!("{} should open", src.display());
        };
        let buf = mgr.host().buffer(view).unwrap();
        assert_eq!(&buf.name, expected_name);
        assert!(buf.read_only);
        assert_eq!(buf.content, text);
        views.push(view);
    }

    let plain_id = mgr.host().user_opens(&plain);
    assert_eq!(mgr.on_load(plain_id), LoadOutcome::NotCompressed);

    let mut open = mgr.host().list_open_buffers();
    open.sort();
    let mut expected = views.clone();
    expected.push(plain_id);
    assert_eq!(open, expected);
    assert_eq!(entries(root.path()).len(), 3);

    for view in views {
        assert_eq!(mgr.on_close(view), CloseOutcome::CleanedUp);
    }
    assert_eq!(mgr.on_close(plain_id), CloseOutcome::NotTracked);
    assert!(entries(root.path()).is_empty());
    for (src, _) in &sources {
        assert!(src.exists());
    }
}

// ═════════════════════════════════════════════════════════════════════════════
// Default temp location
// ═════════════════════════════════════════════════════════════════════════════

#[test]
fn default_temp_root_is_cleaned_on_close() {
    let files = tempfile::tempdir().unwrap();
    let src = write(files.path(), "a.gz", &gzip(b"system temp"));

    let mgr =
        SessionManager::with_host(Arc::new(CodecRegistry::with_defaults()), MockHost::new())
            .unwrap();
    let LoadOutcome::Opened(view) = mgr.on_load(mgr.host().user_opens(&src)) else {
        panic!("opens");
    };
    let session = mgr.session(view).unwrap();
    assert!(session.temp_dir.starts_with(std::env::temp_dir()));
    assert!(session.temp_file.exists());

    assert_eq!(mgr.on_close(view), CloseOutcome::CleanedUp);
    assert!(!session.temp_dir.exists());
}

// ═════════════════════════════════════════════════════════════════════════════
// Content decides, the name only labels
// ═════════════════════════════════════════════════════════════════════════════

#[test]
fn mislabelled_files_open_by_content() {
    let files = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let mut prefs = Prefs::default();
    prefs.set_temp_root(Some(root.path()));
    let mgr = SessionManager::new(
        Arc::new(CodecRegistry::with_defaults()),
        MockHost::new(),
        NullReporter,
        prefs,
    )
    .unwrap();

    let cases = [
        // gzip bytes behind an xz name keep their full name
        (write(files.path(), "odd.xz", &gzip(b"g")), "gzip", "odd.xz", &b"g"[..]),
        // xz bytes behind a text name
        (write(files.path(), "data.txt", &xz(b"x")), "xz", "data.txt", &b"x"[..]),
        // bzip2 bytes with no suffix at all
        (write(files.path(), "BLOB", &bzip2(b"b")), "bzip2", "BLOB", &b"b"[..]),
    ];

    for (src, codec, name, body) in cases {
        let LoadOutcome::Opened(view) = mgr.on_load(mgr.host().user_opens(&src)) else {
            panic!("{} should open", src.display());
        };
        let session = mgr.session(view).unwrap();
        assert_eq!(session.codec, codec);
        let buf = mgr.host().buffer(view).unwrap();
        assert_eq!(buf.name, name);
        assert_eq!(buf.content, body);
        assert_eq!(entries(&session.temp_dir), vec![session.temp_file.clone()]);
    }

    mgr.shutdown();
    assert!(entries(root.path()).is_empty());
}
