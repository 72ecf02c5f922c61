//! E2E: re-syncing a displayed view when its compressed source changes.
//!
//! Source modification times are moved explicitly with `filetime` so the
//! tests do not depend on filesystem timestamp granularity.

#![cfg(feature = "gzip")]

#[path = "../tests/support/fixtures.rs"]
mod fixtures;
#[path = "../tests/support/mock_host.rs"]
mod mock_host;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use decompview::{
    ActivateOutcome, BufferId, CodecRegistry, LoadOutcome, Prefs, SessionManager,
};
use filetime::{set_file_mtime, FileTime};

use fixtures::{gzip, write};
use mock_host::{Messages, MockHost};

type Manager = SessionManager<MockHost, Box<dyn Fn(&str) + Send + Sync>>;

fn open_view(root: &Path, src: &Path, messages: &Messages) -> (Manager, BufferId) {
    let mut prefs = Prefs::default();
    prefs.set_temp_root(Some(root));
    let reporter: Box<dyn Fn(&str) + Send + Sync> = Box::new(messages.reporter());
    let mgr = SessionManager::new(
        Arc::new(CodecRegistry::with_defaults()),
        MockHost::new(),
        reporter,
        prefs,
    )
    .unwrap();
    let LoadOutcome::Opened(view) = mgr.on_load(mgr.host().user_opens(src)) else {
        panic!("{} should open", src.display());
    };
    (mgr, view)
}

/// Rewrites `src` and moves its mtime `secs` past the recorded sync time.
fn touch_later(src: &Path, bytes: &[u8], synced: FileTime, secs: i64) {
    fs::write(src, bytes).unwrap();
    let later = FileTime::from_unix_time(synced.unix_seconds() + secs, 0);
    set_file_mtime(src, later).unwrap();
}

// ═════════════════════════════════════════════════════════════════════════════
// Unchanged source
// ═════════════════════════════════════════════════════════════════════════════

#[test]
fn activation_without_change_is_a_no_op() {
    let files = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let src = write(files.path(), "log.gz", &gzip(b"v1"));
    let (mgr, view) = open_view(root.path(), &src, &Messages::default());

    assert_eq!(mgr.on_activated(view), ActivateOutcome::Unchanged);
    assert_eq!(mgr.on_activated(BufferId(404)), ActivateOutcome::NotTracked);
    assert_eq!(mgr.host().buffer(view).unwrap().reloads, 0);
}

#[test]
fn older_mtime_is_not_stale() {
    let files = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let src = write(files.path(), "log.gz", &gzip(b"v1"));
    let (mgr, view) = open_view(root.path(), &src, &Messages::default());

    let synced = mgr.session(view).unwrap().synced_mtime;
    touch_later(&src, &gzip(b"v0"), synced, -60);
    assert_eq!(mgr.on_activated(view), ActivateOutcome::Unchanged);
    assert_eq!(mgr.host().buffer(view).unwrap().content, b"v1");
}

// ═════════════════════════════════════════════════════════════════════════════
// Newer source
// ═════════════════════════════════════════════════════════════════════════════

#[test]
fn newer_source_is_decompressed_again() {
    let files = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let src = write(files.path(), "log.gz", &gzip(b"version one"));
    let messages = Messages::default();
    let (mgr, view) = open_view(root.path(), &src, &messages);

    let before = mgr.session(view).unwrap();
    touch_later(&src, &gzip(b"version two, longer"), before.synced_mtime, 10);

    assert_eq!(mgr.on_activated(view), ActivateOutcome::Resynced);
    let after = mgr.session(view).unwrap();
    assert_eq!(after.temp_file, before.temp_file, "same backing file");
    assert!(after.synced_mtime > before.synced_mtime);
    assert_eq!(fs::read(&after.temp_file).unwrap(), b"version two, longer");

    let buf = mgr.host().buffer(view).unwrap();
    assert_eq!(buf.content, b"version two, longer");
    assert_eq!(buf.reloads, 1);
    assert!(messages
        .all()
        .iter()
        .any(|m| m.starts_with("reloading compressed file:")));

    // Synced now; a second activation does nothing.
    assert_eq!(mgr.on_activated(view), ActivateOutcome::Unchanged);
    assert_eq!(mgr.host().buffer(view).unwrap().reloads, 1);
}

#[test]
fn failed_resync_keeps_previous_content() {
    let files = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let src = write(files.path(), "log.gz", &gzip(b"good"));
    let messages = Messages::default();
    let (mgr, view) = open_view(root.path(), &src, &messages);

    let before = mgr.session(view).unwrap();
    touch_later(&src, b"\x1F\x8B\x08\x00broken deflate stream", before.synced_mtime, 10);

    assert!(matches!(
        mgr.on_activated(view),
        ActivateOutcome::ResyncFailed(_)
    ));
    let after = mgr.session(view).unwrap();
    assert_eq!(after.synced_mtime, before.synced_mtime, "still stale");
    assert_eq!(mgr.host().buffer(view).unwrap().content, b"good");
    assert_eq!(mgr.host().buffer(view).unwrap().reloads, 0);
    assert!(messages
        .all()
        .iter()
        .any(|m| m.starts_with("cannot reload compressed file")));
}

#[test]
fn source_replaced_by_plain_text_fails_resync() {
    let files = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let src = write(files.path(), "log.gz", &gzip(b"good"));
    let (mgr, view) = open_view(root.path(), &src, &Messages::default());

    let synced = mgr.session(view).unwrap().synced_mtime;
    touch_later(&src, b"now plain text", synced, 10);
    assert!(matches!(
        mgr.on_activated(view),
        ActivateOutcome::ResyncFailed(_)
    ));
    assert!(mgr.session(view).is_some());
}

// ═════════════════════════════════════════════════════════════════════════════
// Missing source
// ═════════════════════════════════════════════════════════════════════════════

#[test]
fn deleted_source_leaves_view_alone() {
    let files = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let src = write(files.path(), "log.gz", &gzip(b"kept"));
    let (mgr, view) = open_view(root.path(), &src, &Messages::default());

    fs::remove_file(&src).unwrap();
    assert_eq!(mgr.on_activated(view), ActivateOutcome::SourceMissing);
    assert_eq!(mgr.host().buffer(view).unwrap().content, b"kept");
    assert!(mgr.session(view).unwrap().temp_file.exists());
}
