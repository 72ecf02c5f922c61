// Integration tests for the load / close lifecycle (session/manager.rs)
//
// Coverage:
//   - A gzip file is replaced by a read-only, renamed view of its content
//   - Non-compressed files are left alone and create no temp directory
//   - Closing a view removes its temp file and directory
//   - Decode failures keep the original buffer and the partial output
//   - Host failures after decoding clean up the temp directory
//   - Temp files are never themselves decompressed
//   - Status messages and shutdown

#![cfg(feature = "gzip")]

use std::fs;

use decompview::{BufferId, CloseOutcome, CodecRegistry, LoadOutcome, ViewHost};

use crate::fixtures::{entries, gzip, sample_text, write};
use crate::harness::{manager, manager_with};
use crate::mock_host::Messages;

fn opened(outcome: LoadOutcome) -> BufferId {
    match outcome {
        LoadOutcome::Opened(id) => id,
        other => panic!("expected Opened, got {other:?}"),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Opening
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn gzip_file_becomes_read_only_view() {
    let files = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let data = sample_text(20_000);
    let src = write(files.path(), "report.txt.gz", &gzip(&data));

    let mgr = manager(root.path());
    let origin = mgr.host().user_opens(&src);
    let view = opened(mgr.on_load(origin));

    let host = mgr.host();
    assert!(host.buffer(origin).is_none(), "compressed buffer closed");
    let buf = host.buffer(view).unwrap();
    assert!(buf.read_only);
    assert_eq!(buf.name, "report.txt");
    assert_eq!(buf.content, data);

    let session = mgr.session(view).unwrap();
    assert_eq!(session.codec, "gzip");
    assert_eq!(session.source, fs::canonicalize(&src).unwrap());
    assert_eq!(buf.path, session.temp_file);
    assert_eq!(entries(&session.temp_dir), vec![session.temp_file.clone()]);
    assert_eq!(entries(root.path()), vec![session.temp_dir.clone()]);
    assert_eq!(mgr.session_count(), 1);
    assert_eq!(mgr.pending_count(), 0);
}

#[test]
fn name_without_suffix_is_staged_then_renamed() {
    let files = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let src = write(files.path(), "blob", &gzip(b"inside"));

    let mgr = manager(root.path());
    let view = opened(mgr.on_load(mgr.host().user_opens(&src)));

    let session = mgr.session(view).unwrap();
    assert_eq!(session.temp_file.file_name().unwrap(), "blob");
    assert_eq!(entries(&session.temp_dir), vec![session.temp_file.clone()]);
    assert_eq!(mgr.host().buffer(view).unwrap().content, b"inside");
}

#[test]
fn plain_file_is_not_compressed() {
    let files = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let src = write(files.path(), "readme.txt", b"plain text");

    let mgr = manager(root.path());
    let id = mgr.host().user_opens(&src);
    assert_eq!(mgr.on_load(id), LoadOutcome::NotCompressed);
    assert!(mgr.host().buffer(id).is_some());
    assert!(entries(root.path()).is_empty());
}

#[test]
fn unknown_buffer_is_ignored() {
    let root = tempfile::tempdir().unwrap();
    let mgr = manager(root.path());
    assert_eq!(mgr.on_load(BufferId(99)), LoadOutcome::Ignored);
}

// ─────────────────────────────────────────────────────────────────────────────
// Closing
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn closing_view_removes_temp_file_and_dir() {
    let files = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let src = write(files.path(), "a.gz", &gzip(b"aaa"));

    let mgr = manager(root.path());
    let view = opened(mgr.on_load(mgr.host().user_opens(&src)));

    assert_eq!(mgr.on_close(view), CloseOutcome::CleanedUp);
    assert!(entries(root.path()).is_empty());
    assert_eq!(mgr.session_count(), 0);
    assert_eq!(mgr.on_close(view), CloseOutcome::NotTracked);
    assert!(src.exists(), "source is never touched");
}

#[test]
fn foreign_file_in_temp_dir_is_reported_not_fatal() {
    let files = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let src = write(files.path(), "a.gz", &gzip(b"aaa"));

    let mgr = manager(root.path());
    let view = opened(mgr.on_load(mgr.host().user_opens(&src)));
    let session = mgr.session(view).unwrap();
    fs::write(session.temp_dir.join("intruder"), b"x").unwrap();

    assert_eq!(mgr.on_close(view), CloseOutcome::CleanupIncomplete);
    assert!(!session.temp_file.exists());
    assert!(session.temp_dir.exists());
    assert_eq!(mgr.session_count(), 0);
}

#[test]
fn closing_untracked_buffer_does_nothing() {
    let root = tempfile::tempdir().unwrap();
    let mgr = manager(root.path());
    assert_eq!(mgr.on_close(BufferId(5)), CloseOutcome::NotTracked);
}

// ─────────────────────────────────────────────────────────────────────────────
// Failures
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn corrupt_file_keeps_original_and_partial_output() {
    let files = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let src = write(files.path(), "bad.gz", b"\x1F\x8B\x08\x00this is not deflate data");

    let messages = Messages::default();
    let mgr = manager_with(root.path(), CodecRegistry::with_defaults(), messages.reporter());
    let origin = mgr.host().user_opens(&src);

    assert!(matches!(mgr.on_load(origin), LoadOutcome::Failed(_)));
    assert_eq!(mgr.host().active(), Some(origin), "original stays open");
    assert_eq!(mgr.session_count(), 0);
    assert_eq!(mgr.pending_count(), 0);

    let dirs = entries(root.path());
    assert_eq!(dirs.len(), 1);
    assert_eq!(entries(&dirs[0]), vec![dirs[0].join("bad.gz")], "partial kept");

    let all = messages.all();
    assert!(
        all.iter().any(|m| m.starts_with("cannot open compressed file")),
        "{all:?}"
    );

    // The claim was released, so a retry runs again.
    assert!(matches!(mgr.on_load(origin), LoadOutcome::Failed(_)));
}

#[test]
fn host_open_failure_removes_temp_dir() {
    let files = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let src = write(files.path(), "a.gz", &gzip(b"aaa"));

    let mgr = manager(root.path());
    mgr.host().set_fail_open(true);
    let origin = mgr.host().user_opens(&src);

    assert!(matches!(mgr.on_load(origin), LoadOutcome::Failed(_)));
    assert!(entries(root.path()).is_empty());
    assert_eq!(mgr.session_count(), 0);
    assert_eq!(mgr.pending_count(), 0);
}

// ─────────────────────────────────────────────────────────────────────────────
// Temp files and reporting
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn temp_file_is_never_decompressed_again() {
    let files = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    // The decompressed content is itself gzip.
    let inner = gzip(b"nested");
    let src = write(files.path(), "double.gz.gz", &gzip(&inner));

    let mgr = manager(root.path());
    let view = opened(mgr.on_load(mgr.host().user_opens(&src)));
    assert_eq!(mgr.on_load(view), LoadOutcome::Ignored);

    let temp = mgr.session(view).unwrap().temp_file;
    let again = mgr.host().user_opens(&temp);
    assert_eq!(mgr.on_load(again), LoadOutcome::Ignored);
    assert_eq!(mgr.session_count(), 1);
}

#[test]
fn status_messages_announce_open_and_progress() {
    let files = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let src = write(files.path(), "big.gz", &gzip(&sample_text(300_000)));

    let messages = Messages::default();
    let mgr = manager_with(root.path(), CodecRegistry::with_defaults(), messages.reporter());
    opened(mgr.on_load(mgr.host().user_opens(&src)));

    let shown = fs::canonicalize(&src).unwrap().display().to_string();
    let all = messages.all();
    assert_eq!(all[0], format!("opening compressed file: {shown}"));
    let last = all.last().unwrap();
    assert!(last.ends_with("decompressed)"), "{last}");
    assert!(last.contains("KiB"), "{last}");
}

#[test]
fn shutdown_cleans_every_session() {
    let files = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let a = write(files.path(), "a.gz", &gzip(b"a"));
    let b = write(files.path(), "b.gz", &gzip(b"b"));

    let mgr = manager(root.path());
    let va = opened(mgr.on_load(mgr.host().user_opens(&a)));
    let vb = opened(mgr.on_load(mgr.host().user_opens(&b)));
    assert_eq!(entries(root.path()).len(), 2);

    mgr.shutdown();
    assert_eq!(mgr.session_count(), 0);
    assert!(entries(root.path()).is_empty());
    // Buffers stay open; they just lost their provenance.
    assert!(mgr.host().list_open_buffers().contains(&va));
    assert_eq!(mgr.on_close(vb), CloseOutcome::NotTracked);
}
