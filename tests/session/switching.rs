// Integration tests for buffers the user opens while a decompression runs
// (session/manager.rs)
//
// Coverage:
//   - The origin is closed even after another buffer became active
//   - An origin the host already dropped is not replaced by closing another

use decompview::{LoadOutcome, ViewHost};

use crate::fixtures::{entries, wait_until, write, SLOW_TOTAL};
use crate::harness::slow_manager;

#[test]
fn origin_closed_after_user_switched_buffers() {
    let files = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let src = write(files.path(), "big.slow", b"SLOW-anything");
    let notes_path = write(files.path(), "notes.txt", b"plain notes");

    let mgr = slow_manager(root.path());
    let origin = mgr.host().user_opens(&src);

    std::thread::scope(|s| {
        let load = s.spawn(|| mgr.on_load(origin));
        assert!(wait_until(|| mgr.pending_count() == 1));

        let notes = mgr.host().user_opens(&notes_path);
        assert_eq!(mgr.host().active(), Some(notes));

        let LoadOutcome::Opened(view) = load.join().unwrap() else {
            panic!("load completes");
        };
        assert!(mgr.host().buffer(origin).is_none(), "origin closed");
        assert_eq!(mgr.host().buffer(notes).unwrap().content, b"plain notes");
        assert_eq!(mgr.host().list_open_buffers(), vec![notes, view]);
        assert_eq!(mgr.host().buffer(view).unwrap().content.len(), SLOW_TOTAL);
    });
    assert_eq!(entries(root.path()).len(), 1);
}

#[test]
fn dropped_origin_leaves_other_buffers_open() {
    let files = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let src = write(files.path(), "big.slow", b"SLOW-anything");
    let notes_path = write(files.path(), "notes.txt", b"plain notes");

    let mgr = slow_manager(root.path());
    let origin = mgr.host().user_opens(&src);

    std::thread::scope(|s| {
        let load = s.spawn(|| mgr.on_load(origin));
        assert!(wait_until(|| mgr.pending_count() == 1));

        // No close event reaches the manager, so the job runs on.
        mgr.host().forget(origin);
        let notes = mgr.host().user_opens(&notes_path);

        let LoadOutcome::Opened(view) = load.join().unwrap() else {
            panic!("load completes");
        };
        assert_eq!(mgr.host().list_open_buffers(), vec![notes, view]);
        assert!(mgr.host().focused().is_empty());
    });
}
