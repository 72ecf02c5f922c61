// Integration tests for one-session-per-source handling (session/manager.rs,
// session/table.rs)
//
// Coverage:
//   - Re-opening a displayed source focuses the existing view
//   - A view the host dropped without a close event is replaced
//   - Re-opening a source that is still decompressing closes the duplicate
//   - Different sources get independent sessions

use std::fs;

use decompview::{LoadOutcome, ViewHost};

use crate::fixtures::{entries, wait_until, write, SLOW_MAGIC, SLOW_TOTAL};
use crate::harness::slow_manager;

#[cfg(feature = "gzip")]
mod displayed {
    use super::*;
    use crate::fixtures::gzip;
    use crate::harness::manager;

    #[test]
    fn reopening_focuses_existing_view() {
        let files = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        let src = write(files.path(), "a.gz", &gzip(b"once"));

        let mgr = manager(root.path());
        let LoadOutcome::Opened(view) = mgr.on_load(mgr.host().user_opens(&src)) else {
            panic!("first load opens");
        };

        let dup = mgr.host().user_opens(&src);
        assert_eq!(mgr.on_load(dup), LoadOutcome::Focused(view));
        assert!(mgr.host().buffer(dup).is_none(), "duplicate closed");
        assert_eq!(mgr.host().active(), Some(view));
        assert_eq!(mgr.host().focused().last(), Some(&view));
        assert_eq!(entries(root.path()).len(), 1);
    }

    #[test]
    fn vanished_view_is_replaced() {
        let files = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        let src = write(files.path(), "a.gz", &gzip(b"once"));

        let mgr = manager(root.path());
        let LoadOutcome::Opened(old) = mgr.on_load(mgr.host().user_opens(&src)) else {
            panic!("first load opens");
        };
        let old_dir = mgr.session(old).unwrap().temp_dir;
        mgr.host().forget(old);

        let LoadOutcome::Opened(new) = mgr.on_load(mgr.host().user_opens(&src)) else {
            panic!("stale session should be discarded");
        };
        assert_ne!(new, old);
        assert!(mgr.session(old).is_none());
        assert!(!old_dir.exists());
        assert_eq!(entries(root.path()).len(), 1);
    }

    #[test]
    fn distinct_sources_are_independent() {
        let files = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        let a = write(files.path(), "a.gz", &gzip(b"a"));
        let b = write(files.path(), "b.gz", &gzip(b"b"));

        let mgr = manager(root.path());
        assert!(matches!(mgr.on_load(mgr.host().user_opens(&a)), LoadOutcome::Opened(_)));
        assert!(matches!(mgr.on_load(mgr.host().user_opens(&b)), LoadOutcome::Opened(_)));
        assert_eq!(mgr.session_count(), 2);
    }
}

#[test]
fn reopening_while_decompressing_closes_duplicate() {
    let files = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let src = write(files.path(), "big.slow", b"SLOW-anything");
    assert!(fs::read(&src).unwrap().starts_with(SLOW_MAGIC));

    let mgr = slow_manager(root.path());
    let origin = mgr.host().user_opens(&src);

    std::thread::scope(|s| {
        let first = s.spawn(|| mgr.on_load(origin));
        assert!(wait_until(|| mgr.pending_count() == 1));

        let dup = mgr.host().user_opens(&src);
        assert_eq!(mgr.on_load(dup), LoadOutcome::AlreadyDecompressing);
        assert!(mgr.host().buffer(dup).is_none());

        let LoadOutcome::Opened(view) = first.join().unwrap() else {
            panic!("original load completes");
        };
        assert!(mgr.host().buffer(origin).is_none());
        assert_eq!(mgr.host().buffer(view).unwrap().content.len(), SLOW_TOTAL);
        assert_eq!(mgr.host().list_open_buffers(), vec![view]);
    });
}
