// Integration tests for closing a buffer while its decompression is running
//
// Coverage:
//   - Closing the origin buffer cancels the job and removes its temp dir
//   - A close that lands after the last chunk still cancels
//   - shutdown cancels in-flight jobs
//   - Closing an unrelated buffer leaves a running job alone

use decompview::{BufferId, CloseOutcome, LoadOutcome, ViewHost};

use crate::fixtures::{entries, wait_until, write};
use crate::harness::slow_manager;

#[test]
fn closing_origin_cancels_decompression() {
    let files = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let src = write(files.path(), "big.slow", b"SLOW-anything");

    let mgr = slow_manager(root.path());
    let origin = mgr.host().user_opens(&src);

    std::thread::scope(|s| {
        let load = s.spawn(|| mgr.on_load(origin));
        assert!(wait_until(|| mgr.pending_count() == 1));

        assert_eq!(mgr.on_close(origin), CloseOutcome::CancelledDecompression);
        assert_eq!(load.join().unwrap(), LoadOutcome::Cancelled);
    });

    assert_eq!(mgr.pending_count(), 0);
    assert_eq!(mgr.session_count(), 0);
    assert!(entries(root.path()).is_empty());
    assert_eq!(mgr.host().active(), Some(origin), "no view was opened");
}

#[test]
fn shutdown_cancels_pending_jobs() {
    let files = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let src = write(files.path(), "big.slow", b"SLOW-anything");

    let mgr = slow_manager(root.path());
    let origin = mgr.host().user_opens(&src);

    std::thread::scope(|s| {
        let load = s.spawn(|| mgr.on_load(origin));
        assert!(wait_until(|| mgr.pending_count() == 1));
        mgr.shutdown();
        assert_eq!(load.join().unwrap(), LoadOutcome::Cancelled);
    });
    assert!(entries(root.path()).is_empty());
}

#[test]
fn closing_other_buffer_does_not_cancel() {
    let files = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let src = write(files.path(), "big.slow", b"SLOW-anything");

    let mgr = slow_manager(root.path());
    let origin = mgr.host().user_opens(&src);

    std::thread::scope(|s| {
        let load = s.spawn(|| mgr.on_load(origin));
        assert!(wait_until(|| mgr.pending_count() == 1));
        assert_eq!(mgr.on_close(BufferId(1000)), CloseOutcome::NotTracked);
        assert!(matches!(load.join().unwrap(), LoadOutcome::Opened(_)));
    });
    assert_eq!(entries(root.path()).len(), 1);
}

#[cfg(feature = "gzip")]
#[test]
fn close_after_last_chunk_still_cancels() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};

    use decompview::CodecRegistry;

    use crate::fixtures::gzip;
    use crate::harness::manager_with;

    let files = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let src = write(files.path(), "small.gz", &gzip(b"tiny payload"));
    let notes_path = write(files.path(), "notes.txt", b"notes");

    // A short job reports twice: after its first chunk and once at the end.
    // The loading thread parks inside the second report.
    let parked = Arc::new(Barrier::new(2));
    let resume = Arc::new(Barrier::new(2));
    let reporter = {
        let (parked, resume) = (Arc::clone(&parked), Arc::clone(&resume));
        let seen = AtomicUsize::new(0);
        move |m: &str| {
            if m.ends_with("decompressed)") && seen.fetch_add(1, Ordering::SeqCst) == 1 {
                parked.wait();
                resume.wait();
            }
        }
    };

    let mgr = manager_with(root.path(), CodecRegistry::with_defaults(), reporter);
    let notes = mgr.host().user_opens(&notes_path);
    let origin = mgr.host().user_opens(&src);

    std::thread::scope(|s| {
        let load = s.spawn(|| mgr.on_load(origin));
        parked.wait();

        mgr.host().forget(origin);
        assert_eq!(mgr.on_close(origin), CloseOutcome::CancelledDecompression);
        resume.wait();

        assert_eq!(load.join().unwrap(), LoadOutcome::Cancelled);
    });

    assert_eq!(mgr.host().list_open_buffers(), vec![notes]);
    assert_eq!(mgr.pending_count(), 0);
    assert_eq!(mgr.session_count(), 0);
    assert!(entries(root.path()).is_empty());
}
