//! Background decompression workers.
//!
//! A fixed-size `rayon::ThreadPool` runs decompression jobs so the event
//! callback that started one can return to the host promptly. In-flight jobs
//! are bounded by a `crossbeam_channel::bounded` token channel: `submit`
//! takes a token (blocking when all `nb_threads + queue_size` are out) and
//! the job returns it when it ends.
//!
//! Each job reports over its own channel: zero or more
//! [`JobEvent::Progress`] updates (already rate-limited by the copy loop)
//! followed by exactly one [`JobEvent::Finished`]. [`JobHandle::wait`]
//! blocks on that channel, so no one polls or sleeps.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use rayon::ThreadPool as RayonPool;

use crate::codec::CodecRegistry;
use crate::displaylevel;
use crate::error::{DecompressError, SessionError};
use crate::io::decompress::{decompress_to, DecompressStats};
use crate::io::prefs::Prefs;

/// Outcome carried by [`JobEvent::Finished`].
pub type JobResult = Result<Option<DecompressStats>, DecompressError>;

/// Message from a running job to its waiter.
#[derive(Debug)]
pub enum JobEvent {
    /// Bytes decompressed so far.
    Progress(u64),
    /// The job ended; no further events follow.
    Finished(JobResult),
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Shared stop request for one job. Cloning shares the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks the job to stop at its next chunk boundary.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn flag(&self) -> &AtomicBool {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// JobHandle
// ---------------------------------------------------------------------------

/// Waiter side of a submitted job.
pub struct JobHandle {
    events: Receiver<JobEvent>,
}

impl JobHandle {
    /// Blocks until the job finishes, calling `on_progress` for every
    /// progress update received on the way.
    ///
    /// # Errors
    ///
    /// `SessionError::Decompress` when the job failed or was cancelled,
    /// `SessionError::Worker` when the job died without reporting.
    pub fn wait(
        self,
        mut on_progress: impl FnMut(u64),
    ) -> Result<Option<DecompressStats>, SessionError> {
        loop {
            match self.events.recv() {
                Ok(JobEvent::Progress(bytes)) => on_progress(bytes),
                Ok(JobEvent::Finished(result)) => return result.map_err(SessionError::from),
                Err(_) => return Err(SessionError::Worker),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Pool bookkeeping
// ---------------------------------------------------------------------------

struct PoolState {
    pending: usize, // submitted but not yet finished
}

type SharedState = Arc<(Mutex<PoolState>, Condvar)>;

/// Returns the job's token and decrements `pending`, also when the job
/// unwinds, so `jobs_completed` and `Drop` never wait on a dead job.
struct SlotGuard {
    state: SharedState,
    slot_tx: Sender<()>,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        let (lock, cvar) = &*self.state;
        let mut s = lock.lock().unwrap_or_else(PoisonError::into_inner);
        s.pending -= 1;
        if s.pending == 0 {
            cvar.notify_all();
        }
        let _ = self.slot_tx.send(());
    }
}

// ---------------------------------------------------------------------------
// DecompressPool
// ---------------------------------------------------------------------------

/// Fixed-size pool that runs [`decompress_to`] off the caller's thread.
pub struct DecompressPool {
    pool: RayonPool,
    slot_tx: Sender<()>,
    slot_rx: Receiver<()>,
    state: SharedState,
}

impl DecompressPool {
    /// Returns `None` if either size is zero or the threads cannot be spawned.
    pub fn new(nb_threads: usize, queue_size: usize) -> Option<Self> {
        if nb_threads < 1 || queue_size < 1 {
            return None;
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(nb_threads)
            .thread_name(|i| format!("decompview-worker-{i}"))
            .panic_handler(|_| {
                displaylevel!(1, "decompression worker panicked\n");
            })
            .build()
            .ok()?;

        // Pre-fill with one token per slot; `recv` then means "wait for a
        // free slot".
        let capacity = queue_size + nb_threads;
        let (slot_tx, slot_rx) = bounded(capacity);
        for _ in 0..capacity {
            slot_tx.send(()).ok()?;
        }

        Some(DecompressPool {
            pool,
            slot_tx,
            slot_rx,
            state: Arc::new((Mutex::new(PoolState { pending: 0 }), Condvar::new())),
        })
    }

    /// Pool sized from `prefs.nb_workers` / `prefs.queue_size`.
    pub fn from_prefs(prefs: &Prefs) -> Option<Self> {
        Self::new(prefs.nb_workers, prefs.queue_size)
    }

    /// Starts decompressing `src` into `dst`. May block while every slot is
    /// taken.
    pub fn submit(
        &self,
        registry: Arc<CodecRegistry>,
        src: PathBuf,
        dst: PathBuf,
        prefs: Prefs,
    ) -> JobHandle {
        self.submit_with_token(registry, src, dst, prefs, CancelToken::new())
    }

    /// Like [`submit`](Self::submit) with a caller-supplied token, so the
    /// token can be published before the job starts.
    pub fn submit_with_token(
        &self,
        registry: Arc<CodecRegistry>,
        src: PathBuf,
        dst: PathBuf,
        prefs: Prefs,
        cancel: CancelToken,
    ) -> JobHandle {
        // We hold a sender ourselves, so the channel cannot be disconnected.
        let _ = self.slot_rx.recv();
        {
            let (lock, _cvar) = &*self.state;
            let mut s = lock.lock().unwrap_or_else(PoisonError::into_inner);
            s.pending += 1;
        }

        let (tx, rx) = unbounded();
        let guard = SlotGuard {
            state: Arc::clone(&self.state),
            slot_tx: self.slot_tx.clone(),
        };

        self.pool.spawn(move || {
            let _guard = guard;
            let progress_tx = tx.clone();
            let result = decompress_to(
                &registry,
                &src,
                &dst,
                &prefs,
                cancel.flag(),
                &mut |bytes| {
                    let _ = progress_tx.send(JobEvent::Progress(bytes));
                },
            );
            // The waiter may have gone away; nothing to do then.
            let _ = tx.send(JobEvent::Finished(result));
        });

        JobHandle { events: rx }
    }

    /// Blocks until every submitted job has finished. The pool stays usable.
    pub fn jobs_completed(&self) {
        let (lock, cvar) = &*self.state;
        let mut s = lock.lock().unwrap_or_else(PoisonError::into_inner);
        while s.pending > 0 {
            s = cvar.wait(s).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Jobs submitted and not yet finished.
    pub fn pending(&self) -> usize {
        let (lock, _cvar) = &*self.state;
        lock.lock().unwrap_or_else(PoisonError::into_inner).pending
    }
}

impl Drop for DecompressPool {
    /// Waits for in-flight jobs; rayon joins its threads afterwards.
    fn drop(&mut self) {
        self.jobs_completed();
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
