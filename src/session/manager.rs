//! End-to-end lifecycle of decompressed views.
//!
//! The host forwards three events per buffer: [`SessionManager::on_load`]
//! when a file becomes visible, [`SessionManager::on_activated`] when a
//! buffer regains focus, and [`SessionManager::on_close`]. Per tracked
//! source the states are:
//!
//! ```text
//! Unopened ──load, codec found──▶ Decompressing ──ok──▶ Displayed ──close──▶ Closed
//!    ▲                                 │                  │    ▲
//!    └──────no match / failure─────────┘        activate, │    │ ok or failure
//!                                             source newer▼    │
//!                                                  Decompressing (resync)
//! ```
//!
//! # Design notes
//!
//! - **One session per source**: the source path (canonicalised) is claimed
//!   in the table before any temp directory is made. A second load of the
//!   same source closes the duplicate compressed buffer and either focuses
//!   the displayed one or leaves the in-flight decompression to finish.
//!
//! - **Original buffer**: closed only after decoding succeeded. The host
//!   focuses it first, since the user may have switched buffers while the
//!   job ran; if it is already gone nothing is closed. On failure the
//!   compressed bytes stay on screen and the partial output is kept in its
//!   temp directory for diagnosis.
//!
//! - **Close during decompression**: closing the origin buffer raises the
//!   job's cancel flag. The worker stops at the next chunk, the loading
//!   call removes the temp file and directory, and no buffer is opened.
//!   The flag is checked once more under the table lock after the job
//!   finished, so a close that lands after the last chunk also wins.
//!
//! - **Host re-entrancy**: no lock is held across host calls, and loads of
//!   a path that is a live or pending temp file are ignored, so a host that
//!   fires its own load event inside `open_buffer` is safe.
//!
//! - **Re-sync**: decodes into a staging file beside the live one and
//!   renames it over the live file on success. A failed re-sync leaves the
//!   view on its previous content and the session still stale.
//!
//! - **Errors**: handlers never return `Err` and never panic on I/O
//!   failure. Problems are logged; decode/write failures during an open or
//!   re-sync are also shown through the status reporter.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::host::{BufferId, NullReporter, StatusReporter, ViewHost};
use super::table::{Claim, DecompressionSession, SessionTable};
use crate::codec::CodecRegistry;
use crate::config::{FALLBACK_FILE_NAME, PARTIAL_SUFFIX};
use crate::displaylevel;
use crate::error::{DecompressError, SessionError};
use crate::io::prefs::Prefs;
use crate::io::sniff::{detect, Detected};
use crate::progress::progress_message;
use crate::util::{create_session_dir, modified_time, modified_time_if_exists, remove_session_artifacts};
use crate::worker::{CancelToken, DecompressPool};

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// What [`SessionManager::on_load`] did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No codec applies; the host displays the file normally.
    NotCompressed,
    /// The buffer is itself a decompressed view (or has no backing file).
    Ignored,
    /// A new read-only buffer shows the decompressed content.
    Opened(BufferId),
    /// The source was already displayed; that buffer was focused instead.
    Focused(BufferId),
    /// Another load of the same source is still decompressing.
    AlreadyDecompressing,
    /// The origin buffer was closed before decompression finished.
    Cancelled,
    /// Decompression or display failed; the original buffer stays open.
    Failed(String),
}

/// What [`SessionManager::on_activated`] did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActivateOutcome {
    /// The buffer is not a decompressed view.
    NotTracked,
    /// The source has not changed since the last sync.
    Unchanged,
    /// The source is gone; the buffer keeps its content.
    SourceMissing,
    /// The source was newer and has been decompressed again.
    Resynced,
    /// Re-sync failed; the buffer keeps its previous content.
    ResyncFailed(String),
}

/// What [`SessionManager::on_close`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloseOutcome {
    /// The buffer carried no decompression provenance.
    NotTracked,
    /// Temp file and temp directory are gone.
    CleanedUp,
    /// Something could not be removed; it was logged.
    CleanupIncomplete,
    /// The buffer was the origin of a running decompression, now cancelled.
    CancelledDecompression,
}

// ---------------------------------------------------------------------------
// Naming helpers
// ---------------------------------------------------------------------------

/// File name for the decompressed view of `source`: its base name with
/// `suffix` removed (ASCII case-insensitive). Names without the suffix are
/// kept whole; a name that is only the suffix becomes `decompressed`.
///
/// The name is built from the raw file name, so bytes that are not valid
/// UTF-8 survive unchanged on Unix.
pub fn decompressed_name(source: &Path, suffix: &str) -> OsString {
    let base = source.file_name().unwrap_or_default();
    let stem = strip_suffix_ignore_case(base, suffix);
    if stem.is_empty() {
        OsString::from(FALLBACK_FILE_NAME)
    } else {
        stem.to_os_string()
    }
}

#[cfg(unix)]
fn strip_suffix_ignore_case<'a>(name: &'a OsStr, suffix: &str) -> &'a OsStr {
    use std::os::unix::ffi::OsStrExt;

    let (b, s) = (name.as_bytes(), suffix.as_bytes());
    if !s.is_empty() && b.len() >= s.len() && b[b.len() - s.len()..].eq_ignore_ascii_case(s) {
        OsStr::from_bytes(&b[..b.len() - s.len()])
    } else {
        name
    }
}

// Names that are not valid Unicode keep their suffix here.
#[cfg(not(unix))]
fn strip_suffix_ignore_case<'a>(name: &'a OsStr, suffix: &str) -> &'a OsStr {
    let Some(n) = name.to_str() else {
        return name;
    };
    let cut = n.len().wrapping_sub(suffix.len());
    if !suffix.is_empty()
        && n.len() >= suffix.len()
        && n.is_char_boundary(cut)
        && n[cut..].eq_ignore_ascii_case(suffix)
    {
        OsStr::new(&n[..cut])
    } else {
        name
    }
}

/// Where decoding writes before the rename: the source's own base name, or
/// `<final>.part` when that would already be the final name.
fn staging_path(temp_dir: &Path, source: &Path, final_name: &OsStr) -> PathBuf {
    let base = source.file_name().unwrap_or_default();
    if base.is_empty() || base == final_name {
        let mut partial = final_name.to_os_string();
        partial.push(PARTIAL_SUFFIX);
        temp_dir.join(partial)
    } else {
        temp_dir.join(base)
    }
}

fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

// ---------------------------------------------------------------------------
// SessionManager
// ---------------------------------------------------------------------------

/// Drives detection, background decompression, provenance tracking,
/// staleness checks and cleanup for one editor host.
pub struct SessionManager<H: ViewHost, R: StatusReporter = NullReporter> {
    registry: Arc<CodecRegistry>,
    host: H,
    reporter: R,
    prefs: Prefs,
    pool: DecompressPool,
    table: Mutex<SessionTable>,
}

impl<H: ViewHost> SessionManager<H, NullReporter> {
    /// Manager with default preferences and no status reporting.
    pub fn with_host(registry: Arc<CodecRegistry>, host: H) -> Result<Self, SessionError> {
        Self::new(registry, host, NullReporter, Prefs::default())
    }
}

impl<H: ViewHost, R: StatusReporter> SessionManager<H, R> {
    /// # Errors
    ///
    /// `SessionError::WorkerPool` if the background workers cannot start.
    pub fn new(
        registry: Arc<CodecRegistry>,
        host: H,
        reporter: R,
        prefs: Prefs,
    ) -> Result<Self, SessionError> {
        let pool = DecompressPool::from_prefs(&prefs)
            .ok_or(SessionError::WorkerPool(prefs.nb_workers))?;
        Ok(SessionManager {
            registry,
            host,
            reporter,
            prefs,
            pool,
            table: Mutex::new(SessionTable::new()),
        })
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn registry(&self) -> &CodecRegistry {
        &self.registry
    }

    pub fn prefs(&self) -> &Prefs {
        &self.prefs
    }

    /// Snapshot of the session behind `buffer`.
    pub fn session(&self, buffer: BufferId) -> Option<DecompressionSession> {
        self.lock().session(buffer).cloned()
    }

    /// Number of displayed decompressed buffers.
    pub fn session_count(&self) -> usize {
        self.lock().len()
    }

    /// Number of decompressions in flight.
    pub fn pending_count(&self) -> usize {
        self.lock().pending_count()
    }

    fn lock(&self) -> MutexGuard<'_, SessionTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -----------------------------------------------------------------------
    // load
    // -----------------------------------------------------------------------

    /// Handles "file became visible" for `buffer`.
    pub fn on_load(&self, buffer: BufferId) -> LoadOutcome {
        let Some(path) = self.host.buffer_path(buffer) else {
            return LoadOutcome::Ignored;
        };
        {
            let table = self.lock();
            if table.session(buffer).is_some() || table.is_temp_path(&path) {
                return LoadOutcome::Ignored;
            }
        }

        let Some(detected) = detect(&self.registry, &path) else {
            return LoadOutcome::NotCompressed;
        };
        let source = canonical(&path);
        let cancel = CancelToken::new();

        match self.claim(&source, buffer, &cancel) {
            Claim::Won => {}
            Claim::Displayed(existing) => {
                displaylevel!(3, "{} is already open; focusing {}\n", source.display(), existing);
                self.close_duplicate(buffer);
                self.host.focus(existing);
                return LoadOutcome::Focused(existing);
            }
            Claim::Pending => {
                displaylevel!(3, "{} is already being decompressed\n", source.display());
                self.close_duplicate(buffer);
                return LoadOutcome::AlreadyDecompressing;
            }
        }

        let result = self.open_session(&source, &detected, buffer, cancel);
        match result {
            Ok(Some(id)) => LoadOutcome::Opened(id),
            Ok(None) => {
                self.lock().release(&source);
                LoadOutcome::NotCompressed
            }
            Err(e) if e.is_cancelled() => {
                self.lock().release(&source);
                displaylevel!(3, "decompression of {} cancelled\n", source.display());
                LoadOutcome::Cancelled
            }
            Err(e) => {
                self.lock().release(&source);
                let msg = format!("cannot open compressed file {}: {}", source.display(), e);
                displaylevel!(1, "{}\n", msg);
                self.reporter.report_transient_message(&msg);
                LoadOutcome::Failed(e.to_string())
            }
        }
    }

    /// Claims `source`, first discarding a displayed session whose buffer
    /// the host no longer lists.
    fn claim(&self, source: &Path, origin: BufferId, cancel: &CancelToken) -> Claim {
        let claim = self.lock().claim(source, origin, cancel.clone());
        let Claim::Displayed(existing) = claim else {
            return claim;
        };
        if self.host.list_open_buffers().contains(&existing) {
            return claim;
        }

        displaylevel!(3, "{} vanished without a close event; dropping its session\n", existing);
        self.on_close(existing);
        self.lock().claim(source, origin, cancel.clone())
    }

    fn close_duplicate(&self, buffer: BufferId) {
        if let Err(e) = self.host.close_active_buffer() {
            displaylevel!(2, "warning: cannot close duplicate {}: {:#}\n", buffer, e);
        }
    }

    /// Decompressing → Displayed. `Ok(None)` when the codec turned out to be
    /// unusable.
    fn open_session(
        &self,
        source: &Path,
        detected: &Detected,
        origin: BufferId,
        cancel: CancelToken,
    ) -> Result<Option<BufferId>, SessionError> {
        let synced_mtime = modified_time(source).map_err(|e| SessionError::Stat {
            path: source.to_path_buf(),
            source: e,
        })?;
        let temp_dir =
            create_session_dir(self.prefs.temp_root.as_deref()).map_err(SessionError::TempDir)?;
        let final_name = decompressed_name(source, detected.suffix);
        let temp_file = temp_dir.join(&final_name);
        let staging = staging_path(&temp_dir, source, &final_name);
        self.lock().set_target(source, temp_file.clone());

        let shown = source.display().to_string();
        self.reporter
            .report_transient_message(&format!("opening compressed file: {shown}"));
        displaylevel!(3, "decompressing {} ({}) into {}\n", shown, detected.name, temp_file.display());

        let handle = self.pool.submit_with_token(
            Arc::clone(&self.registry),
            source.to_path_buf(),
            staging.clone(),
            self.prefs.clone(),
            cancel,
        );
        let waited = handle.wait(|bytes| {
            self.reporter
                .report_transient_message(&progress_message(&shown, bytes))
        });

        let stats = match waited {
            Ok(Some(stats)) => stats,
            Ok(None) => {
                remove_session_artifacts(&staging, &temp_dir);
                return Ok(None);
            }
            Err(e) if e.is_cancelled() => {
                remove_session_artifacts(&staging, &temp_dir);
                return Err(e);
            }
            // Partial output stays for diagnosis.
            Err(e) => return Err(e),
        };

        // Past this point our own close of the origin must not cancel
        // anything; a cancel that arrived after the last chunk still counts.
        if !self.lock().detach_origin(source) {
            remove_session_artifacts(&staging, &temp_dir);
            return Err(DecompressError::Cancelled.into());
        }

        if staging != temp_file {
            fs::rename(&staging, &temp_file).map_err(|e| SessionError::Rename {
                from: staging.clone(),
                to: temp_file.clone(),
                source: e,
            })?;
        }

        match self.display(origin, &temp_file, &final_name) {
            Ok(id) => {
                self.lock().promote(
                    id,
                    DecompressionSession {
                        source: source.to_path_buf(),
                        temp_dir,
                        temp_file,
                        codec: stats.codec,
                        synced_mtime,
                    },
                );
                displaylevel!(
                    3,
                    "{}: {} bytes decompressed, shown as {}\n",
                    shown,
                    stats.decompressed_bytes,
                    id
                );
                Ok(Some(id))
            }
            Err(e) => {
                remove_session_artifacts(&temp_file, &temp_dir);
                Err(e)
            }
        }
    }

    /// Swaps the compressed buffer `origin` for a read-only view of
    /// `temp_file`.
    fn display(
        &self,
        origin: BufferId,
        temp_file: &Path,
        name: &OsStr,
    ) -> Result<BufferId, SessionError> {
        if self.host.list_open_buffers().contains(&origin) {
            // The host only closes the active buffer.
            self.host.focus(origin);
            self.host.close_active_buffer()?;
        } else {
            displaylevel!(3, "{} is already closed\n", origin);
        }
        let id = self.host.open_buffer(temp_file)?;
        self.host.set_read_only(id, true);
        self.host.set_name(id, &name.to_string_lossy());
        Ok(id)
    }

    // -----------------------------------------------------------------------
    // activate
    // -----------------------------------------------------------------------

    /// Handles "buffer reactivated": re-decompresses when the source changed
    /// since the last sync.
    pub fn on_activated(&self, buffer: BufferId) -> ActivateOutcome {
        let Some(session) = self.session(buffer) else {
            return ActivateOutcome::NotTracked;
        };

        let current = match modified_time_if_exists(&session.source) {
            Ok(Some(t)) => t,
            Ok(None) => return ActivateOutcome::SourceMissing,
            Err(e) => {
                displaylevel!(2, "warning: cannot stat {}: {}\n", session.source.display(), e);
                return ActivateOutcome::Unchanged;
            }
        };
        if current <= session.synced_mtime {
            return ActivateOutcome::Unchanged;
        }

        let shown = session.source.display().to_string();
        displaylevel!(3, "{} changed on disk; re-syncing {}\n", shown, buffer);
        self.reporter
            .report_transient_message(&format!("reloading compressed file: {shown}"));

        // The live file is only ever replaced by a complete decode.
        let final_name = session.temp_file.file_name().unwrap_or_default();
        let staging = staging_path(&session.temp_dir, &session.source, final_name);
        let handle = self.pool.submit(
            Arc::clone(&self.registry),
            session.source.clone(),
            staging.clone(),
            self.prefs.clone(),
        );
        let waited = handle
            .wait(|bytes| {
                self.reporter
                    .report_transient_message(&progress_message(&shown, bytes))
            })
            .and_then(|stats| match stats {
                Some(stats) => fs::rename(&staging, &session.temp_file)
                    .map(|()| Some(stats))
                    .map_err(|e| SessionError::Rename {
                        from: staging.clone(),
                        to: session.temp_file.clone(),
                        source: e,
                    }),
                None => Ok(None),
            });

        match waited {
            Ok(Some(_)) => {
                self.lock().mark_synced(buffer, current);
                if let Err(e) = self.host.reload_buffer(buffer) {
                    displaylevel!(2, "warning: cannot reload {}: {:#}\n", buffer, e);
                }
                ActivateOutcome::Resynced
            }
            Ok(None) => {
                let msg = format!("{shown} is no longer a readable compressed file");
                displaylevel!(2, "warning: {}\n", msg);
                self.reporter.report_transient_message(&msg);
                ActivateOutcome::ResyncFailed(msg)
            }
            Err(e) => {
                // Only the live file may remain in the session directory.
                if let Err(rm) = fs::remove_file(&staging) {
                    displaylevel!(4, "cannot remove {}: {}\n", staging.display(), rm);
                }
                let msg = format!("cannot reload compressed file {shown}: {e}");
                displaylevel!(1, "{}\n", msg);
                self.reporter.report_transient_message(&msg);
                ActivateOutcome::ResyncFailed(e.to_string())
            }
        }
    }

    // -----------------------------------------------------------------------
    // close
    // -----------------------------------------------------------------------

    /// Handles "buffer closed": removes the temp file and its directory, or
    /// cancels the decompression `buffer` started.
    pub fn on_close(&self, buffer: BufferId) -> CloseOutcome {
        let session = {
            let mut table = self.lock();
            match table.remove_session(buffer) {
                Some(s) => s,
                None if table.cancel_for_origin(buffer) => {
                    displaylevel!(3, "{} closed while decompressing; cancelling\n", buffer);
                    return CloseOutcome::CancelledDecompression;
                }
                None => return CloseOutcome::NotTracked,
            }
        };

        displaylevel!(4, "closing {}: removing {}\n", buffer, session.temp_file.display());
        if remove_session_artifacts(&session.temp_file, &session.temp_dir).is_complete() {
            CloseOutcome::CleanedUp
        } else {
            CloseOutcome::CleanupIncomplete
        }
    }

    /// Cancels every running decompression and cleans up every session.
    /// Buffers stay open in the host; they simply lose their provenance.
    pub fn shutdown(&self) {
        let drained = self.lock().drain();
        for (buffer, session) in drained {
            displaylevel!(4, "shutdown: cleaning {}\n", buffer);
            remove_session_artifacts(&session.temp_file, &session.temp_dir);
        }
        self.pool.jobs_completed();
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
