//! Provenance side-table: which displayed buffer came from which compressed
//! source, and which sources are being decompressed right now.
//!
//! The table is plain data; `SessionManager` keeps it behind a mutex and
//! never calls into the host while holding it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use filetime::FileTime;

use super::host::BufferId;
use crate::worker::CancelToken;

/// Live association between a decompressed buffer and its source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecompressionSession {
    /// Compressed file the buffer was produced from.
    pub source: PathBuf,
    /// Directory owned exclusively by this session.
    pub temp_dir: PathBuf,
    /// The single file inside `temp_dir`; backs the displayed buffer.
    pub temp_file: PathBuf,
    /// Codec that decoded `source`.
    pub codec: &'static str,
    /// Source modification time sampled before the last successful sync.
    pub synced_mtime: FileTime,
}

#[derive(Debug)]
enum SourceState {
    Decompressing {
        /// Buffer showing the compressed bytes; closing it cancels the job.
        /// Cleared once the manager itself is about to close it.
        origin: Option<BufferId>,
        cancel: CancelToken,
        /// Final temp path, known once the temp directory exists.
        target: Option<PathBuf>,
    },
    Displayed(BufferId),
}

/// Result of trying to start a decompression for a source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Claim {
    /// The caller now owns the decompression of this source.
    Won,
    /// Another buffer already displays this source.
    Displayed(BufferId),
    /// Another decompression of this source is in flight.
    Pending,
}

#[derive(Debug, Default)]
pub struct SessionTable {
    sessions: HashMap<BufferId, DecompressionSession>,
    sources: HashMap<PathBuf, SourceState>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn session(&self, buffer: BufferId) -> Option<&DecompressionSession> {
        self.sessions.get(&buffer)
    }

    /// Buffer currently displaying `source`, if any.
    pub fn displayed_buffer(&self, source: &Path) -> Option<BufferId> {
        match self.sources.get(source) {
            Some(SourceState::Displayed(id)) => Some(*id),
            _ => None,
        }
    }

    /// Number of sources with a decompression in flight.
    pub fn pending_count(&self) -> usize {
        self.sources
            .values()
            .filter(|s| matches!(s, SourceState::Decompressing { .. }))
            .count()
    }

    /// Atomically reserves `source` for a new decompression started from
    /// `origin`, unless it is already displayed or being decompressed.
    pub fn claim(&mut self, source: &Path, origin: BufferId, cancel: CancelToken) -> Claim {
        match self.sources.get(source) {
            Some(SourceState::Displayed(id)) => Claim::Displayed(*id),
            Some(SourceState::Decompressing { .. }) => Claim::Pending,
            None => {
                self.sources.insert(
                    source.to_path_buf(),
                    SourceState::Decompressing {
                        origin: Some(origin),
                        cancel,
                        target: None,
                    },
                );
                Claim::Won
            }
        }
    }

    /// Records where a pending decompression will land.
    pub fn set_target(&mut self, source: &Path, target: PathBuf) {
        if let Some(SourceState::Decompressing { target: t, .. }) = self.sources.get_mut(source) {
            *t = Some(target);
        }
    }

    /// Stops a pending entry from reacting to its origin buffer closing.
    ///
    /// Returns `false` and leaves the entry alone when its job has already
    /// been cancelled (or nothing is pending for `source`).
    pub fn detach_origin(&mut self, source: &Path) -> bool {
        match self.sources.get_mut(source) {
            Some(SourceState::Decompressing { cancel, .. }) if cancel.is_cancelled() => false,
            Some(SourceState::Decompressing { origin, .. }) => {
                *origin = None;
                true
            }
            _ => false,
        }
    }

    /// Drops a pending claim (abort path). A displayed entry is left alone.
    pub fn release(&mut self, source: &Path) {
        if matches!(self.sources.get(source), Some(SourceState::Decompressing { .. })) {
            self.sources.remove(source);
        }
    }

    /// Turns the pending claim on `session.source` into a displayed session.
    pub fn promote(&mut self, buffer: BufferId, session: DecompressionSession) {
        self.sources
            .insert(session.source.clone(), SourceState::Displayed(buffer));
        self.sessions.insert(buffer, session);
    }

    /// True when `path` backs a live session or is the target of a pending one.
    pub fn is_temp_path(&self, path: &Path) -> bool {
        self.sessions.values().any(|s| s.temp_file == path)
            || self.sources.values().any(|s| {
                matches!(s, SourceState::Decompressing { target: Some(t), .. } if t == path)
            })
    }

    /// Raises the cancel flag of the pending decompression started from
    /// `origin`. Returns whether one was found.
    pub fn cancel_for_origin(&mut self, origin: BufferId) -> bool {
        let mut found = false;
        for state in self.sources.values() {
            if let SourceState::Decompressing {
                origin: Some(o),
                cancel,
                ..
            } = state
            {
                if *o == origin {
                    cancel.cancel();
                    found = true;
                }
            }
        }
        found
    }

    /// Records a successful re-sync.
    pub fn mark_synced(&mut self, buffer: BufferId, mtime: FileTime) {
        if let Some(s) = self.sessions.get_mut(&buffer) {
            s.synced_mtime = mtime;
        }
    }

    /// Forgets the session of `buffer` and its source mapping.
    pub fn remove_session(&mut self, buffer: BufferId) -> Option<DecompressionSession> {
        let session = self.sessions.remove(&buffer)?;
        if self.displayed_buffer(&session.source) == Some(buffer) {
            self.sources.remove(&session.source);
        }
        Some(session)
    }

    /// Cancels every pending job and hands back every live session.
    pub fn drain(&mut self) -> Vec<(BufferId, DecompressionSession)> {
        for state in self.sources.values() {
            if let SourceState::Decompressing { cancel, .. } = state {
                cancel.cancel();
            }
        }
        self.sources
            .retain(|_, s| matches!(s, SourceState::Decompressing { .. }));
        self.sessions.drain().collect()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
