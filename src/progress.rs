// progress.rs — Rate limiting and formatting for decompression progress.
//
// `std::time::Instant` is monotonic, so a gate built on it never fires early
// after a wall-clock adjustment.

use std::time::{Duration, Instant};

/// Opens at most once per `interval`.
///
/// The first call to [`ready`](Self::ready) always opens, so a short job still
/// produces one update.
#[derive(Clone, Copy, Debug)]
pub struct RefreshGate {
    interval: Duration,
    last: Option<Instant>,
}

impl RefreshGate {
    pub fn new(interval: Duration) -> Self {
        RefreshGate {
            interval,
            last: None,
        }
    }

    /// Returns `true` and re-arms when at least `interval` has elapsed since
    /// the last time it returned `true`.
    pub fn ready(&mut self) -> bool {
        self.ready_at(Instant::now())
    }

    pub(crate) fn ready_at(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

/// Renders a byte count for status messages: `"512 B"`, `"3.4 KiB"`,
/// `"12.0 MiB"`, `"1.2 GiB"`.
pub fn format_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    let b = bytes as f64;
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if b < KIB * KIB {
        format!("{:.1} KiB", b / KIB)
    } else if b < KIB * KIB * KIB {
        format!("{:.1} MiB", b / (KIB * KIB))
    } else {
        format!("{:.1} GiB", b / (KIB * KIB * KIB))
    }
}

/// Status line shown while `source` is being decompressed.
pub fn progress_message(source: &str, bytes: u64) -> String {
    format!(
        "opening compressed file: {} ({} decompressed)",
        source,
        format_bytes(bytes)
    )
}
