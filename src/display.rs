// display.rs — Notification level and the `displaylevel!` diagnostics macro.
//
// Diagnostics are written to stderr and gated on a process-wide level so the
// embedding editor can silence them (0) or turn on verbose tracing (4).
// Messages meant for the user go through `session::StatusReporter` instead.
//
// 0 = no output; 1 = errors only; 2 = warnings + results (default);
// 3 = progress / lifecycle; 4 = verbose

use std::sync::atomic::{AtomicU32, Ordering};

/// Process-wide notification level read by [`displaylevel!`].
pub static DISPLAY_LEVEL: AtomicU32 = AtomicU32::new(2);

/// Returns the current display level.
#[inline]
pub fn display_level() -> u32 {
    DISPLAY_LEVEL.load(Ordering::Relaxed)
}

/// Sets the display level.
#[inline]
pub fn set_display_level(level: u32) {
    DISPLAY_LEVEL.store(level, Ordering::Relaxed);
}

/// Print to stderr when the current display level is at least `$level`.
///
/// Output at level 4 and above is flushed immediately so verbose traces
/// interleave correctly with the host's own logging.
#[macro_export]
macro_rules! displaylevel {
    ($level:expr, $($arg:tt)*) => {
        if $crate::display::display_level() >= $level {
            eprint!($($arg)*);
            if $crate::display::display_level() >= 4 {
                use std::io::Write as _;
                let _ = std::io::stderr().flush();
            }
        }
    };
}
