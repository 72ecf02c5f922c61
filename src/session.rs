//! Decompressed-view sessions.
//!
//! - [`host`]    — what the embedding editor provides ([`ViewHost`],
//!   [`StatusReporter`])
//! - [`table`]   — provenance side-table keyed by [`BufferId`]
//! - [`manager`] — the load / activate / close event handlers

pub mod host;
pub mod manager;
pub mod table;

pub use host::{BufferId, NullReporter, StatusReporter, ViewHost};
pub use manager::{decompressed_name, ActivateOutcome, CloseOutcome, LoadOutcome, SessionManager};
pub use table::{Claim, DecompressionSession, SessionTable};
