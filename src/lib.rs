//! Watch-list triage: scan a change-list fragment, decide which unseen
//! diffs to open, and record those decisions durably.
//!
//! Signing in, waiting for page elements, and driving a browser all live
//! outside this crate. The pipeline ends at an ordered list of
//! `(entry, url)` pairs for a browser-opening collaborator, plus the
//! history rows recording what was planned.

pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod pipeline;
pub mod rewrite;
pub mod scanner;

pub use clock::{Clock, SystemClock};
pub use config::PipelineConfig;
pub use db::{History, HistoryStore, OpenConflictPolicy};
pub use error::{PipelineError, RewriteError, ScanError};
pub use pipeline::{plan_opens, PlannedOpen, RunOutcome, RunReport};
pub use scanner::{scan_fragment, SeenState, WatchlistEntry};
