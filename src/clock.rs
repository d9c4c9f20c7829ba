//! Timestamp source for store writes.

use chrono::{DateTime, FixedOffset, Local};

/// Produces the offset-aware timestamps recorded alongside page opens and
/// watchlist memberships. Pluggable so tests can feed deterministic times.
pub trait Clock {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Local wall-clock time with the machine's current UTC offset.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}
