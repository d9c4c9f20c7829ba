//! Row types of the history store.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// One recorded decision to open a page's diff. Append-only; the composite
/// key is `(name, opened_at)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageOpen {
    pub name: String,
    pub opened_at: DateTime<FixedOffset>,
}

/// Current watch-list membership of a page, as of the last snapshot that
/// included it. Unique on `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchlistPage {
    pub name: String,
    pub last_seen_at: DateTime<FixedOffset>,
}
