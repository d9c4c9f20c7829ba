use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use log::{error, info, warn};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::db::migrations::ensure_schema;

/// How a duplicate `(name, opened_at)` page-open row is handled.
///
/// Two opens recorded in the same instant collide on the composite key.
/// The default is [`Ignore`](OpenConflictPolicy::Ignore): the duplicate
/// write keeps the existing row and the run continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenConflictPolicy {
    /// Surface the constraint violation as a write failure.
    Reject,
    /// Keep the existing row; the duplicate write is a no-op.
    #[default]
    Ignore,
    /// Replace the existing row.
    Overwrite,
}

impl OpenConflictPolicy {
    pub(crate) fn insert_sql(self) -> &'static str {
        match self {
            OpenConflictPolicy::Reject => {
                "INSERT INTO page_open (name, opened_at) VALUES (?1, ?2)"
            }
            OpenConflictPolicy::Ignore => {
                "INSERT OR IGNORE INTO page_open (name, opened_at) VALUES (?1, ?2)"
            }
            OpenConflictPolicy::Overwrite => {
                "INSERT OR REPLACE INTO page_open (name, opened_at) VALUES (?1, ?2)"
            }
        }
    }
}

/// Scoped handle on the history database. Opening prepares the schema;
/// dropping the handle releases the connection. One handle serves one
/// pipeline run.
pub struct HistoryStore {
    connection: Connection,
    open_conflicts: OpenConflictPolicy,
}

impl HistoryStore {
    pub fn open(path: &Path, open_conflicts: OpenConflictPolicy) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create database directory {}", parent.display())
                })?;
            }
        }

        let mut connection = Connection::open(path)
            .with_context(|| format!("failed to open history database {}", path.display()))?;
        Self::initialize(&mut connection)?;

        info!("History database ready at {}", path.display());

        Ok(Self {
            connection,
            open_conflicts,
        })
    }

    pub fn open_in_memory(open_conflicts: OpenConflictPolicy) -> Result<Self> {
        let mut connection =
            Connection::open_in_memory().context("failed to open in-memory history database")?;
        Self::initialize(&mut connection)?;
        Ok(Self {
            connection,
            open_conflicts,
        })
    }

    fn initialize(connection: &mut Connection) -> Result<()> {
        if let Err(err) = connection.pragma_update(None, "journal_mode", "WAL") {
            error!("Failed to enable WAL mode: {err}");
        }
        if let Err(err) = connection.pragma_update(None, "foreign_keys", "ON") {
            error!("Failed to enable foreign keys: {err}");
        }
        ensure_schema(connection).context("failed to prepare history schema")
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.connection
    }

    pub(crate) fn open_conflicts(&self) -> OpenConflictPolicy {
        self.open_conflicts
    }

    /// Releases the connection, surfacing any close-time error. Dropping
    /// the handle releases it too, discarding the error instead.
    pub fn close(self) -> Result<()> {
        self.connection
            .close()
            .map_err(|(_, err)| anyhow::Error::new(err).context("failed to close history database"))
    }
}

/// Write facade that degrades instead of failing.
///
/// When the store could not be opened, or a write fails, the operation is
/// logged and dropped; deciding what to open never hinges on history
/// tracking being available.
pub struct History {
    store: Option<HistoryStore>,
}

impl History {
    /// Opens the store at `path`, degrading to a no-op recorder when the
    /// store cannot be opened.
    pub fn open(path: &Path, open_conflicts: OpenConflictPolicy) -> Self {
        match HistoryStore::open(path, open_conflicts) {
            Ok(store) => Self { store: Some(store) },
            Err(err) => {
                warn!("History database unavailable, continuing without recording: {err:#}");
                Self { store: None }
            }
        }
    }

    pub fn from_store(store: HistoryStore) -> Self {
        Self { store: Some(store) }
    }

    pub fn unavailable() -> Self {
        Self { store: None }
    }

    pub fn is_available(&self) -> bool {
        self.store.is_some()
    }

    /// The underlying store, for read-side reporting.
    pub fn store(&self) -> Option<&HistoryStore> {
        self.store.as_ref()
    }

    pub fn record_page_open(&self, name: &str, opened_at: &DateTime<FixedOffset>) {
        let Some(store) = &self.store else {
            warn!("Tried to record a page open but the history database is unavailable.");
            return;
        };
        if let Err(err) = store.record_page_open(name, opened_at) {
            warn!("Failed to record open of {name:?}: {err:#}");
        }
    }

    pub fn record_watchlist_membership(&self, name: &str, last_seen_at: &DateTime<FixedOffset>) {
        let Some(store) = &self.store else {
            warn!("Tried to record watchlist membership but the history database is unavailable.");
            return;
        };
        if let Err(err) = store.record_watchlist_membership(name, last_seen_at) {
            warn!("Failed to record watchlist membership of {name:?}: {err:#}");
        }
    }
}
