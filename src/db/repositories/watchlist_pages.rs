use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use rusqlite::{params, Row};

use crate::db::connection::HistoryStore;
use crate::db::helpers::parse_datetime;
use crate::db::models::WatchlistPage;

fn row_to_watchlist_page(row: &Row) -> Result<WatchlistPage> {
    let last_seen_at: String = row.get("last_seen_at")?;
    Ok(WatchlistPage {
        name: row.get("name")?,
        last_seen_at: parse_datetime(&last_seen_at, "last_seen_at")?,
    })
}

impl HistoryStore {
    /// Marks a page as currently on the watch list. Re-recording an
    /// already-present page moves its timestamp forward instead of adding
    /// a duplicate row.
    pub fn record_watchlist_membership(
        &self,
        name: &str,
        last_seen_at: &DateTime<FixedOffset>,
    ) -> Result<()> {
        self.ensure_page(name)?;
        self.connection()
            .execute(
                "INSERT INTO watchlist_page (name, last_seen_at)
                 VALUES (?1, ?2)
                 ON CONFLICT(name) DO UPDATE SET
                     last_seen_at = excluded.last_seen_at",
                params![name, last_seen_at.to_rfc3339()],
            )
            .with_context(|| format!("failed to record watchlist membership of {name:?}"))?;
        Ok(())
    }

    pub fn watchlist_membership(&self, name: &str) -> Result<Option<WatchlistPage>> {
        let mut stmt = self
            .connection()
            .prepare(
                "SELECT name, last_seen_at FROM watchlist_page
                 WHERE name = ?1",
            )
            .context("failed to prepare membership lookup")?;

        let mut rows = stmt.query(params![name])?;
        match rows.next()? {
            Some(row) => Ok(Some(row_to_watchlist_page(row)?)),
            None => Ok(None),
        }
    }

    /// Every page currently on the watch list, sorted by name.
    pub fn watchlist_pages(&self) -> Result<Vec<WatchlistPage>> {
        let mut stmt = self
            .connection()
            .prepare(
                "SELECT name, last_seen_at FROM watchlist_page
                 ORDER BY name",
            )
            .context("failed to prepare watchlist listing")?;

        let mut rows = stmt.query([])?;
        let mut pages = Vec::new();
        while let Some(row) = rows.next()? {
            pages.push(row_to_watchlist_page(row)?);
        }

        Ok(pages)
    }
}
