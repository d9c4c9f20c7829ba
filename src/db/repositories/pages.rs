use anyhow::{Context, Result};
use rusqlite::params;

use crate::db::connection::HistoryStore;

impl HistoryStore {
    /// Insert-if-absent. Page rows are created lazily whenever an open or
    /// a membership references them, and are never deleted.
    pub(crate) fn ensure_page(&self, name: &str) -> Result<()> {
        self.connection()
            .execute("INSERT OR IGNORE INTO page (name) VALUES (?1)", params![name])
            .with_context(|| format!("failed to insert page row for {name:?}"))?;
        Ok(())
    }

    /// Every page ever seen in a snapshot or opened, sorted by name.
    pub fn page_names(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .connection()
            .prepare("SELECT name FROM page ORDER BY name")
            .context("failed to prepare page listing")?;

        let mut rows = stmt.query([])?;
        let mut names = Vec::new();
        while let Some(row) = rows.next()? {
            names.push(row.get(0)?);
        }

        Ok(names)
    }
}
