use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use rusqlite::{params, Row};

use crate::db::connection::HistoryStore;
use crate::db::helpers::parse_datetime;
use crate::db::models::PageOpen;

fn row_to_page_open(row: &Row) -> Result<PageOpen> {
    let opened_at: String = row.get("opened_at")?;
    Ok(PageOpen {
        name: row.get("name")?,
        opened_at: parse_datetime(&opened_at, "opened_at")?,
    })
}

impl HistoryStore {
    /// Records one decision to open a page's diff. The page row is created
    /// if missing; a colliding `(name, opened_at)` pair is handled per the
    /// store's open-conflict policy.
    pub fn record_page_open(
        &self,
        name: &str,
        opened_at: &DateTime<FixedOffset>,
    ) -> Result<()> {
        self.ensure_page(name)?;
        self.connection()
            .execute(
                self.open_conflicts().insert_sql(),
                params![name, opened_at.to_rfc3339()],
            )
            .with_context(|| format!("failed to record open of {name:?}"))?;
        Ok(())
    }

    pub fn page_open_count(&self, name: &str) -> Result<u64> {
        let count: i64 = self
            .connection()
            .query_row(
                "SELECT COUNT(*) FROM page_open WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .with_context(|| format!("failed to count opens of {name:?}"))?;
        Ok(count as u64)
    }

    /// Most recent opens, newest first.
    pub fn recent_opens(&self, limit: usize) -> Result<Vec<PageOpen>> {
        let mut stmt = self
            .connection()
            .prepare(
                "SELECT name, opened_at FROM page_open
                 ORDER BY opened_at DESC
                 LIMIT ?1",
            )
            .context("failed to prepare open listing")?;

        let mut rows = stmt.query(params![limit as i64])?;
        let mut opens = Vec::new();
        while let Some(row) = rows.next()? {
            opens.push(row_to_page_open(row)?);
        }

        Ok(opens)
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;
    use chrono::FixedOffset;

    use crate::db::connection::{HistoryStore, OpenConflictPolicy};

    fn ts(value: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(value).unwrap()
    }

    #[test]
    fn records_an_open_and_its_page_row() {
        let store = HistoryStore::open_in_memory(OpenConflictPolicy::default()).unwrap();
        store
            .record_page_open("Earth", &ts("2026-08-04T10:00:00+02:00"))
            .unwrap();

        assert_eq!(store.page_open_count("Earth").unwrap(), 1);
        assert_eq!(store.page_names().unwrap(), vec!["Earth"]);
    }

    #[test]
    fn opens_at_distinct_times_accumulate() {
        let store = HistoryStore::open_in_memory(OpenConflictPolicy::default()).unwrap();
        store
            .record_page_open("Earth", &ts("2026-08-04T10:00:00+02:00"))
            .unwrap();
        store
            .record_page_open("Earth", &ts("2026-08-04T11:00:00+02:00"))
            .unwrap();

        assert_eq!(store.page_open_count("Earth").unwrap(), 2);
    }

    #[test]
    fn ignore_policy_keeps_the_first_colliding_row() {
        let store = HistoryStore::open_in_memory(OpenConflictPolicy::Ignore).unwrap();
        let at = ts("2026-08-04T10:00:00+02:00");
        store.record_page_open("Earth", &at).unwrap();
        store.record_page_open("Earth", &at).unwrap();

        assert_eq!(store.page_open_count("Earth").unwrap(), 1);
    }

    #[test]
    fn reject_policy_surfaces_the_collision() {
        let store = HistoryStore::open_in_memory(OpenConflictPolicy::Reject).unwrap();
        let at = ts("2026-08-04T10:00:00+02:00");
        store.record_page_open("Earth", &at).unwrap();

        assert!(store.record_page_open("Earth", &at).is_err());
        assert_eq!(store.page_open_count("Earth").unwrap(), 1);
    }

    #[test]
    fn overwrite_policy_accepts_the_collision() {
        let store = HistoryStore::open_in_memory(OpenConflictPolicy::Overwrite).unwrap();
        let at = ts("2026-08-04T10:00:00+02:00");
        store.record_page_open("Earth", &at).unwrap();
        store.record_page_open("Earth", &at).unwrap();

        assert_eq!(store.page_open_count("Earth").unwrap(), 1);
    }

    #[test]
    fn recent_opens_come_newest_first() {
        let store = HistoryStore::open_in_memory(OpenConflictPolicy::default()).unwrap();
        store
            .record_page_open("Earth", &ts("2026-08-04T10:00:00+02:00"))
            .unwrap();
        store
            .record_page_open("Mars", &ts("2026-08-04T11:00:00+02:00"))
            .unwrap();

        let opens = store.recent_opens(10).unwrap();
        let names: Vec<&str> = opens.iter().map(|open| open.name.as_str()).collect();
        assert_eq!(names, vec!["Mars", "Earth"]);
    }
}
