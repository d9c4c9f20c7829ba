use anyhow::{bail, Context, Result};
use rusqlite::{Connection, OptionalExtension};

const CURRENT_SCHEMA_VERSION: i32 = 1;

const CORE_TABLES: &[&str] = &["page", "page_open", "watchlist_page"];

/// Brings the backing schema up to date.
///
/// Runs on every open, not only the first: besides the version gate, the
/// core tables are probed directly, so a fresh file and a dropped table
/// both get the schema reapplied. The schema statements are idempotent.
pub fn ensure_schema(conn: &mut Connection) -> Result<()> {
    let version: i32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .context("failed to read user_version pragma")?;

    if version > CURRENT_SCHEMA_VERSION {
        bail!(
            "database version ({}) is newer than supported schema ({})",
            version,
            CURRENT_SCHEMA_VERSION
        );
    }

    if version == CURRENT_SCHEMA_VERSION && core_tables_present(conn)? {
        return Ok(());
    }

    let tx = conn
        .transaction()
        .context("failed to open schema transaction")?;
    tx.execute_batch(include_str!("schemas/schema_v1.sql"))
        .context("failed to execute schema_v1.sql")?;
    tx.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION)
        .context("failed to update user_version pragma")?;
    tx.commit().context("failed to commit schema")?;

    Ok(())
}

fn core_tables_present(conn: &Connection) -> Result<bool> {
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1")
        .context("failed to prepare table probe")?;
    for table in CORE_TABLES {
        let found: Option<String> = stmt
            .query_row([table], |row| row.get(0))
            .optional()
            .with_context(|| format!("failed to probe for table {table}"))?;
        if found.is_none() {
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_schema_to_a_fresh_database() {
        let mut conn = Connection::open_in_memory().unwrap();
        ensure_schema(&mut conn).unwrap();
        assert!(core_tables_present(&conn).unwrap());
    }

    #[test]
    fn is_idempotent_across_repeated_opens() {
        let mut conn = Connection::open_in_memory().unwrap();
        ensure_schema(&mut conn).unwrap();
        ensure_schema(&mut conn).unwrap();
        assert!(core_tables_present(&conn).unwrap());
    }

    #[test]
    fn recreates_a_dropped_table() {
        let mut conn = Connection::open_in_memory().unwrap();
        ensure_schema(&mut conn).unwrap();
        conn.execute_batch("DROP TABLE page_open").unwrap();
        assert!(!core_tables_present(&conn).unwrap());

        ensure_schema(&mut conn).unwrap();
        assert!(core_tables_present(&conn).unwrap());
    }

    #[test]
    fn refuses_a_newer_schema_version() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION + 1)
            .unwrap();
        assert!(ensure_schema(&mut conn).is_err());
    }
}
