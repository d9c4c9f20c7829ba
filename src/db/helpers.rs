use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};

/// Parses an RFC 3339 timestamp column, keeping its recorded offset.
pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value)
        .with_context(|| format!("failed to parse {field} {value:?}"))
}
