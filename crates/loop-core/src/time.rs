//! Timestamp codec for persisted validity windows.
//!
//! The store compares timestamps as text, so every value is written as
//! fixed-width RFC 3339 UTC with microsecond precision
//! (`2024-01-01T09:00:00.000000Z`). Lexical order then equals chronological
//! order. Values are truncated to microseconds before use so that what a
//! caller passes in round-trips exactly through the database.
//!
//! The width is only fixed for years 0000 through 9999. Chrono renders other
//! years with a sign (`+10000-…`, `-0001-…`), which neither sorts nor parses
//! back, so callers must check [`is_storable`] before persisting.

use chrono::{DateTime, Datelike, SecondsFormat, SubsecRound, Utc};

/// First year the storage format can represent.
pub const MIN_STORABLE_YEAR: i32 = 0;

/// Last year the storage format can represent.
pub const MAX_STORABLE_YEAR: i32 = 9999;

/// Truncate a timestamp to the precision the store keeps.
#[must_use]
pub fn normalize(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.trunc_subsecs(6)
}

/// Whether `ts` renders in the fixed-width storage format.
#[must_use]
pub fn is_storable(ts: DateTime<Utc>) -> bool {
    (MIN_STORABLE_YEAR..=MAX_STORABLE_YEAR).contains(&ts.year())
}

/// Render a timestamp in the fixed-width storage format.
///
/// Only fixed-width for [`is_storable`] values.
#[must_use]
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    normalize(ts).to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp. Accepts any RFC 3339 offset and converts to UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc))
}

/// Current time at storage precision.
#[must_use]
pub fn now() -> DateTime<Utc> {
    normalize(Utc::now())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
