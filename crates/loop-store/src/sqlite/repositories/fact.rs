//! Row-level access to the `context_facts` table.
//!
//! Stateless: every method takes a `&Connection`, so the store decides the
//! transaction boundary. Identity matching uses `IS` for the nullable
//! columns so that two absent values compare equal.

use chrono::{DateTime, Utc};
use loop_core::time::{format_timestamp, parse_timestamp};
use loop_core::{ContextFact, FactIdentity};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, params};

use crate::errors::Result;
use crate::record::{ContextFactRecord, RecordId};

const COLUMNS: &str = "id, category, detail, time_range, location, confidence,
                       source_capture_id, valid_from, valid_to";

const IDENTITY_CLAUSE: &str = "category = ?1 AND detail = ?2
                               AND time_range IS ?3 AND location IS ?4";

/// Stateless repository over `context_facts`.
pub struct FactRepo;

impl FactRepo {
    /// The open version of an identity, if any.
    ///
    /// If several are open (only possible with rows written outside the
    /// store) the most recently started one is returned.
    pub fn find_open(conn: &Connection, identity: &FactIdentity) -> Result<Option<ContextFactRecord>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM context_facts
             WHERE valid_to IS NULL AND {IDENTITY_CLAUSE}
             ORDER BY valid_from DESC, id DESC LIMIT 1"
        );
        let row = conn
            .query_row(
                &sql,
                params![
                    identity.category.as_str(),
                    identity.detail,
                    identity.time_range,
                    identity.location,
                ],
                Self::map_row,
            )
            .optional()?;
        Ok(row)
    }

    /// Close every open version of an identity at `at`. Returns rows changed.
    pub fn close_open(conn: &Connection, identity: &FactIdentity, at: DateTime<Utc>) -> Result<usize> {
        let sql = format!(
            "UPDATE context_facts SET valid_to = ?5
             WHERE valid_to IS NULL AND {IDENTITY_CLAUSE}"
        );
        let changed = conn.execute(
            &sql,
            params![
                identity.category.as_str(),
                identity.detail,
                identity.time_range,
                identity.location,
                format_timestamp(at),
            ],
        )?;
        Ok(changed)
    }

    /// Insert a new open version starting at `valid_from`.
    pub fn insert(conn: &Connection, fact: &ContextFact, valid_from: DateTime<Utc>) -> Result<RecordId> {
        let _ = conn.execute(
            "INSERT INTO context_facts (
                 category, detail, time_range, location, confidence,
                 source_capture_id, valid_from, valid_to
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, NULL)",
            params![
                fact.category.as_str(),
                fact.detail,
                fact.time_range,
                fact.location,
                fact.confidence,
                fact.source_capture_id.as_str(),
                format_timestamp(valid_from),
            ],
        )?;
        Ok(RecordId(conn.last_insert_rowid()))
    }

    /// Every version whose window contains `at`, most recently started first.
    pub fn active_at(conn: &Connection, at: DateTime<Utc>) -> Result<Vec<ContextFactRecord>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM context_facts
             WHERE valid_from <= ?1 AND (valid_to IS NULL OR valid_to > ?1)
             ORDER BY valid_from DESC, id DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![format_timestamp(at)], Self::map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Get a record by ID.
    pub fn get_by_id(conn: &Connection, id: RecordId) -> Result<Option<ContextFactRecord>> {
        let sql = format!("SELECT {COLUMNS} FROM context_facts WHERE id = ?1");
        let row = conn.query_row(&sql, params![id.0], Self::map_row).optional()?;
        Ok(row)
    }

    /// All versions of an identity, oldest first.
    pub fn history(conn: &Connection, identity: &FactIdentity) -> Result<Vec<ContextFactRecord>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM context_facts
             WHERE {IDENTITY_CLAUSE}
             ORDER BY valid_from ASC, id ASC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(
                params![
                    identity.category.as_str(),
                    identity.detail,
                    identity.time_range,
                    identity.location,
                ],
                Self::map_row,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// All versions sourced from a capture, oldest first.
    pub fn by_capture(conn: &Connection, capture_id: &str) -> Result<Vec<ContextFactRecord>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM context_facts
             WHERE source_capture_id = ?1
             ORDER BY valid_from ASC, id ASC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![capture_id], Self::map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Total number of stored versions.
    pub fn count(conn: &Connection) -> Result<u64> {
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM context_facts", [], |row| row.get(0))?;
        Ok(u64::try_from(n).unwrap_or(0))
    }

    /// Map a rusqlite row to `ContextFactRecord`.
    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ContextFactRecord> {
        let category: String = row.get(1)?;
        let source_capture_id: String = row.get(6)?;
        Ok(ContextFactRecord {
            id: RecordId(row.get(0)?),
            category: category.into(),
            detail: row.get(2)?,
            time_range: row.get(3)?,
            location: row.get(4)?,
            confidence: row.get(5)?,
            source_capture_id: source_capture_id.into(),
            valid_from: timestamp_column(row, 7)?,
            valid_to: row
                .get::<_, Option<String>>(8)?
                .map(|raw| parse_column(8, &raw))
                .transpose()?,
        })
    }
}

fn timestamp_column(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_column(idx, &raw)
}

fn parse_column(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    parse_timestamp(raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;
    use crate::sqlite::migrations::run_migrations;
    use chrono::{Duration, TimeZone};

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn t(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, h, 0, 0).unwrap()
    }

    fn fact(location: Option<&str>) -> ContextFact {
        let mut f = ContextFact::new("schedule", "Works Friday", "cap-a").with_confidence(0.8);
        f.location = location.map(str::to_string);
        f
    }

    #[test]
    fn insert_and_get_by_id() {
        let conn = setup();
        let id = FactRepo::insert(&conn, &fact(Some("HQ")), t(9)).unwrap();
        let rec = FactRepo::get_by_id(&conn, id).unwrap().unwrap();
        assert_eq!(rec.id, id);
        assert_eq!(rec.detail, "Works Friday");
        assert_eq!(rec.location.as_deref(), Some("HQ"));
        assert_eq!(rec.valid_from, t(9));
        assert!(rec.valid_to.is_none());
    }

    #[test]
    fn get_by_id_missing() {
        let conn = setup();
        assert!(FactRepo::get_by_id(&conn, RecordId(99)).unwrap().is_none());
    }

    #[test]
    fn find_open_matches_null_columns() {
        let conn = setup();
        FactRepo::insert(&conn, &fact(None), t(9)).unwrap();
        let found = FactRepo::find_open(&conn, &fact(None).identity()).unwrap();
        assert!(found.is_some());
        let other = FactRepo::find_open(&conn, &fact(Some("HQ")).identity()).unwrap();
        assert!(other.is_none());
    }

    #[test]
    fn close_open_only_touches_identity() {
        let conn = setup();
        FactRepo::insert(&conn, &fact(None), t(9)).unwrap();
        FactRepo::insert(&conn, &fact(Some("HQ")), t(9)).unwrap();
        let changed = FactRepo::close_open(&conn, &fact(None).identity(), t(10)).unwrap();
        assert_eq!(changed, 1);
        assert!(FactRepo::find_open(&conn, &fact(Some("HQ")).identity()).unwrap().is_some());
    }

    #[test]
    fn active_at_window_and_order() {
        let conn = setup();
        let a = ContextFact::new("agenda", "Prepare review", "cap-1");
        let b = ContextFact::new("reminder", "Call dentist", "cap-2");
        FactRepo::insert(&conn, &a, t(9)).unwrap();
        FactRepo::insert(&conn, &b, t(10)).unwrap();

        assert!(FactRepo::active_at(&conn, t(8)).unwrap().is_empty());
        let at_930 = FactRepo::active_at(&conn, t(9) + Duration::minutes(30)).unwrap();
        assert_eq!(at_930.len(), 1);

        let later = FactRepo::active_at(&conn, t(11)).unwrap();
        assert_eq!(later.len(), 2);
        assert_eq!(later[0].detail, "Call dentist");
        assert_eq!(later[1].detail, "Prepare review");
    }

    #[test]
    fn active_at_excludes_closed_end() {
        let conn = setup();
        FactRepo::insert(&conn, &fact(None), t(9)).unwrap();
        FactRepo::close_open(&conn, &fact(None).identity(), t(11)).unwrap();
        assert_eq!(FactRepo::active_at(&conn, t(10)).unwrap().len(), 1);
        assert!(FactRepo::active_at(&conn, t(11)).unwrap().is_empty());
    }

    #[test]
    fn history_and_by_capture() {
        let conn = setup();
        FactRepo::insert(&conn, &fact(None), t(9)).unwrap();
        FactRepo::close_open(&conn, &fact(None).identity(), t(10)).unwrap();
        let mut second = fact(None);
        second.source_capture_id = "cap-b".into();
        FactRepo::insert(&conn, &second, t(10)).unwrap();

        let history = FactRepo::history(&conn, &fact(None).identity()).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].valid_to, Some(t(10)));
        assert_eq!(history[1].valid_from, t(10));

        let from_b = FactRepo::by_capture(&conn, "cap-b").unwrap();
        assert_eq!(from_b.len(), 1);
        assert_eq!(FactRepo::count(&conn).unwrap(), 2);
    }

    #[test]
    fn corrupt_timestamp_surfaces_as_error() {
        let conn = setup();
        conn.execute(
            "INSERT INTO context_facts
               (category, detail, confidence, source_capture_id, valid_from)
             VALUES ('schedule', 'x', 0.5, 'cap', 'not-a-time')",
            [],
        )
        .unwrap();
        assert!(FactRepo::by_capture(&conn, "cap").is_err());
    }
}
