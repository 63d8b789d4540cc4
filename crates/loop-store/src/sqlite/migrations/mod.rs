//! Versioned schema for the fact store.
//!
//! Each step is an embedded SQL file applied in its own `BEGIN IMMEDIATE`
//! transaction and recorded in `schema_version`. The recorded version is read
//! after the write lock is taken, so several processes opening a fresh file
//! at once apply every step exactly once, and [`run_migrations`] is safe to
//! call on every open.

use rusqlite::{Connection, Transaction, TransactionBehavior};
use tracing::{debug, info};

use crate::errors::{Result, StoreError};

struct Step {
    version: u32,
    description: &'static str,
    sql: &'static str,
}

const STEPS: &[Step] = &[Step {
    version: 1,
    description: "context_facts table and lookup indexes",
    sql: include_str!("v001_context_facts.sql"),
}];

const VERSION_TABLE: &str = "CREATE TABLE IF NOT EXISTS schema_version (
    version     INTEGER PRIMARY KEY,
    applied_at  TEXT    NOT NULL,
    description TEXT
)";

/// Bring the schema up to date. Returns how many steps this call applied.
pub fn run_migrations(conn: &Connection) -> Result<u32> {
    let mut applied = 0;

    for step in STEPS {
        let context = |what: &str, e: rusqlite::Error| {
            migration_error(format!("v{:03} {what}: {e}", step.version))
        };

        let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
            .map_err(|e| context("begin", e))?;
        ensure_version_table(&tx)?;
        if step.version <= current_version(&tx)? {
            continue;
        }

        info!(version = step.version, description = step.description, "migrating fact store");
        tx.execute_batch(step.sql).map_err(|e| context("sql", e))?;
        let _ = tx
            .execute(
                "INSERT INTO schema_version (version, applied_at, description)
                 VALUES (?1, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'), ?2)",
                rusqlite::params![step.version, step.description],
            )
            .map_err(|e| context("record", e))?;
        tx.commit().map_err(|e| context("commit", e))?;
        applied += 1;
    }

    if applied == 0 {
        debug!(version = latest_version(), "schema up to date");
    }
    Ok(applied)
}

/// Highest recorded schema version; 0 on a fresh database.
pub fn current_version(conn: &Connection) -> Result<u32> {
    conn.query_row("SELECT IFNULL(MAX(version), 0) FROM schema_version", [], |row| {
        row.get(0)
    })
    .map_err(|e| migration_error(format!("cannot read schema version: {e}")))
}

/// Version the newest embedded step brings the schema to.
pub fn latest_version() -> u32 {
    STEPS.iter().map(|step| step.version).max().unwrap_or(0)
}

fn ensure_version_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(VERSION_TABLE)
        .map_err(|e| migration_error(format!("cannot create schema_version: {e}")))
}

fn migration_error(message: String) -> StoreError {
    StoreError::Migration { message }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
