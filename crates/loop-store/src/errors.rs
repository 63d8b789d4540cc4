//! Error types for the temporal store.
//!
//! Every variant is a storage failure from the caller's point of view; the
//! variants exist so callers can tell a rejected write from a broken disk.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// `SQLite` database error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool error.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// Schema migration failed.
    #[error("migration error: {message}")]
    Migration {
        /// Describes which migration failed and why.
        message: String,
    },

    /// A timestamp falls outside the years the storage format can encode.
    #[error("timestamp {timestamp} is outside the storable range (years 0000-9999)")]
    TimestampOutOfRange {
        /// The rejected timestamp.
        timestamp: DateTime<Utc>,
    },

    /// An upsert tried to start a version before the active one started.
    #[error(
        "out-of-order upsert for {category}/{detail}: effective time {effective_time} precedes active version from {active_from}"
    )]
    OutOfOrder {
        /// Category of the identity.
        category: String,
        /// Detail of the identity.
        detail: String,
        /// Effective time of the rejected write.
        effective_time: DateTime<Utc>,
        /// `valid_from` of the version that is currently active.
        active_from: DateTime<Utc>,
    },
}

/// Convenience type alias for store results.
pub type Result<T> = std::result::Result<T, StoreError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn sqlite_error_display() {
        let err = StoreError::Sqlite(rusqlite::Error::QueryReturnedNoRows);
        assert!(err.to_string().contains("sqlite error"));
    }

    #[test]
    fn migration_error_display() {
        let err = StoreError::Migration {
            message: "v001 failed: disk I/O error".into(),
        };
        assert_eq!(err.to_string(), "migration error: v001 failed: disk I/O error");
    }

    #[test]
    fn out_of_order_display() {
        let err = StoreError::OutOfOrder {
            category: "schedule".into(),
            detail: "Works Friday".into(),
            effective_time: Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap(),
            active_from: Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
        };
        let msg = err.to_string();
        assert!(msg.contains("schedule/Works Friday"));
        assert!(msg.contains("precedes"));
    }

    #[test]
    fn out_of_range_display() {
        let err = StoreError::TimestampOutOfRange {
            timestamp: Utc.with_ymd_and_hms(10_000, 1, 1, 0, 0, 0).unwrap(),
        };
        assert!(err.to_string().contains("outside the storable range"));
    }

    #[test]
    fn from_rusqlite_error() {
        let err: StoreError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, StoreError::Sqlite(_)));
    }
}
