//! High-level transactional `ContextFactStore` API.
//!
//! The store owns its connection pool for its whole lifetime. Every upsert
//! runs in one `BEGIN IMMEDIATE` transaction: the write lock is taken before
//! the close-out lookup, so two writers racing on the same identity are
//! serialised even across connections, and WAL readers only ever see the
//! committed state before or after the upsert.

use chrono::{DateTime, Utc};
use loop_core::time::{is_storable, normalize};
use loop_core::{CaptureId, ContextFact, FactIdentity};
use loop_settings::StoreSettings;
use rusqlite::{Connection, TransactionBehavior};
use tracing::{debug, info, warn};

use crate::errors::{Result, StoreError};
use crate::record::{ContextFactRecord, RecordId};
use crate::sqlite::connection::{self, ConnectionConfig, ConnectionPool, PooledConnection};
use crate::sqlite::migrations::run_migrations;
use crate::sqlite::repositories::fact::FactRepo;

/// Append-only versioned store of context facts.
pub struct ContextFactStore {
    pool: ConnectionPool,
}

impl ContextFactStore {
    /// Open (creating if needed) a file-backed store and initialize its schema.
    pub fn open(path: &str, config: &ConnectionConfig) -> Result<Self> {
        let store = Self {
            pool: connection::new_file(path, config)?,
        };
        store.initialize()?;
        info!(path, "context fact store opened");
        Ok(store)
    }

    /// Open a private in-memory store.
    ///
    /// The database lives on a single pooled connection, so calls from
    /// several threads are served one at a time and a caller waits up to the
    /// pool's 5 s acquire timeout before failing with [`StoreError::Pool`].
    /// Use a file-backed store when reads must run in parallel.
    pub fn in_memory() -> Result<Self> {
        let store = Self {
            pool: connection::new_in_memory(&ConnectionConfig::default())?,
        };
        store.initialize()?;
        Ok(store)
    }

    /// Open the store described by `settings` (`":memory:"` or a file path).
    pub fn from_settings(settings: &StoreSettings) -> Result<Self> {
        if settings.is_in_memory() {
            Self::in_memory()
        } else {
            Self::open(&settings.db_path, &ConnectionConfig::from(settings))
        }
    }

    /// Create the schema if absent. Safe to call repeatedly.
    pub fn initialize(&self) -> Result<()> {
        let conn = self.conn()?;
        let applied = run_migrations(&conn)?;
        debug!(applied, "schema initialized");
        Ok(())
    }

    /// Release the pool. Dropping the store has the same effect.
    pub fn close(self) {
        debug!("context fact store closed");
    }

    fn conn(&self) -> Result<PooledConnection> {
        Ok(self.pool.get()?)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Writes
    // ─────────────────────────────────────────────────────────────────────

    /// Insert a fact, superseding the active version of the same identity.
    ///
    /// `effective_time` defaults to now. The superseded version is closed
    /// with `valid_to = effective_time` and the new version starts at the
    /// same instant. An equal effective time is accepted (last write wins,
    /// the older version gets an empty window); an earlier one is rejected
    /// with [`StoreError::OutOfOrder`] and nothing is written. Times outside
    /// years 0000-9999 fail with [`StoreError::TimestampOutOfRange`].
    pub fn upsert(&self, fact: &ContextFact, effective_time: Option<DateTime<Utc>>) -> Result<()> {
        let at = effective(effective_time)?;
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let _ = upsert_in(&tx, fact, at)?;
        tx.commit()?;
        Ok(())
    }

    /// Upsert each fact in order with one shared effective time.
    ///
    /// Each fact commits on its own: if one fails, the earlier ones stay
    /// written and the error is returned. Use [`Self::upsert_many_atomic`]
    /// when the batch must be all-or-nothing.
    pub fn upsert_many<'a, I>(&self, facts: I, effective_time: Option<DateTime<Utc>>) -> Result<()>
    where
        I: IntoIterator<Item = &'a ContextFact>,
    {
        let at = effective(effective_time)?;
        for fact in facts {
            self.upsert(fact, Some(at))?;
        }
        Ok(())
    }

    /// Upsert a batch inside a single transaction.
    pub fn upsert_many_atomic<'a, I>(&self, facts: I, effective_time: Option<DateTime<Utc>>) -> Result<()>
    where
        I: IntoIterator<Item = &'a ContextFact>,
    {
        let at = effective(effective_time)?;
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut written = 0usize;
        for fact in facts {
            let _ = upsert_in(&tx, fact, at)?;
            written += 1;
        }
        tx.commit()?;
        debug!(written, "atomic batch committed");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────

    /// Snapshot of every version active at `reference_time` (default now),
    /// most recently started first.
    pub fn get_active_facts(&self, reference_time: Option<DateTime<Utc>>) -> Result<Vec<ContextFactRecord>> {
        let at = effective(reference_time)?;
        let conn = self.conn()?;
        FactRepo::active_at(&conn, at)
    }

    /// The version of `identity` in effect at `reference_time` (default now).
    pub fn active_version(
        &self,
        identity: &FactIdentity,
        reference_time: Option<DateTime<Utc>>,
    ) -> Result<Option<ContextFactRecord>> {
        let at = effective(reference_time)?;
        Ok(self.history(identity)?.into_iter().rev().find(|r| r.is_active_at(at)))
    }

    /// Fetch one stored version.
    pub fn get_record(&self, id: RecordId) -> Result<Option<ContextFactRecord>> {
        let conn = self.conn()?;
        FactRepo::get_by_id(&conn, id)
    }

    /// Every version of an identity, oldest first.
    pub fn history(&self, identity: &FactIdentity) -> Result<Vec<ContextFactRecord>> {
        let conn = self.conn()?;
        FactRepo::history(&conn, identity)
    }

    /// Every version sourced from a capture, oldest first.
    pub fn records_for_capture(&self, capture_id: &CaptureId) -> Result<Vec<ContextFactRecord>> {
        let conn = self.conn()?;
        FactRepo::by_capture(&conn, capture_id.as_str())
    }

    /// Total number of stored versions, open and closed.
    pub fn count_records(&self) -> Result<u64> {
        let conn = self.conn()?;
        FactRepo::count(&conn)
    }
}

/// Resolve an optional time to a storable instant, rejecting years the
/// text encoding cannot order.
fn effective(ts: Option<DateTime<Utc>>) -> Result<DateTime<Utc>> {
    let at = normalize(ts.unwrap_or_else(Utc::now));
    if is_storable(at) {
        Ok(at)
    } else {
        Err(StoreError::TimestampOutOfRange { timestamp: at })
    }
}

/// Close-out-then-insert against an open transaction.
fn upsert_in(conn: &Connection, fact: &ContextFact, at: DateTime<Utc>) -> Result<RecordId> {
    let identity = fact.identity();

    if let Some(active) = FactRepo::find_open(conn, &identity)? {
        if at < active.valid_from {
            warn!(
                category = %identity.category,
                detail = %identity.detail,
                effective_time = %at,
                active_from = %active.valid_from,
                "rejecting out-of-order upsert"
            );
            return Err(StoreError::OutOfOrder {
                category: identity.category.to_string(),
                detail: identity.detail,
                effective_time: at,
                active_from: active.valid_from,
            });
        }
        let closed = FactRepo::close_open(conn, &identity, at)?;
        debug!(
            superseded = %active.id,
            closed,
            category = %identity.category,
            "closing active version"
        );
    }

    let id = FactRepo::insert(conn, fact, at)?;
    debug!(id = %id, category = %fact.category, source = %fact.source_capture_id, "fact version inserted");
    Ok(id)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
