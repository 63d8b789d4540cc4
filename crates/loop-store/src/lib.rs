//! # loop-store
//!
//! Append-only temporal store of context facts.
//!
//! - **Versioning**: one active version per identity tuple; an upsert closes
//!   the active version and opens a new one at the same instant
//! - **Point-in-time queries**: [`ContextFactStore::get_active_facts`] answers
//!   for any past or present reference time
//! - **Resolver**: [`AgendaResolver`] exposes named category views
//! - **`SQLite` backend**: `rusqlite` + `r2d2` pool, versioned migrations

#![deny(unsafe_code)]

pub mod errors;
pub mod record;
pub mod resolver;
pub mod sqlite;
pub mod store;

pub use errors::{Result, StoreError};
pub use record::{ContextFactRecord, RecordId};
pub use resolver::{AGENDA_CATEGORIES, AgendaResolver, FactView, SCHEDULE_CATEGORIES};
pub use sqlite::connection::ConnectionConfig;
pub use store::ContextFactStore;
