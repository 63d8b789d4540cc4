//! `SQLite` backend: connection pool, migrations, and repositories.

pub mod connection;
pub mod migrations;
pub mod repositories;
