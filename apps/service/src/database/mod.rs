//! Result storage
//!
//! A [`ResultStore`] trait with a LibSQL (SQLite) implementation for
//! durable storage and an in-memory one for ephemeral use.

pub mod memory;
pub mod migrations;
pub mod models;
pub mod repository;

pub use memory::MemoryResultStore;
pub use repository::{DEFAULT_WRITE_TIMEOUT, LibsqlResultStore, ResultStore};

use anyhow::Result;

/// Initialize database with schema
pub async fn initialize_database(conn: &libsql::Connection) -> Result<()> {
    migrations::run_migrations(conn).await
}
