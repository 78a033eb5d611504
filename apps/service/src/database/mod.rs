/// Persistence layer: endpoint registry reads and the append-only check
/// store, backed by a local LibSQL database.
pub mod migrations;
pub mod models;
pub mod repository;

pub use repository::{LibsqlStore, Store};

use anyhow::Result;

/// Initialize database with schema
pub async fn initialize_database(conn: &libsql::Connection) -> Result<()> {
    migrations::run_migrations(conn).await
}
