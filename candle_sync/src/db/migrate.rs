//! set up migrations

use anyhow::anyhow;
use diesel::SqliteConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::debug;

use crate::db::connection::connect_sqlite;

/// Embedded Diesel migrations bundled with this crate.
///
/// These create the `engine_kv` table the candle store writes to.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Applies pending migrations on an already open connection.
///
/// Needed for `:memory:` databases, where every new connection sees a fresh database.
pub fn run_pending(conn: &mut SqliteConnection) -> anyhow::Result<()> {
    let applied = conn.run_pending_migrations(MIGRATIONS).map_err(|e| anyhow!(e))?;
    debug!(count = applied.len(), "migrations applied");
    Ok(())
}

/// Runs pending Diesel migrations on a SQLite database at the given URL.
pub fn run_sqlite(url: &str) -> anyhow::Result<()> {
    let mut conn = connect_sqlite(url)?;
    run_pending(&mut conn)
}
