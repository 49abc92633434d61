//! SQLite connection helpers.
//!
//! Provides [`connect_sqlite`] that opens a connection and applies the PRAGMAs
//! the candle store relies on: WAL journaling, foreign_keys=ON, and a 5000ms busy_timeout.

use anyhow::Context;
use diesel::{Connection, RunQueryDsl, SqliteConnection, sql_query};

/// Turns a configured database URL into something `SqliteConnection` accepts.
///
/// Accepts bare paths, `:memory:`, and `sqlite:`/`sqlite://` prefixed forms.
/// PostgreSQL URLs are rejected.
pub fn sqlite_path(database_url: &str) -> anyhow::Result<&str> {
    let url = database_url.trim();
    if url.starts_with("postgres://") || url.starts_with("postgresql://") {
        anyhow::bail!("Unsupported DATABASE_URL (sqlite only): {url}");
    }
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url);
    if path.is_empty() {
        anyhow::bail!("DATABASE_URL is empty");
    }
    Ok(path)
}

/// Open a SQLite connection and apply connection-wide PRAGMAs.
pub fn connect_sqlite(database_url: &str) -> anyhow::Result<SqliteConnection> {
    let path = sqlite_path(database_url)?;
    let mut conn = SqliteConnection::establish(path)
        .with_context(|| format!("open sqlite database {path}"))?;

    sql_query("PRAGMA journal_mode=WAL;").execute(&mut conn)?;
    sql_query("PRAGMA foreign_keys=ON;").execute(&mut conn)?;
    sql_query("PRAGMA busy_timeout=5000;").execute(&mut conn)?;
    Ok(conn)
}
