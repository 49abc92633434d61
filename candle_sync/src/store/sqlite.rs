//! SQLite-backed [`CandleStore`] on the `engine_kv` table.

use diesel::prelude::*;
use tracing::debug;

use crate::{
    db::{connection::connect_sqlite, migrate},
    schema::engine_kv::dsl as kv,
    series::CandleSeries,
    store::{CandleStore, StoreError},
};

/// Stores each series as one JSON row of `engine_kv(k, v)`.
pub struct SqliteCandleStore {
    conn: SqliteConnection,
}

impl std::fmt::Debug for SqliteCandleStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteCandleStore").finish_non_exhaustive()
    }
}

impl SqliteCandleStore {
    /// Opens (creating if needed) the database at `database_url` and applies migrations.
    ///
    /// `:memory:` gives a private database that lives as long as the store.
    pub fn open(database_url: &str) -> Result<Self, StoreError> {
        let mut conn = connect_sqlite(database_url).map_err(|e| StoreError::Setup(format!("{e:#}")))?;
        migrate::run_pending(&mut conn).map_err(|e| StoreError::Setup(format!("{e:#}")))?;
        debug!(database_url, "candle store ready");
        Ok(Self { conn })
    }

    /// Stored keys, sorted.
    pub fn keys(&mut self) -> Result<Vec<String>, StoreError> {
        Ok(kv::engine_kv
            .select(kv::k)
            .order(kv::k.asc())
            .load::<String>(&mut self.conn)?)
    }
}

impl CandleStore for SqliteCandleStore {
    fn get(&mut self, key: &str) -> Result<Option<CandleSeries>, StoreError> {
        let payload: Option<String> = kv::engine_kv
            .find(key)
            .select(kv::v)
            .first(&mut self.conn)
            .optional()?;
        payload
            .map(|v| serde_json::from_str::<CandleSeries>(&v))
            .transpose()
            .map_err(StoreError::from)
    }

    fn set(&mut self, key: &str, series: &CandleSeries) -> Result<(), StoreError> {
        let payload = serde_json::to_string(series)?;
        diesel::insert_into(kv::engine_kv)
            .values((kv::k.eq(key), kv::v.eq(&payload)))
            .on_conflict(kv::k)
            .do_update()
            .set(kv::v.eq(&payload))
            .execute(&mut self.conn)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        diesel::delete(kv::engine_kv.find(key)).execute(&mut self.conn)?;
        Ok(())
    }
}
