//! Durable storage for candle series.
//!
//! A [`CandleStore`] is a small key/value interface: one JSON-encoded
//! [`CandleSeries`] per instrument under [`storage_key`]. The chart session
//! treats every store failure as recoverable and only logs it.

pub mod memory;
pub mod sqlite;

use thiserror::Error;

use crate::series::CandleSeries;

/// Errors surfaced by a [`CandleStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// A query against the backing database failed.
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    /// The database could not be opened or migrated.
    #[error("Database setup failed: {0}")]
    Setup(String),

    /// A stored payload could not be encoded or decoded.
    #[error("Payload codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// The store refused the operation.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Key under which the series of `symbol` is stored.
pub fn storage_key(symbol: &str) -> String {
    format!("candles_{symbol}")
}

/// Key/value persistence for closed candles.
pub trait CandleStore {
    /// Loads the series stored under `key`, `None` when absent.
    fn get(&mut self, key: &str) -> Result<Option<CandleSeries>, StoreError>;

    /// Replaces whatever is stored under `key` with `series`.
    fn set(&mut self, key: &str, series: &CandleSeries) -> Result<(), StoreError>;

    /// Deletes `key`. Removing an absent key is not an error.
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

impl<S: CandleStore + ?Sized> CandleStore for Box<S> {
    fn get(&mut self, key: &str) -> Result<Option<CandleSeries>, StoreError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, series: &CandleSeries) -> Result<(), StoreError> {
        (**self).set(key, series)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}
