//! In-memory [`CandleStore`] for tests and ephemeral runs.

use std::collections::HashMap;

use crate::{
    series::CandleSeries,
    store::{CandleStore, StoreError},
};

/// A `HashMap`-backed store that counts writes and can be told to fail.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, CandleSeries>,
    writes: usize,
    fail_reads: bool,
    fail_writes: bool,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populates `key`.
    pub fn with_entry(mut self, key: impl Into<String>, series: CandleSeries) -> Self {
        self.entries.insert(key.into(), series);
        self
    }

    /// Makes every subsequent `get` fail.
    pub fn fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    /// Makes every subsequent `set`/`remove` fail.
    pub fn fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Successful `set` calls so far.
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Stored series without going through `get`.
    pub fn peek(&self, key: &str) -> Option<&CandleSeries> {
        self.entries.get(key)
    }
}

impl CandleStore for MemoryStore {
    fn get(&mut self, key: &str) -> Result<Option<CandleSeries>, StoreError> {
        if self.fail_reads {
            return Err(StoreError::Unavailable(format!("read of {key} refused")));
        }
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, series: &CandleSeries) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Unavailable(format!("write of {key} refused")));
        }
        self.entries.insert(key.to_string(), series.clone());
        self.writes += 1;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Unavailable(format!("remove of {key} refused")));
        }
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candle::Candle;

    #[test]
    fn counts_writes_and_injects_failures() {
        let series = CandleSeries::from_candles(vec![Candle::new(0, 1.0, 1.0, 1.0, 1.0)]);
        let mut store = MemoryStore::new();
        store.set("candles_HBL", &series).unwrap();
        assert_eq!(store.writes(), 1);
        assert_eq!(store.peek("candles_HBL"), Some(&series));

        store.fail_writes(true);
        assert!(store.set("candles_HBL", &CandleSeries::new()).is_err());
        assert_eq!(store.writes(), 1);
        assert_eq!(store.get("candles_HBL").unwrap(), Some(series));

        store.fail_reads(true);
        assert!(matches!(store.get("candles_HBL"), Err(StoreError::Unavailable(_))));
    }
}
