//! Lock-free, read-mostly handle on the latest display series.
//!
//! The live runner calls [`DisplaySnapshot::publish`] after every update;
//! readers on any thread call [`DisplaySnapshot::load`] and get either the
//! previous or the new full series, never a partial one.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::candle::Candle;

/// Shared pointer to the most recently published display series.
///
/// Clones share the same slot.
#[derive(Debug, Clone)]
pub struct DisplaySnapshot {
    inner: Arc<ArcSwap<Vec<Candle>>>,
}

impl Default for DisplaySnapshot {
    fn default() -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(Vec::new())),
        }
    }
}

impl DisplaySnapshot {
    /// Starts empty.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the published series.
    pub fn publish(&self, candles: Vec<Candle>) {
        self.inner.store(Arc::new(candles));
    }

    /// The latest published series.
    pub fn load(&self) -> Arc<Vec<Candle>> {
        self.inner.load_full()
    }

    /// Length of the latest published series.
    pub fn len(&self) -> usize {
        self.inner.load().len()
    }

    /// `true` when the latest published series is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.load().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readers_see_whole_snapshots() {
        let snap = DisplaySnapshot::new();
        let reader = snap.clone();
        assert!(reader.is_empty());

        let before = reader.load();
        snap.publish(vec![Candle::new(0, 1.0, 1.0, 1.0, 1.0)]);
        assert!(before.is_empty());
        assert_eq!(reader.len(), 1);
        assert_eq!(reader.load()[0].time, 0);
    }
}
