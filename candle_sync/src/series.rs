//! Closed candles of one instrument, kept sorted and unique by `time`.
//!
//! Ticks can arrive late, so closes are not always in time order. The series
//! inserts each close at its ordered position instead of appending, and
//! refuses a second candle for a bucket it already holds.

use serde::{Deserialize, Serialize};

use crate::candle::Candle;

/// Time-ordered, duplicate-free list of closed candles.
///
/// Serializes as a plain JSON array of candles. Deserializing normalizes the
/// input: candles are sorted by `time`, for a repeated `time` the last
/// occurrence wins, and high/low are widened to cover open and close.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Candle>", into = "Vec<Candle>")]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    /// An empty series.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a normalized series from arbitrary candles.
    pub fn from_candles(candles: Vec<Candle>) -> Self {
        let mut candles = sort_dedup_last(candles);
        candles.iter_mut().for_each(Candle::repair);
        Self { candles }
    }

    /// Inserts `candle` at its ordered position.
    ///
    /// Returns `false`, leaving the series untouched, when a candle with the
    /// same `time` already exists.
    pub fn insert(&mut self, candle: Candle) -> bool {
        match self.candles.binary_search_by_key(&candle.time, |c| c.time) {
            Ok(_) => false,
            Err(idx) => {
                self.candles.insert(idx, candle);
                true
            }
        }
    }

    /// `true` when a candle for bucket `time` is present.
    pub fn contains(&self, time: i64) -> bool {
        self.candles
            .binary_search_by_key(&time, |c| c.time)
            .is_ok()
    }

    /// Number of candles.
    pub fn len(&self) -> usize {
        self.candles.len()
    }

    /// `true` when the series holds no candles.
    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// Most recent candle.
    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    /// Candles in ascending `time` order.
    pub fn as_slice(&self) -> &[Candle] {
        &self.candles
    }

    /// Iterates in ascending `time` order.
    pub fn iter(&self) -> std::slice::Iter<'_, Candle> {
        self.candles.iter()
    }

    /// Removes every candle.
    pub fn clear(&mut self) {
        self.candles.clear();
    }
}

impl From<Vec<Candle>> for CandleSeries {
    fn from(candles: Vec<Candle>) -> Self {
        Self::from_candles(candles)
    }
}

impl From<CandleSeries> for Vec<Candle> {
    fn from(series: CandleSeries) -> Self {
        series.candles
    }
}

impl<'a> IntoIterator for &'a CandleSeries {
    type Item = &'a Candle;
    type IntoIter = std::slice::Iter<'a, Candle>;

    fn into_iter(self) -> Self::IntoIter {
        self.candles.iter()
    }
}

/// Stable sort by `time`, then keep the last candle of every run of equal times.
pub(crate) fn sort_dedup_last(mut candles: Vec<Candle>) -> Vec<Candle> {
    candles.sort_by_key(|c| c.time);
    let mut out: Vec<Candle> = Vec::with_capacity(candles.len());
    for c in candles {
        match out.last_mut() {
            Some(prev) if prev.time == c.time => *prev = c,
            _ => out.push(c),
        }
    }
    out
}
