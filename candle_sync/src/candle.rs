//! A single OHLC bar.

use serde::{Deserialize, Serialize};
use tick_feed::models::tick::TickQuote;

/// One fixed-interval OHLC bar.
///
/// `time` is the bucket start in seconds since the Unix epoch. Every candle
/// built by this crate satisfies `low <= open, close <= high`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Bucket start, seconds since the epoch.
    pub time: i64,
    /// First price of the bucket.
    pub open: f64,
    /// Highest price seen in the bucket.
    pub high: f64,
    /// Lowest price seen in the bucket.
    pub low: f64,
    /// Last price seen in the bucket.
    pub close: f64,
}

impl Candle {
    /// Builds a candle from explicit prices, widening high/low to cover open/close.
    pub fn new(time: i64, open: f64, high: f64, low: f64, close: f64) -> Self {
        let mut candle = Self {
            time,
            open,
            high,
            low,
            close,
        };
        candle.repair();
        candle
    }

    /// Opens a candle at `time` from the first tick of a bucket.
    ///
    /// Missing fields borrow from the ones present: open falls back through
    /// close, high, low; close through open, low, high; high and low take the
    /// extremes of whatever is present. Returns `None` when the tick carries no
    /// usable price.
    pub fn open_from(time: i64, tick: &TickQuote) -> Option<Self> {
        let present = [tick.open(), tick.high(), tick.low(), tick.close()];
        let high = present.iter().flatten().copied().reduce(f64::max)?;
        let low = present.iter().flatten().copied().reduce(f64::min)?;
        let open = tick
            .open()
            .or(tick.close())
            .or(tick.high())
            .or(tick.low())?;
        let close = tick
            .close()
            .or(tick.open())
            .or(tick.low())
            .or(tick.high())?;

        Some(Self::new(
            time,
            open,
            tick.high().unwrap_or(high),
            tick.low().unwrap_or(low),
            close,
        ))
    }

    /// Folds a same-bucket tick into the candle. `open` never changes.
    pub fn absorb(&mut self, tick: &TickQuote) {
        if let Some(h) = tick.high() {
            self.high = self.high.max(h);
        }
        if let Some(l) = tick.low() {
            self.low = self.low.min(l);
        }
        if let Some(c) = tick.close() {
            self.close = c;
        }
        self.repair();
    }

    /// Widens `high`/`low` so they cover `open` and `close`.
    pub fn repair(&mut self) {
        self.high = self.high.max(self.open).max(self.close);
        self.low = self.low.min(self.open).min(self.close);
    }

    /// `true` when all prices are finite and `low <= open, close <= high`.
    pub fn is_consistent(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .all(|p| p.is_finite())
            && self.low <= self.open.min(self.close)
            && self.open.max(self.close) <= self.high
    }
}
