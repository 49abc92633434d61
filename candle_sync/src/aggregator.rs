//! Tick-to-candle aggregation.
//!
//! [`CandleAggregator`] is a pure state machine: it owns the single mutable
//! current candle and the series of closed candles for one instrument, and
//! reports what each tick did through [`TickOutcome`]. It performs no I/O;
//! callers persist the series when an outcome reports an appended close.
//!
//! [`merge_for_display`] turns a series plus the current candle into the
//! ordered, duplicate-free list a chart renders.

use std::num::NonZeroU64;

use tick_feed::models::{tick::TickQuote, timeframe::TimeFrame};
use tracing::debug;

use crate::{
    bucket::bucket_start_secs,
    candle::Candle,
    series::{CandleSeries, sort_dedup_last},
};

/// A candle closed by a tick from another bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosedCandle {
    /// The candle as it was when closed.
    pub candle: Candle,
    /// `false` when the series already held a candle for this bucket.
    pub appended: bool,
}

/// Result of feeding one tick to the aggregator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutcome {
    /// The current candle after the tick.
    pub current: Candle,
    /// Set when the tick started a new bucket and a previous candle was closed.
    pub closed: Option<ClosedCandle>,
}

impl TickOutcome {
    /// `true` when the series grew and should be persisted.
    pub fn appended(&self) -> bool {
        self.closed.is_some_and(|c| c.appended)
    }
}

/// Buckets ticks for one instrument into fixed-interval candles.
#[derive(Debug, Clone)]
pub struct CandleAggregator {
    interval_ms: NonZeroU64,
    series: CandleSeries,
    current: Option<Candle>,
}

impl CandleAggregator {
    /// Starts with an empty series.
    pub fn new(interval: TimeFrame) -> Self {
        Self::with_interval_ms(interval.as_millis())
    }

    /// Starts with an empty series and a raw millisecond bucket width.
    pub fn with_interval_ms(interval_ms: NonZeroU64) -> Self {
        Self {
            interval_ms,
            series: CandleSeries::new(),
            current: None,
        }
    }

    /// Seeds the closed series, e.g. from storage.
    pub fn with_series(mut self, series: CandleSeries) -> Self {
        self.series = series;
        self
    }

    /// Bucket width in milliseconds.
    pub fn interval_ms(&self) -> NonZeroU64 {
        self.interval_ms
    }

    /// Closed candles.
    pub fn series(&self) -> &CandleSeries {
        &self.series
    }

    /// The in-progress candle, if any tick has been seen since the last reset.
    pub fn current(&self) -> Option<&Candle> {
        self.current.as_ref()
    }

    /// Feeds one tick that arrived at `arrival_ms`.
    ///
    /// A tick for the current bucket updates high, low and close. A tick for
    /// any other bucket, earlier or later, closes the current candle into the
    /// series and opens a new one. Returns `None` for a tick without any usable
    /// price; such a tick changes nothing.
    pub fn on_tick(&mut self, tick: &TickQuote, arrival_ms: i64) -> Option<TickOutcome> {
        if tick.is_empty() {
            return None;
        }
        let time = bucket_start_secs(arrival_ms, self.interval_ms);

        if let Some(current) = self.current.as_mut() {
            if current.time == time {
                current.absorb(tick);
                return Some(TickOutcome {
                    current: *current,
                    closed: None,
                });
            }
        }

        let opened = Candle::open_from(time, tick)?;
        let closed = self.current.replace(opened).map(|candle| {
            let appended = self.series.insert(candle);
            if !appended {
                debug!(time = candle.time, "bucket already closed, duplicate skipped");
            }
            ClosedCandle { candle, appended }
        });

        Some(TickOutcome {
            current: opened,
            closed,
        })
    }

    /// The renderable series: closed candles plus the current one.
    pub fn display(&self) -> Vec<Candle> {
        merge_for_display(self.series.as_slice(), self.current.as_ref())
    }

    /// Drops the current candle without closing it and replaces the series.
    pub fn reset(&mut self, series: CandleSeries) {
        self.current = None;
        self.series = series;
    }

    /// Drops the current candle and every closed candle.
    pub fn clear(&mut self) {
        self.reset(CandleSeries::new());
    }
}

/// Merges closed candles and the current candle into a renderable series.
///
/// The result is sorted ascending by `time` (stable) and holds one candle per
/// bucket; where several share a bucket the last one wins, so the current
/// candle supersedes a closed candle of the same bucket.
pub fn merge_for_display(series: &[Candle], current: Option<&Candle>) -> Vec<Candle> {
    let mut all = Vec::with_capacity(series.len() + 1);
    all.extend_from_slice(series);
    all.extend(current.copied());
    sort_dedup_last(all)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn agg() -> CandleAggregator {
        CandleAggregator::new(TimeFrame::ONE_MINUTE)
    }

    fn q(o: f64, h: f64, l: f64, c: f64) -> TickQuote {
        TickQuote::new(o, h, l, c)
    }

    #[test]
    fn one_minute_scenario() {
        let mut a = agg();

        let out = a.on_tick(&q(10.0, 11.0, 9.0, 10.0), 1_000).unwrap();
        assert!(out.closed.is_none());

        let out = a.on_tick(&q(10.0, 12.0, 9.0, 11.0), 30_000).unwrap();
        assert_eq!(out.current, Candle { time: 0, open: 10.0, high: 12.0, low: 9.0, close: 11.0 });
        assert!(out.closed.is_none());
        assert!(a.series().is_empty());

        let out = a.on_tick(&q(11.0, 11.0, 10.0, 10.5), 61_000).unwrap();
        let bucket0 = Candle { time: 0, open: 10.0, high: 12.0, low: 9.0, close: 11.0 };
        let bucket60 = Candle { time: 60, open: 11.0, high: 11.0, low: 10.0, close: 10.5 };
        assert_eq!(out.closed, Some(ClosedCandle { candle: bucket0, appended: true }));
        assert_eq!(out.current, bucket60);
        assert!(out.appended());
        assert_eq!(a.series().as_slice(), &[bucket0]);

        assert_eq!(a.display(), vec![bucket0, bucket60]);
    }

    #[test]
    fn empty_tick_changes_nothing() {
        let mut a = agg();
        a.on_tick(&q(1.0, 1.0, 1.0, 1.0), 1_000).unwrap();
        assert!(a.on_tick(&TickQuote::default(), 120_000).is_none());
        assert_eq!(a.current().unwrap().time, 0);
        assert!(a.series().is_empty());
    }

    #[test]
    fn late_tick_reopens_an_earlier_bucket() {
        let mut a = agg();
        a.on_tick(&q(1.0, 1.0, 1.0, 1.0), 1_000).unwrap();
        a.on_tick(&q(2.0, 2.0, 2.0, 2.0), 61_000).unwrap();

        // late tick for bucket 0 closes bucket 60 and reopens bucket 0
        let out = a.on_tick(&q(3.0, 3.0, 3.0, 3.0), 2_000).unwrap();
        assert_eq!(out.closed.unwrap().candle.time, 60);
        assert!(out.appended());
        assert_eq!(out.current.time, 0);

        // returning to bucket 60 closes the reopened bucket 0: already stored
        let out = a.on_tick(&q(4.0, 4.0, 4.0, 4.0), 62_000).unwrap();
        let closed = out.closed.unwrap();
        assert_eq!(closed.candle.time, 0);
        assert!(!closed.appended);

        let times: Vec<i64> = a.series().iter().map(|c| c.time).collect();
        assert_eq!(times, vec![0, 60]);
        // stored bucket 0 keeps its first close
        assert_eq!(a.series().as_slice()[0].close, 1.0);

        let display = a.display();
        assert_eq!(display.len(), 2);
        assert_eq!(display[1].close, 4.0);
    }

    #[test]
    fn reset_discards_current_candle() {
        let mut a = agg();
        a.on_tick(&q(1.0, 1.0, 1.0, 1.0), 1_000).unwrap();
        a.reset(CandleSeries::from_candles(vec![Candle::new(600, 5.0, 5.0, 5.0, 5.0)]));
        assert!(a.current().is_none());
        assert_eq!(a.series().len(), 1);

        a.clear();
        assert!(a.display().is_empty());
    }

    #[test]
    fn merge_prefers_current_for_shared_bucket() {
        let closed = [Candle::new(0, 1.0, 1.0, 1.0, 1.0), Candle::new(60, 2.0, 2.0, 2.0, 2.0)];
        let current = Candle::new(60, 9.0, 9.0, 9.0, 9.0);
        let merged = merge_for_display(&closed, Some(&current));
        assert_eq!(merged, vec![closed[0], current]);
        assert!(merge_for_display(&[], None).is_empty());
    }

    fn arb_candle() -> impl Strategy<Value = Candle> {
        (0i64..50, 1.0f64..100.0).prop_map(|(slot, px)| Candle::new(slot * 60, px, px, px, px))
    }

    fn arb_tick() -> impl Strategy<Value = (TickQuote, i64)> {
        (1.0f64..100.0, 0.0f64..5.0, 0.0f64..5.0, 1.0f64..100.0, 0i64..600_000).prop_map(
            |(o, up, down, c, ts)| (TickQuote::new(o, o.max(c) + up, o.min(c) - down, c), ts),
        )
    }

    proptest! {
        #[test]
        fn merge_is_sorted_unique_and_idempotent(
            series in proptest::collection::vec(arb_candle(), 0..30),
            current in proptest::option::of(arb_candle()),
        ) {
            let merged = merge_for_display(&series, current.as_ref());
            prop_assert!(merged.windows(2).all(|w| w[0].time < w[1].time));
            prop_assert_eq!(merge_for_display(&merged, None), merged.clone());
            if let Some(cur) = current {
                prop_assert!(merged.contains(&cur));
            }
        }

        #[test]
        fn in_bucket_updates_are_monotonic(ticks in proptest::collection::vec(arb_tick(), 1..40)) {
            let mut a = CandleAggregator::with_interval_ms(NonZeroU64::new(600_000).unwrap());
            for (tick, ts) in &ticks {
                a.on_tick(tick, *ts);
            }
            // every tick lands in bucket 0: one candle, nothing closed
            prop_assert!(a.series().is_empty());
            let cur = *a.current().unwrap();
            let max_h = ticks.iter().filter_map(|(t, _)| t.high()).fold(f64::MIN, f64::max);
            let min_l = ticks.iter().filter_map(|(t, _)| t.low()).fold(f64::MAX, f64::min);
            prop_assert_eq!(cur.time, 0);
            prop_assert_eq!(cur.open, ticks[0].0.open().unwrap());
            prop_assert_eq!(cur.close, ticks[ticks.len() - 1].0.close().unwrap());
            prop_assert_eq!(cur.high, max_h);
            prop_assert_eq!(cur.low, min_l);
        }

        #[test]
        fn output_is_always_consistent(ticks in proptest::collection::vec(arb_tick(), 1..60)) {
            let mut a = agg();
            for (tick, ts) in &ticks {
                a.on_tick(tick, *ts);
            }
            let display = a.display();
            prop_assert!(display.windows(2).all(|w| w[0].time < w[1].time));
            prop_assert!(display.iter().all(Candle::is_consistent));
            prop_assert!(a.series().as_slice().windows(2).all(|w| w[0].time < w[1].time));
        }
    }
}
