//! One chart's instrument subscription lifecycle.
//!
//! A [`ChartSession`] owns the aggregator of the active instrument and the
//! store its closed candles persist to. It loads history when an instrument
//! is selected, writes the series back once per appended close, and discards
//! the in-progress candle on switch. Storage failures are logged and never
//! change in-memory state.

use tick_feed::models::{symbol::normalize_symbol, tick::TickEvent, timeframe::TimeFrame};
use tracing::{debug, info, warn};

use crate::{
    aggregator::{CandleAggregator, TickOutcome},
    candle::Candle,
    series::CandleSeries,
    store::{CandleStore, storage_key},
};

/// Whether the session has received a tick yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    /// Subscribed, no tick received.
    Waiting,
    /// At least one tick received.
    Live,
}

/// Point-in-time view of a session, for status lines.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStatus {
    /// Active instrument.
    pub symbol: String,
    /// Feed state.
    pub state: FeedStatus,
    /// Closed candles held for the instrument.
    pub closed_candles: usize,
    /// The in-progress candle.
    pub current: Option<Candle>,
}

/// Aggregation state plus persistence for the active instrument.
#[derive(Debug)]
pub struct ChartSession<S> {
    symbol: String,
    interval: TimeFrame,
    store: S,
    aggregator: CandleAggregator,
    state: FeedStatus,
}

impl<S: CandleStore> ChartSession<S> {
    /// Selects `symbol` and loads its stored history.
    ///
    /// The symbol is trimmed and upper-cased first, so `"hbl"` and `"HBL"`
    /// share one stored series. A failed read is logged and leaves the series
    /// empty.
    pub fn open(symbol: impl Into<String>, interval: TimeFrame, store: S) -> Self {
        let raw = symbol.into();
        let mut session = Self {
            symbol: normalize_symbol(&raw).unwrap_or(raw),
            interval,
            store,
            aggregator: CandleAggregator::new(interval),
            state: FeedStatus::Waiting,
        };
        let series = session.load_series();
        session.aggregator.reset(series);
        session
    }

    fn load_series(&mut self) -> CandleSeries {
        let key = storage_key(&self.symbol);
        match self.store.get(&key) {
            Ok(Some(series)) => {
                info!(symbol = %self.symbol, candles = series.len(), "history loaded");
                series
            }
            Ok(None) => {
                debug!(symbol = %self.symbol, "no stored history");
                CandleSeries::new()
            }
            Err(e) => {
                warn!(symbol = %self.symbol, error = %e, "failed to load history, starting empty");
                CandleSeries::new()
            }
        }
    }

    fn persist(&mut self) {
        let key = storage_key(&self.symbol);
        match self.store.set(&key, self.aggregator.series()) {
            Ok(()) => debug!(symbol = %self.symbol, candles = self.aggregator.series().len(), "history saved"),
            Err(e) => warn!(symbol = %self.symbol, error = %e, "failed to save history"),
        }
    }

    /// Feeds one event. `now_ms` stamps events that carry no timestamp.
    ///
    /// Returns the updated display series, or `None` when the event carried
    /// no usable tick and nothing changed.
    pub fn apply(&mut self, event: &TickEvent, now_ms: i64) -> Option<Vec<Candle>> {
        let outcome = self.apply_tick(event, now_ms)?;
        if let Some(closed) = outcome.closed {
            debug!(symbol = %self.symbol, time = closed.candle.time, appended = closed.appended, "candle closed");
        }
        Some(self.display())
    }

    /// Like [`apply`](Self::apply) but returns what the aggregator did.
    pub fn apply_tick(&mut self, event: &TickEvent, now_ms: i64) -> Option<TickOutcome> {
        let tick = event.tick.as_ref()?;
        let outcome = self.aggregator.on_tick(tick, event.arrival_ms(now_ms))?;
        if self.state == FeedStatus::Waiting {
            info!(symbol = %self.symbol, "first tick received");
            self.state = FeedStatus::Live;
        }
        if outcome.appended() {
            self.persist();
        }
        Some(outcome)
    }

    /// Selects another instrument.
    ///
    /// The in-progress candle is discarded, not closed. Selecting the active
    /// instrument reloads its history. A blank symbol is ignored.
    pub fn switch_instrument(&mut self, symbol: impl Into<String>) {
        let raw = symbol.into();
        let Some(symbol) = normalize_symbol(&raw) else {
            warn!(symbol = %raw, "ignoring blank instrument");
            return;
        };
        if let Some(cur) = self.aggregator.current() {
            debug!(symbol = %self.symbol, time = cur.time, "discarding open candle");
        }
        info!(from = %self.symbol, to = %symbol, "switching instrument");
        self.symbol = symbol;
        self.state = FeedStatus::Waiting;
        let series = self.load_series();
        self.aggregator.reset(series);
    }

    /// Forgets every candle of the active instrument and removes its stored key.
    pub fn clear_history(&mut self) {
        self.aggregator.clear();
        let key = storage_key(&self.symbol);
        match self.store.remove(&key) {
            Ok(()) => info!(symbol = %self.symbol, "history cleared"),
            Err(e) => warn!(symbol = %self.symbol, error = %e, "failed to remove stored history"),
        }
    }

    /// Closed candles plus the in-progress one, ordered and unique.
    pub fn display(&self) -> Vec<Candle> {
        self.aggregator.display()
    }

    /// Current status.
    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            symbol: self.symbol.clone(),
            state: self.state,
            closed_candles: self.aggregator.series().len(),
            current: self.aggregator.current().copied(),
        }
    }

    /// Active instrument.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Bucket width.
    pub fn interval(&self) -> TimeFrame {
        self.interval
    }

    /// Closed candles.
    pub fn series(&self) -> &CandleSeries {
        self.aggregator.series()
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The backing store, mutably.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Ends the session, handing back the store.
    pub fn into_store(self) -> S {
        self.store
    }
}
