//! Wire representation of a price tick.
//!
//! The push feed delivers events shaped like
//! `{ "timestamp": 1700000000000, "tick": { "o": 10.0, "h": 11.0, "l": 9.0, "c": 10.5 } }`.
//! Every price field is optional: upstream payloads are not guaranteed to be
//! complete, and consumers treat a missing field as "no information" rather
//! than as an error.

use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};

/// One OHLC price update as reported by the upstream provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TickQuote {
    /// Open.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub o: Option<f64>,
    /// High.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h: Option<f64>,
    /// Low.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub l: Option<f64>,
    /// Close (last traded).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub c: Option<f64>,
}

impl TickQuote {
    /// A fully populated quote.
    pub fn new(o: f64, h: f64, l: f64, c: f64) -> Self {
        Self {
            o: Some(o),
            h: Some(h),
            l: Some(l),
            c: Some(c),
        }
    }

    /// Opening price, if present and finite.
    pub fn open(&self) -> Option<f64> {
        finite(self.o)
    }

    /// High price, if present and finite.
    pub fn high(&self) -> Option<f64> {
        finite(self.h)
    }

    /// Low price, if present and finite.
    pub fn low(&self) -> Option<f64> {
        finite(self.l)
    }

    /// Close (last) price, if present and finite.
    pub fn close(&self) -> Option<f64> {
        finite(self.c)
    }

    /// `true` when the quote carries no usable price at all.
    pub fn is_empty(&self) -> bool {
        self.open().is_none() && self.high().is_none() && self.low().is_none() && self.close().is_none()
    }
}

fn finite(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite())
}

/// Accepts any JSON number, flooring fractional milliseconds. Non-finite is absent.
fn de_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    let raw = Option::<f64>::deserialize(deserializer)?;
    Ok(finite(raw).map(|ms| ms.floor() as i64))
}

/// A tick event as delivered by a [`TickFeed`](crate::providers::TickFeed) subscription.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickEvent {
    /// Instrument the event belongs to. Optional on the wire; replay captures use it
    /// to hold several instruments in one file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,

    /// Event time in milliseconds since the Unix epoch. Missing or zero means "now".
    #[serde(
        default,
        deserialize_with = "de_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<i64>,

    /// The price payload. Events without one carry no price information.
    #[serde(default)]
    pub tick: Option<TickQuote>,
}

impl TickEvent {
    /// An event for `tick` with no symbol or timestamp.
    pub fn new(tick: TickQuote) -> Self {
        Self {
            symbol: None,
            timestamp: None,
            tick: Some(tick),
        }
    }

    /// Sets the event time in milliseconds.
    pub fn with_timestamp(mut self, ts_ms: i64) -> Self {
        self.timestamp = Some(ts_ms);
        self
    }

    /// Tags the event with an instrument.
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    /// The event's own timestamp, or `received_ms` when the feed supplied none.
    ///
    /// A zero timestamp counts as none.
    pub fn arrival_ms(&self, received_ms: i64) -> i64 {
        self.timestamp.filter(|&ts| ts != 0).unwrap_or(received_ms)
    }
}

/// Wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
