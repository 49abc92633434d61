//! Live tick-to-candle aggregation with durable history.
//!
//! The core is [`aggregator::CandleAggregator`], a pure state machine that
//! buckets ticks into fixed-interval OHLC candles, and
//! [`aggregator::merge_for_display`], which produces the ordered, duplicate-free
//! series a chart renders. [`session::ChartSession`] adds history loading and
//! persistence through a [`store::CandleStore`]; [`live::LiveChart`] drives a
//! session from a [`tick_feed::providers::TickFeed`].

#![deny(missing_docs)]

pub mod aggregator;
pub mod bucket;
pub mod candle;
pub mod config;
pub mod db;
pub mod live;
/// Diesel table definitions.
#[allow(missing_docs)]
pub mod schema;
pub mod series;
pub mod session;
pub mod sink;
pub mod snapshot;
pub mod store;
