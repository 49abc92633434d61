//! Live price ticks for the candle chart.
//!
//! [`models`] holds the wire types (ticks, symbols, bucket widths) and
//! [`providers`] the push feeds that deliver them.

pub mod models;
pub mod providers;
