//! Small helpers shared by the `tick_feed` and `candle_sync` crates.

pub mod env;
