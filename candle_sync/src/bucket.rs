//! bucket.rs: fixed-width bucket mapping on the Unix epoch
//!
//! Tick timestamps are milliseconds since 1970-01-01T00:00:00Z. A bucket
//! starts at `floor(ts / width) * width`; the external candle time is that
//! start in whole seconds.

use std::num::NonZeroU64;

/// Milliseconds in one second.
pub const MILLIS_PER_SEC: i64 = 1_000;

fn width_ms(interval: NonZeroU64) -> i64 {
    i64::try_from(interval.get()).unwrap_or(i64::MAX)
}

/// Start of the bucket containing `ts_ms`, in milliseconds.
///
/// Uses floored division so timestamps before the epoch land in the bucket
/// that precedes them rather than the one after.
pub fn bucket_start_ms(ts_ms: i64, interval: NonZeroU64) -> i64 {
    let width = width_ms(interval);
    ts_ms.div_euclid(width).saturating_mul(width)
}

/// Start of the bucket containing `ts_ms`, in seconds since the epoch.
pub fn bucket_start_secs(ts_ms: i64, interval: NonZeroU64) -> i64 {
    bucket_start_ms(ts_ms, interval).div_euclid(MILLIS_PER_SEC)
}
