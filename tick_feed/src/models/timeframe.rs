//! Bucket width for candle aggregation, expressed as `amount × unit`.
//!
//! A [`TimeFrame`] parses from the compact strings used in config files and on
//! the command line (`"30s"`, `"1m"`, `"15m"`, `"4h"`, `"1D"`) and converts to
//! a non-zero millisecond width for bucket math.

use std::{
    fmt,
    num::{NonZeroU32, NonZeroU64},
    str::FromStr,
};

use nonzero_ext::nonzero;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeFrameError {
    #[error("Invalid amount for {:?}: {}", unit, message)]
    InvalidAmount {
        unit: TimeFrameUnit,
        message: String,
    },

    #[error("Invalid input: {}", message)]
    InvalidInput { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeFrameUnit {
    Second,
    Minute,
    Hour,
    Day,
}

impl TimeFrameUnit {
    /// Width of one unit in milliseconds.
    pub fn millis(self) -> NonZeroU64 {
        match self {
            TimeFrameUnit::Second => nonzero!(1_000u64),
            TimeFrameUnit::Minute => nonzero!(60_000u64),
            TimeFrameUnit::Hour => nonzero!(3_600_000u64),
            TimeFrameUnit::Day => nonzero!(86_400_000u64),
        }
    }

    const fn suffix(self) -> &'static str {
        match self {
            TimeFrameUnit::Second => "s",
            TimeFrameUnit::Minute => "m",
            TimeFrameUnit::Hour => "h",
            TimeFrameUnit::Day => "D",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeFrame {
    amount: NonZeroU32,
    unit: TimeFrameUnit,
}

impl TimeFrame {
    /// One-minute candles, the chart default.
    pub const ONE_MINUTE: TimeFrame = TimeFrame {
        amount: NonZeroU32::MIN,
        unit: TimeFrameUnit::Minute,
    };

    pub fn new(amount: u32, unit: TimeFrameUnit) -> Result<Self, TimeFrameError> {
        Self::validate(amount, unit)?;
        let amount = NonZeroU32::new(amount).ok_or_else(|| TimeFrameError::InvalidAmount {
            unit,
            message: "amount must be greater than zero".into(),
        })?;
        Ok(Self { amount, unit })
    }

    fn validate(amount: u32, unit: TimeFrameUnit) -> Result<(), TimeFrameError> {
        match unit {
            TimeFrameUnit::Second | TimeFrameUnit::Minute if !(1..=59).contains(&amount) => {
                Err(TimeFrameError::InvalidAmount {
                    unit,
                    message: "Second or Minute units can only be used with amounts between 1-59."
                        .into(),
                })
            }
            TimeFrameUnit::Hour if !(1..=23).contains(&amount) => {
                Err(TimeFrameError::InvalidAmount {
                    unit,
                    message: "Hour units can only be used with amounts 1-23".into(),
                })
            }
            TimeFrameUnit::Day if amount != 1 => Err(TimeFrameError::InvalidAmount {
                unit,
                message: "Day units can only be used with amount 1".into(),
            }),
            _ => Ok(()),
        }
    }

    pub const fn amount(&self) -> u32 {
        self.amount.get()
    }

    pub const fn unit(&self) -> TimeFrameUnit {
        self.unit
    }

    /// Bucket width in milliseconds.
    pub fn as_millis(&self) -> NonZeroU64 {
        self.unit.millis().saturating_mul(NonZeroU64::from(self.amount))
    }
}

impl Default for TimeFrame {
    fn default() -> Self {
        Self::ONE_MINUTE
    }
}

impl fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.unit.suffix())
    }
}

impl FromStr for TimeFrame {
    type Err = TimeFrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let Some(last) = s.chars().last() else {
            return Err(TimeFrameError::InvalidInput {
                message: "empty timeframe".into(),
            });
        };
        let (digits, unit) = s.split_at(s.len() - last.len_utf8());
        let unit = match unit {
            "s" => TimeFrameUnit::Second,
            "m" => TimeFrameUnit::Minute,
            "h" | "H" => TimeFrameUnit::Hour,
            "D" | "d" => TimeFrameUnit::Day,
            _ => {
                return Err(TimeFrameError::InvalidInput {
                    message: format!("Invalid timeframe unit: {unit}"),
                });
            }
        };
        let amount: u32 = digits.parse().map_err(|_| TimeFrameError::InvalidInput {
            message: format!("Invalid timeframe amount: {digits:?}"),
        })?;
        TimeFrame::new(amount, unit)
    }
}

impl TryFrom<String> for TimeFrame {
    type Error = TimeFrameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeFrame> for String {
    fn from(tf: TimeFrame) -> Self {
        tf.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_compact_strings() {
        let tf: TimeFrame = "5m".parse().unwrap();
        assert_eq!(tf.amount(), 5);
        assert_eq!(tf.unit(), TimeFrameUnit::Minute);
        assert_eq!(tf.as_millis().get(), 300_000);

        assert_eq!("30s".parse::<TimeFrame>().unwrap().as_millis().get(), 30_000);
        assert_eq!("4h".parse::<TimeFrame>().unwrap().as_millis().get(), 14_400_000);
        assert_eq!("1D".parse::<TimeFrame>().unwrap().as_millis().get(), 86_400_000);
    }

    #[test]
    fn default_is_one_minute() {
        assert_eq!(TimeFrame::default().as_millis().get(), 60_000);
        assert_eq!(TimeFrame::default().to_string(), "1m");
    }

    #[test]
    fn display_round_trips_through_parse() {
        for s in ["1s", "15m", "23h", "1D"] {
            assert_eq!(s.parse::<TimeFrame>().unwrap().to_string(), s);
        }
    }

    #[test]
    fn rejects_out_of_range_amounts() {
        assert!(TimeFrame::new(0, TimeFrameUnit::Minute).is_err());
        assert!(TimeFrame::new(60, TimeFrameUnit::Minute).is_err());
        assert!(TimeFrame::new(24, TimeFrameUnit::Hour).is_err());
        assert!(TimeFrame::new(2, TimeFrameUnit::Day).is_err());

        match TimeFrame::new(60, TimeFrameUnit::Second) {
            Err(TimeFrameError::InvalidAmount { unit, message }) => {
                assert_eq!(unit, TimeFrameUnit::Second);
                assert!(message.contains("Second or Minute"));
            }
            other => panic!("expected InvalidAmount, got {other:?}"),
        }
    }

    #[test]
    fn rejects_garbage() {
        assert!("".parse::<TimeFrame>().is_err());
        assert!("m".parse::<TimeFrame>().is_err());
        assert!("5x".parse::<TimeFrame>().is_err());
        assert!("-1m".parse::<TimeFrame>().is_err());
    }

    #[test]
    fn serde_uses_the_compact_string() {
        let tf: TimeFrame = serde_json::from_str("\"15m\"").unwrap();
        assert_eq!(tf.as_millis().get(), 900_000);
        assert_eq!(serde_json::to_string(&tf).unwrap(), "\"15m\"");
        assert!(serde_json::from_str::<TimeFrame>("\"99m\"").is_err());
    }
}
