//! Rendering collaborators.
//!
//! A [`CandleSink`] receives the full replacement series after every update,
//! the way a charting widget's `setData` does.

use std::io::Write;

use serde::Serialize;
use snafu::{Backtrace, ResultExt, Snafu};

use crate::candle::Candle;

/// Errors that can occur while rendering a series.
#[derive(Debug, Snafu)]
pub enum SinkError {
    /// The update could not be encoded.
    #[snafu(display("Failed to encode candles for {symbol}: {source}"))]
    Encode {
        /// Instrument being rendered.
        symbol: String,
        /// Underlying encoder error.
        source: serde_json::Error,
        /// Captured backtrace.
        backtrace: Backtrace,
    },

    /// The underlying writer failed.
    #[snafu(display("Failed to write candles: {source}"))]
    Write {
        /// Underlying I/O error.
        source: std::io::Error,
        /// Captured backtrace.
        backtrace: Backtrace,
    },
}

/// Receives every display update.
pub trait CandleSink {
    /// Renders `candles` as the complete series of `symbol`.
    fn render(&mut self, symbol: &str, candles: &[Candle]) -> Result<(), SinkError>;
}

impl<K: CandleSink + ?Sized> CandleSink for Box<K> {
    fn render(&mut self, symbol: &str, candles: &[Candle]) -> Result<(), SinkError> {
        (**self).render(symbol, candles)
    }
}

#[derive(Serialize)]
struct Frame<'a> {
    symbol: &'a str,
    candles: &'a [Candle],
}

/// Writes one `{"symbol", "candles"}` JSON object per update, newline terminated.
#[derive(Debug)]
pub struct JsonLinesSink<W> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    /// Wraps `writer`.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> CandleSink for JsonLinesSink<W> {
    fn render(&mut self, symbol: &str, candles: &[Candle]) -> Result<(), SinkError> {
        let line = serde_json::to_string(&Frame { symbol, candles })
            .context(EncodeSnafu { symbol })?;
        writeln!(self.writer, "{line}").context(WriteSnafu)?;
        self.writer.flush().context(WriteSnafu)
    }
}
