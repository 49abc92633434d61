//! Push-feed abstraction for live price ticks.
//!
//! A [`TickFeed`] hands out one [`Subscription`] per instrument. Each
//! subscription is a bounded channel of [`TickEvent`]s; feeds that need a
//! background producer (polling, file replay) run it as a tokio task owned by
//! the subscription, so closing or dropping the subscription stops it.
//!
//! # Example
//!
//! ```rust
//! use tick_feed::models::tick::{TickEvent, TickQuote};
//! use tick_feed::providers::{TickFeed, channel::ChannelFeed};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let feed = ChannelFeed::new();
//! let mut sub = feed.subscribe("HBL").await.unwrap();
//! feed.publish("HBL", TickEvent::new(TickQuote::new(10.0, 11.0, 9.0, 10.5)));
//! let event = sub.recv().await.unwrap();
//! assert_eq!(event.tick.unwrap().close(), Some(10.5));
//! # }
//! ```

pub mod channel;
pub mod psx_rest;
pub mod replay;

use std::path::PathBuf;

use async_trait::async_trait;
use snafu::{Backtrace, Snafu};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::debug;

use crate::models::tick::TickEvent;

/// Buffer size of every subscription channel.
pub const CHANNEL_CAPACITY: usize = 256;

/// A source of live ticks, subscribed to one instrument at a time.
///
/// Implementations are object safe, so a host can pick a feed at runtime and
/// hold it as `Box<dyn TickFeed>`.
#[async_trait]
pub trait TickFeed: Send + Sync {
    /// Starts delivering ticks for `symbol`.
    async fn subscribe(&self, symbol: &str) -> Result<Subscription, FeedError>;
}

#[async_trait]
impl<T: TickFeed + ?Sized> TickFeed for Box<T> {
    async fn subscribe(&self, symbol: &str) -> Result<Subscription, FeedError> {
        (**self).subscribe(symbol).await
    }
}

/// An active per-instrument subscription.
#[derive(Debug)]
pub struct Subscription {
    symbol: String,
    rx: mpsc::Receiver<TickEvent>,
    producer: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Wraps a receiver fed by someone else (e.g. an in-process hub).
    pub fn new(symbol: impl Into<String>, rx: mpsc::Receiver<TickEvent>) -> Self {
        Self {
            symbol: symbol.into(),
            rx,
            producer: None,
        }
    }

    /// Wraps a receiver fed by a task this subscription owns.
    pub fn with_producer(
        symbol: impl Into<String>,
        rx: mpsc::Receiver<TickEvent>,
        producer: JoinHandle<()>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            rx,
            producer: Some(producer),
        }
    }

    /// Instrument this subscription delivers, as the feed normalized it.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Next event, or `None` once the feed has ended or the subscription was closed.
    pub async fn recv(&mut self) -> Option<TickEvent> {
        self.rx.recv().await
    }

    /// Stops delivery. Events already buffered are still returned by [`recv`](Self::recv).
    pub fn close(&mut self) {
        self.rx.close();
        if let Some(handle) = self.producer.take() {
            handle.abort();
        }
        debug!(symbol = %self.symbol, "subscription closed");
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(handle) = self.producer.take() {
            handle.abort();
        }
    }
}

/// Errors that can occur during the creation of a feed instance.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum FeedInitError {
    /// failed to init reqwest client
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// Base URL is not an absolute http(s) URL.
    #[snafu(display("Invalid base URL: {url:?}"))]
    InvalidBaseUrl { url: String, backtrace: Backtrace },

    /// Poll interval must be non-zero.
    #[snafu(display("Poll interval must be greater than zero"))]
    InvalidPollInterval { backtrace: Backtrace },
}

/// Errors that can occur within a `TickFeed` implementation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum FeedError {
    /// An error during an API request (e.g., network failure, timeout).
    #[snafu(display("API request failed: {source}"))]
    Reqwest {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The provider answered but reported a failure.
    #[snafu(display("API error: {message}"))]
    Api {
        message: String,
        backtrace: Backtrace,
    },

    /// A capture file could not be read.
    #[snafu(display("Failed to read {}: {source}", path.display()))]
    Io {
        path: PathBuf,
        source: std::io::Error,
        backtrace: Backtrace,
    },

    /// A payload could not be decoded.
    #[snafu(display("Failed to decode tick payload: {source}"))]
    Decode {
        source: serde_json::Error,
        backtrace: Backtrace,
    },

    /// The subscription request was invalid for this feed.
    #[snafu(display("Invalid subscription: {message}"))]
    Validation {
        message: String,
        backtrace: Backtrace,
    },

    /// An error during feed configuration or initialization.
    #[snafu(display("Feed initialization error: {source}"))]
    Init {
        #[snafu(backtrace)]
        source: FeedInitError,
    },
}

impl From<FeedInitError> for FeedError {
    fn from(source: FeedInitError) -> Self {
        FeedError::Init { source }
    }
}
