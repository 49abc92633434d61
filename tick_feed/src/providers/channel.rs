//! In-process tick hub.
//!
//! [`ChannelFeed`] is the feed a host uses when ticks already arrive through
//! some other transport (a websocket gateway, a test harness): the host calls
//! [`ChannelFeed::publish`] and every live subscriber of that symbol receives
//! the event.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use snafu::OptionExt;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use crate::{
    models::{symbol::normalize_symbol, tick::TickEvent},
    providers::{CHANNEL_CAPACITY, FeedError, Subscription, TickFeed, ValidationSnafu},
};

type Senders = HashMap<String, Vec<mpsc::Sender<TickEvent>>>;

/// Fan-out feed driven by [`publish`](Self::publish).
///
/// Clones share one subscriber table.
#[derive(Debug, Clone, Default)]
pub struct ChannelFeed {
    subscribers: Arc<Mutex<Senders>>,
}

impl ChannelFeed {
    /// A hub with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Senders> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Fans `event` out to every live subscriber of `symbol`.
    ///
    /// Returns the number of subscribers that accepted it. Closed subscribers
    /// are pruned; a subscriber whose buffer is full misses this event.
    pub fn publish(&self, symbol: &str, event: TickEvent) -> usize {
        let Some(symbol) = normalize_symbol(symbol) else {
            return 0;
        };
        let mut map = self.lock();
        let Some(senders) = map.get_mut(&symbol) else {
            return 0;
        };

        let mut delivered = 0;
        senders.retain(|tx| match tx.try_send(event.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                warn!(%symbol, "subscriber lagging, tick dropped");
                true
            }
            Err(TrySendError::Closed(_)) => false,
        });
        if senders.is_empty() {
            map.remove(&symbol);
            debug!(%symbol, "last subscriber gone");
        }
        delivered
    }

    /// Live subscribers of `symbol`.
    pub fn subscriber_count(&self, symbol: &str) -> usize {
        let Some(symbol) = normalize_symbol(symbol) else {
            return 0;
        };
        self.lock()
            .get(&symbol)
            .map_or(0, |senders| senders.iter().filter(|tx| !tx.is_closed()).count())
    }
}

#[async_trait]
impl TickFeed for ChannelFeed {
    async fn subscribe(&self, symbol: &str) -> Result<Subscription, FeedError> {
        let symbol = normalize_symbol(symbol).context(ValidationSnafu {
            message: "symbol must not be empty",
        })?;
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        self.lock().entry(symbol.clone()).or_default().push(tx);
        debug!(%symbol, "channel subscription opened");
        Ok(Subscription::new(symbol, rx))
    }
}
