//! JSON-lines replay of a captured tick stream.
//!
//! Each non-blank line of the capture is one [`TickEvent`]. Lines carrying a
//! `symbol` are delivered only to subscribers of that symbol; lines without
//! one are delivered to every subscriber. Lines that fail to decode are
//! logged and skipped.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use async_trait::async_trait;
use snafu::{OptionExt, ResultExt};
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tracing::{debug, info, warn};

use crate::{
    models::{symbol::normalize_symbol, tick::TickEvent},
    providers::{CHANNEL_CAPACITY, FeedError, IoSnafu, Subscription, TickFeed, ValidationSnafu},
};

/// Feed that plays a JSON-lines capture file once per subscription.
#[derive(Debug, Clone)]
pub struct ReplayFeed {
    path: PathBuf,
    pace: Option<Duration>,
}

impl ReplayFeed {
    /// Replays `path` as fast as the consumer reads.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pace: None,
        }
    }

    /// Waits `pace` between delivered events.
    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = (!pace.is_zero()).then_some(pace);
        self
    }

    /// The capture file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn matches_symbol(event: &TickEvent, symbol: &str) -> bool {
    match event.symbol.as_deref() {
        None => true,
        Some(s) => s.trim().eq_ignore_ascii_case(symbol),
    }
}

#[async_trait]
impl TickFeed for ReplayFeed {
    async fn subscribe(&self, symbol: &str) -> Result<Subscription, FeedError> {
        let symbol = normalize_symbol(symbol).context(ValidationSnafu {
            message: "symbol must not be empty",
        })?;
        let file = File::open(&self.path).await.context(IoSnafu {
            path: self.path.clone(),
        })?;

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let path = self.path.clone();
        let pace = self.pace;
        let wanted = symbol.clone();

        let producer = tokio::spawn(async move {
            let mut lines = BufReader::new(file).lines();
            let mut line_no = 0usize;
            let mut sent = 0usize;
            loop {
                let line = match lines.next_line().await {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "replay read failed");
                        break;
                    }
                };
                line_no += 1;
                if line.trim().is_empty() {
                    continue;
                }
                let event: TickEvent = match serde_json::from_str(&line) {
                    Ok(ev) => ev,
                    Err(e) => {
                        warn!(path = %path.display(), line = line_no, error = %e, "skipping undecodable tick line");
                        continue;
                    }
                };
                if !matches_symbol(&event, &wanted) {
                    continue;
                }
                if tx.send(event).await.is_err() {
                    debug!(symbol = %wanted, "replay consumer gone");
                    return;
                }
                sent += 1;
                if let Some(pace) = pace {
                    tokio::time::sleep(pace).await;
                }
            }
            info!(symbol = %wanted, events = sent, "replay finished");
        });

        Ok(Subscription::with_producer(symbol, rx, producer))
    }
}
