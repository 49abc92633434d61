//! Drives a [`ChartSession`] from a live [`TickFeed`].

use tick_feed::{
    models::{
        symbol::normalize_symbol,
        tick::{TickEvent, now_millis},
    },
    providers::{FeedError, Subscription, TickFeed},
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{session::ChartSession, sink::CandleSink, snapshot::DisplaySnapshot, store::CandleStore};

/// Control messages accepted by [`LiveChart::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartCommand {
    /// Select another instrument.
    SwitchInstrument(String),
    /// Forget the active instrument's history.
    ClearHistory,
    /// Stop the runner.
    Shutdown,
}

/// A session wired to a feed, a sink and a shared snapshot.
pub struct LiveChart<F, S, K> {
    feed: F,
    session: ChartSession<S>,
    sink: K,
    snapshot: DisplaySnapshot,
}

impl<F, S, K> LiveChart<F, S, K>
where
    F: TickFeed,
    S: CandleStore,
    K: CandleSink,
{
    /// Wires `session` to `feed` and `sink`.
    pub fn new(feed: F, session: ChartSession<S>, sink: K) -> Self {
        Self {
            feed,
            session,
            sink,
            snapshot: DisplaySnapshot::new(),
        }
    }

    /// Handle on the series published after every update.
    pub fn snapshot(&self) -> DisplaySnapshot {
        self.snapshot.clone()
    }

    fn publish(&mut self) {
        let display = self.session.display();
        if let Err(e) = self.sink.render(self.session.symbol(), &display) {
            warn!(symbol = %self.session.symbol(), error = %e, "render failed");
        }
        self.snapshot.publish(display);
    }

    /// Runs until the feed ends or [`ChartCommand::Shutdown`] arrives.
    ///
    /// Returns the session so callers can inspect or reuse it. Fails only when
    /// the first subscription fails. A failed resubscribe after a switch is
    /// logged, and the runner then serves commands alone until a later switch
    /// subscribes again.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<ChartCommand>,
    ) -> Result<ChartSession<S>, FeedError> {
        self.publish();
        let symbol = self.session.symbol().to_string();
        let mut sub: Option<Subscription> = Some(self.feed.subscribe(&symbol).await?);
        let mut commands_open = true;

        loop {
            tokio::select! {
                event = next_event(&mut sub), if sub.is_some() => {
                    let Some(event) = event else {
                        info!(symbol = %self.session.symbol(), "feed ended");
                        break;
                    };
                    if self.session.apply(&event, now_millis()).is_some() {
                        self.publish();
                    }
                }
                cmd = commands.recv(), if commands_open => match cmd {
                    Some(ChartCommand::SwitchInstrument(raw)) => {
                        let Some(symbol) = normalize_symbol(&raw) else {
                            warn!(symbol = %raw, "ignoring blank instrument");
                            continue;
                        };
                        if let Some(mut old) = sub.take() {
                            old.close();
                        }
                        self.session.switch_instrument(symbol.clone());
                        self.publish();
                        match self.feed.subscribe(&symbol).await {
                            Ok(next) => sub = Some(next),
                            Err(e) => warn!(%symbol, error = %e, "subscribe failed, serving commands only"),
                        }
                    }
                    Some(ChartCommand::ClearHistory) => {
                        self.session.clear_history();
                        self.publish();
                    }
                    Some(ChartCommand::Shutdown) => {
                        info!("shutdown requested");
                        break;
                    }
                    None => {
                        debug!("command channel closed");
                        commands_open = false;
                    }
                },
                else => {
                    debug!(symbol = %self.session.symbol(), "no feed and no commands left");
                    break;
                }
            }
        }

        if let Some(mut sub) = sub {
            sub.close();
        }
        Ok(self.session)
    }
}

async fn next_event(sub: &mut Option<Subscription>) -> Option<TickEvent> {
    match sub {
        Some(sub) => sub.recv().await,
        None => None,
    }
}
