use std::time::Duration;

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{Client, Url};
use shared_utils::env::get_env_var_or;
use snafu::{OptionExt, ResultExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{
    models::{
        symbol::normalize_symbol,
        tick::{TickEvent, TickQuote, now_millis},
    },
    providers::{
        ApiSnafu, CHANNEL_CAPACITY, ClientBuildSnafu, FeedError, FeedInitError,
        InvalidBaseUrlSnafu, InvalidPollIntervalSnafu, ReqwestSnafu, Subscription, TickFeed,
        ValidationSnafu,
        psx_rest::response::PsxTickResponse,
    },
};

pub const DEFAULT_BASE_URL: &str = "https://psxterminal.com";
pub const DEFAULT_MARKET: &str = "REG";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Polls the latest quote of one symbol and pushes it as a tick.
///
/// Each poll is stamped with the local receive time. A failed poll is logged
/// and the next one proceeds on schedule.
#[derive(Debug, Clone)]
pub struct PsxTickFeed {
    client: Client,
    base_url: Url,
    market: String,
    quota: Quota,
}

impl PsxTickFeed {
    /// Creates a feed against `PSX_API_BASE` (or the public endpoint when unset),
    /// market `REG`, one poll per second.
    pub fn new() -> Result<Self, FeedInitError> {
        let base = get_env_var_or("PSX_API_BASE", DEFAULT_BASE_URL);
        Self::with_base_url(&base)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self, FeedInitError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context(ClientBuildSnafu)?;
        Ok(Self {
            client,
            base_url: parse_base_url(base_url)?,
            market: DEFAULT_MARKET.to_string(),
            quota: quota_for(DEFAULT_POLL_INTERVAL)?,
        })
    }

    pub fn with_market(mut self, market: &str) -> Self {
        let market = market.trim();
        if !market.is_empty() {
            self.market = market.to_uppercase();
        }
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Result<Self, FeedInitError> {
        self.quota = quota_for(interval)?;
        Ok(self)
    }

    pub fn market(&self) -> &str {
        &self.market
    }

    /// Endpoint of the latest quote for `symbol`.
    pub fn tick_url(&self, symbol: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["api", "ticks", self.market.as_str(), symbol]);
        }
        url
    }

    /// Fetches the latest quote once.
    ///
    /// `Ok(None)` when the provider answered with `success: false`.
    pub async fn fetch_tick(&self, symbol: &str) -> Result<Option<TickQuote>, FeedError> {
        fetch_tick(&self.client, self.tick_url(symbol)).await
    }
}

fn parse_base_url(raw: &str) -> Result<Url, FeedInitError> {
    let trimmed = raw.trim();
    match Url::parse(trimmed) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && !url.cannot_be_a_base() => Ok(url),
        _ => InvalidBaseUrlSnafu { url: trimmed }.fail(),
    }
}

fn quota_for(interval: Duration) -> Result<Quota, FeedInitError> {
    Quota::with_period(interval).context(InvalidPollIntervalSnafu)
}

async fn fetch_tick(client: &Client, url: Url) -> Result<Option<TickQuote>, FeedError> {
    let response = client.get(url).send().await.context(ReqwestSnafu)?;

    if !response.status().is_success() {
        let status = response.status();
        let error_msg = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown API error".to_string());
        return ApiSnafu {
            message: format!("{status}: {error_msg}"),
        }
        .fail();
    }

    let body = response.json::<PsxTickResponse>().await.context(ReqwestSnafu)?;
    if !body.success {
        debug!(message = ?body.message, "provider reported no tick");
    }
    Ok(body.into_quote())
}

#[async_trait]
impl TickFeed for PsxTickFeed {
    async fn subscribe(&self, symbol: &str) -> Result<Subscription, FeedError> {
        let symbol = normalize_symbol(symbol).context(ValidationSnafu {
            message: "symbol must not be empty",
        })?;
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let client = self.client.clone();
        let url = self.tick_url(&symbol);
        let limiter: DefaultDirectRateLimiter = RateLimiter::direct(self.quota);
        let polled = symbol.clone();

        info!(symbol = %symbol, %url, "polling PSX ticks");
        let producer = tokio::spawn(async move {
            loop {
                limiter.until_ready().await;
                match fetch_tick(&client, url.clone()).await {
                    Ok(Some(quote)) => {
                        let event = TickEvent::new(quote)
                            .with_symbol(polled.clone())
                            .with_timestamp(now_millis());
                        if tx.send(event).await.is_err() {
                            debug!(symbol = %polled, "poll consumer gone");
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => warn!(symbol = %polled, error = %e, "tick poll failed"),
                }
                if tx.is_closed() {
                    break;
                }
            }
        });

        Ok(Subscription::with_producer(symbol, rx, producer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_tick_url() {
        let feed = PsxTickFeed::with_base_url("https://psxterminal.com/").unwrap();
        assert_eq!(
            feed.tick_url("HBL").as_str(),
            "https://psxterminal.com/api/ticks/REG/HBL"
        );

        let feed = PsxTickFeed::with_base_url("http://localhost:8080/proxy")
            .unwrap()
            .with_market("fut");
        assert_eq!(feed.market(), "FUT");
        assert_eq!(
            feed.tick_url("HUBC").as_str(),
            "http://localhost:8080/proxy/api/ticks/FUT/HUBC"
        );
    }

    #[test]
    fn rejects_bad_configuration() {
        assert!(matches!(
            PsxTickFeed::with_base_url("not a url"),
            Err(FeedInitError::InvalidBaseUrl { .. })
        ));
        assert!(matches!(
            PsxTickFeed::with_base_url("ftp://example.com"),
            Err(FeedInitError::InvalidBaseUrl { .. })
        ));
        let feed = PsxTickFeed::with_base_url(DEFAULT_BASE_URL).unwrap();
        assert!(matches!(
            feed.with_poll_interval(Duration::ZERO),
            Err(FeedInitError::InvalidPollInterval { .. })
        ));
    }
}
