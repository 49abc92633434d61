//! Chart configuration: parsing, normalization, and loading.
//!
//! A TOML file names the candle interval, the SQLite database, the instrument
//! list and the tick feed:
//!
//! ```toml
//! interval = "1m"
//! database_url = "candles.db"
//! default_symbol = "HBL"
//! symbols = ["HBL", "UBL", "MCB", "HUBC", "FFC"]
//!
//! [feed]
//! kind = "psx"
//! market = "REG"
//! poll_interval_ms = 1000
//! ```
//!
//! Every field is optional. Normalization upper-cases and trims symbols,
//! de-duplicates them preserving order, and makes sure the default symbol is
//! in the list.
//!
//! Entrypoints:
//! - Parse + normalize from a TOML string: [`load_config_str`]
//! - Parse + normalize from a file path: [`load_config_path`]
//! - Environment overrides: [`ChartConfig::with_env_overrides`]

use std::{mem, path::PathBuf};

use anyhow::{Context, bail};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use shared_utils::env::get_env_var_or;
use tick_feed::models::{
    symbol::{FEATURED_SYMBOLS, normalize_symbol},
    timeframe::TimeFrame,
};

/// Env var overriding [`ChartConfig::database_url`].
pub const DATABASE_URL_ENV: &str = "CANDLE_SYNC_DATABASE_URL";
/// Env var overriding [`FeedCfg::base_url`].
pub const PSX_API_BASE_ENV: &str = "PSX_API_BASE";

/// Top-level chart configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChartConfig {
    /// Candle width, e.g. "1m" or "5m".
    #[serde(default)]
    pub interval: TimeFrame,
    /// SQLite path or URL; ":memory:" keeps history for the process lifetime only.
    #[serde(default = "default_database_url")]
    pub database_url: String,
    /// Instrument selected at start.
    #[serde(default = "default_symbol")]
    pub default_symbol: String,
    /// Instruments offered for selection.
    #[serde(default = "featured_symbols")]
    pub symbols: Vec<String>,
    /// Tick source.
    #[serde(default)]
    pub feed: FeedCfg,
}

/// Which tick source to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    /// Poll the PSX terminal REST API.
    #[default]
    Psx,
    /// Replay a JSON-lines capture.
    Replay,
}

/// Tick source configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FeedCfg {
    /// Source kind.
    #[serde(default)]
    pub kind: FeedKind,
    /// API base URL; falls back to `PSX_API_BASE` and then the public endpoint.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Market segment polled (e.g. "REG").
    #[serde(default = "default_market")]
    pub market: String,
    /// Delay between polls, milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Capture file for the replay feed.
    #[serde(default)]
    pub replay_path: Option<PathBuf>,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            interval: TimeFrame::default(),
            database_url: default_database_url(),
            default_symbol: default_symbol(),
            symbols: featured_symbols(),
            feed: FeedCfg::default(),
        }
    }
}

impl Default for FeedCfg {
    fn default() -> Self {
        Self {
            kind: FeedKind::default(),
            base_url: None,
            market: default_market(),
            poll_interval_ms: default_poll_interval_ms(),
            replay_path: None,
        }
    }
}

fn default_database_url() -> String {
    "candles.db".to_string()
}

fn default_symbol() -> String {
    FEATURED_SYMBOLS[0].to_string()
}

fn featured_symbols() -> Vec<String> {
    FEATURED_SYMBOLS.iter().map(|s| s.to_string()).collect()
}

fn default_market() -> String {
    "REG".to_string()
}

fn default_poll_interval_ms() -> u64 {
    1_000
}

impl ChartConfig {
    /// Applies `CANDLE_SYNC_DATABASE_URL` and `PSX_API_BASE` when set.
    pub fn with_env_overrides(mut self) -> Self {
        self.database_url = get_env_var_or(DATABASE_URL_ENV, &self.database_url);
        let base = get_env_var_or(PSX_API_BASE_ENV, "");
        if !base.is_empty() {
            self.feed.base_url = Some(base);
        }
        self
    }
}

/// Summary of changes performed during normalization.
#[derive(Debug, Default)]
pub struct NormalizationReport {
    /// Symbols whose spelling changed when trimming/upper-casing.
    pub symbols_renamed: usize,
    /// Duplicate symbols removed.
    pub symbols_deduped: usize,
    /// Whether the default symbol had to be added to the list.
    pub default_symbol_inserted: bool,
}

/// Normalize a config in place.
///
/// What normalization does:
/// - Trim + upper-case `default_symbol` and every entry of `symbols`
/// - Deduplicate `symbols`, preserving the first occurrence order
/// - Prepend `default_symbol` when the list does not contain it
/// - Trim + upper-case `feed.market`, trim `database_url`
///
/// Errors:
/// - Empty default symbol, symbol entry, market or database URL after trimming
/// - Zero `feed.poll_interval_ms`
/// - `kind = "replay"` without `replay_path`
pub fn normalize_config(cfg: &mut ChartConfig) -> anyhow::Result<NormalizationReport> {
    let mut report = NormalizationReport::default();

    let Some(default_symbol) = normalize_symbol(&cfg.default_symbol) else {
        bail!("default_symbol cannot be empty after trimming");
    };
    cfg.default_symbol = default_symbol;

    let before_len = cfg.symbols.len();
    let mut symbols: IndexSet<String> = IndexSet::with_capacity(before_len + 1);
    for raw in mem::take(&mut cfg.symbols) {
        let Some(sym) = normalize_symbol(&raw) else {
            bail!("symbols entry cannot be empty after trimming");
        };
        if sym != raw {
            report.symbols_renamed += 1;
        }
        symbols.insert(sym);
    }
    report.symbols_deduped = before_len.saturating_sub(symbols.len());

    if !symbols.contains(&cfg.default_symbol) {
        symbols.shift_insert(0, cfg.default_symbol.clone());
        report.default_symbol_inserted = true;
    }
    cfg.symbols = symbols.into_iter().collect();

    cfg.database_url = cfg.database_url.trim().to_string();
    if cfg.database_url.is_empty() {
        bail!("database_url cannot be empty after trimming");
    }

    let feed = &mut cfg.feed;
    feed.market = feed.market.trim().to_uppercase();
    if feed.market.is_empty() {
        bail!("feed.market cannot be empty after trimming");
    }
    if feed.poll_interval_ms == 0 {
        bail!("feed.poll_interval_ms must be greater than zero");
    }
    feed.base_url = feed
        .base_url
        .take()
        .map(|b| b.trim().to_string())
        .filter(|b| !b.is_empty());
    if feed.kind == FeedKind::Replay && feed.replay_path.is_none() {
        bail!("feed.replay_path is required when feed.kind = \"replay\"");
    }

    Ok(report)
}

/// Parse and normalize a config from a TOML string.
///
/// Errors:
/// - TOML parse failures, including an unparsable `interval`
/// - Normalization errors (see [`normalize_config`])
pub fn load_config_str(toml_str: &str) -> anyhow::Result<ChartConfig> {
    let mut cfg: ChartConfig = toml::from_str(toml_str).context("failed to parse chart config TOML")?;
    let report = normalize_config(&mut cfg).context("normalize_config failed")?;
    tracing::debug!(?report, "config normalized");
    Ok(cfg)
}

/// Read a config TOML file from disk, parse, and normalize it.
pub fn load_config_path(path: impl AsRef<std::path::Path>) -> anyhow::Result<ChartConfig> {
    let text = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("read config file {}", path.as_ref().display()))?;
    load_config_str(&text)
}
