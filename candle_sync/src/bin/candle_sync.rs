use std::{io::BufRead, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use candle_sync::{
    config::{ChartConfig, FeedKind, load_config_path},
    live::{ChartCommand, LiveChart},
    session::ChartSession,
    sink::JsonLinesSink,
    store::{CandleStore, sqlite::SqliteCandleStore, storage_key},
};
use clap::{Args, Parser, Subcommand};
use tick_feed::{
    models::{
        symbol::{FEATURED_SYMBOLS, normalize_symbol},
        timeframe::TimeFrame,
    },
    providers::{TickFeed, psx_rest::provider::PsxTickFeed, replay::ReplayFeed},
};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about = "Candle Sync CLI")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Aggregate live ticks from the configured feed, one JSON line per update.
    Run {
        #[arg(long, value_name = "FILE")]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Replay a JSON-lines tick capture to completion.
    Replay {
        #[arg(long, value_name = "FILE")]
        file: PathBuf,
        #[arg(long)]
        symbol: String,
        #[arg(long, default_value = "1m")]
        interval: TimeFrame,
        #[command(flatten)]
        db: DbArgs,
    },
    /// Print the stored series of a symbol.
    Show {
        #[arg(long)]
        symbol: String,
        #[command(flatten)]
        db: DbArgs,
    },
    /// Remove the stored series of a symbol.
    Clear {
        #[arg(long)]
        symbol: String,
        #[command(flatten)]
        db: DbArgs,
    },
    /// List the featured symbols.
    Symbols,
}

#[derive(Args)]
struct DbArgs {
    /// SQLite path; defaults to CANDLE_SYNC_DATABASE_URL, then candles.db.
    #[arg(long, value_name = "URL")]
    db: Option<String>,
}

impl DbArgs {
    fn url(self) -> String {
        self.db
            .unwrap_or_else(|| ChartConfig::default().with_env_overrides().database_url)
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("candle_sync=info,tick_feed=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn symbol_arg(raw: &str) -> Result<String> {
    normalize_symbol(raw).context("symbol must not be empty")
}

fn open_store(url: &str) -> Result<SqliteCandleStore> {
    SqliteCandleStore::open(url).with_context(|| format!("open candle store {url}"))
}

fn build_feed(cfg: &ChartConfig) -> Result<Box<dyn TickFeed>> {
    match cfg.feed.kind {
        FeedKind::Psx => {
            let feed = match cfg.feed.base_url.as_deref() {
                Some(base) => PsxTickFeed::with_base_url(base)?,
                None => PsxTickFeed::new()?,
            };
            let feed = feed
                .with_market(&cfg.feed.market)
                .with_poll_interval(Duration::from_millis(cfg.feed.poll_interval_ms))?;
            Ok(Box::new(feed))
        }
        FeedKind::Replay => {
            let path = cfg
                .feed
                .replay_path
                .clone()
                .context("feed.replay_path is not set")?;
            Ok(Box::new(
                ReplayFeed::new(path).with_pace(Duration::from_millis(cfg.feed.poll_interval_ms)),
            ))
        }
    }
}

/// Reads `switch SYMBOL`, `clear` and `quit` lines from stdin; Ctrl-C also quits.
///
/// stdin is read on a plain thread so a pending read never holds up exit.
fn spawn_controls(tx: mpsc::Sender<ChartCommand>) {
    let ctrl_c = tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = ctrl_c.send(ChartCommand::Shutdown).await;
        }
    });
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            let mut parts = line.split_whitespace();
            let cmd = match (parts.next(), parts.next()) {
                (Some("switch"), Some(sym)) => ChartCommand::SwitchInstrument(sym.to_string()),
                (Some("clear"), None) => ChartCommand::ClearHistory,
                (Some("quit"), None) => ChartCommand::Shutdown,
                (None, _) => continue,
                _ => {
                    warn!(%line, "unknown command (expected: switch SYMBOL | clear | quit)");
                    continue;
                }
            };
            if tx.blocking_send(cmd).is_err() {
                break;
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.cmd {
        Cmd::Run { config, symbol } => {
            let cfg = load_config_path(&config)?.with_env_overrides();
            let symbol = match symbol {
                Some(s) => symbol_arg(&s)?,
                None => cfg.default_symbol.clone(),
            };
            let feed = build_feed(&cfg)?;
            let store = open_store(&cfg.database_url)?;
            let session = ChartSession::open(symbol, cfg.interval, store);

            let (tx, rx) = mpsc::channel(16);
            spawn_controls(tx);
            let chart = LiveChart::new(feed, session, JsonLinesSink::new(std::io::stdout()));
            let session = chart.run(rx).await?;
            info!(status = ?session.status(), "stopped");
        }
        Cmd::Replay {
            file,
            symbol,
            interval,
            db,
        } => {
            let symbol = symbol_arg(&symbol)?;
            let store = open_store(&db.url())?;
            let session = ChartSession::open(symbol, interval, store);

            let (_tx, rx) = mpsc::channel(1);
            let chart = LiveChart::new(
                ReplayFeed::new(file),
                session,
                JsonLinesSink::new(std::io::stdout()),
            );
            let session = chart.run(rx).await?;
            info!(closed = session.series().len(), "replay complete");
        }
        Cmd::Show { symbol, db } => {
            let symbol = symbol_arg(&symbol)?;
            let mut store = open_store(&db.url())?;
            let series = store.get(&storage_key(&symbol))?.unwrap_or_default();
            println!("{}", serde_json::to_string_pretty(&series)?);
        }
        Cmd::Clear { symbol, db } => {
            let symbol = symbol_arg(&symbol)?;
            let mut store = open_store(&db.url())?;
            store.remove(&storage_key(&symbol))?;
            info!(%symbol, "stored history removed");
        }
        Cmd::Symbols => {
            for s in FEATURED_SYMBOLS {
                println!("{s}");
            }
        }
    }

    Ok(())
}
