//! Dipwatch - Token Journey Tracker and Retracement Signal Engine
//!
//! Tracks newly migrated tokens and scores buy-the-dip entry opportunities.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::Parser;
use tokio::sync::RwLock;
use tracing_subscriber::{fmt, EnvFilter};

use dipwatch::adapters::cli::{CliApp, Command, RunCmd, ScanCmd};
use dipwatch::adapters::market_data::{DexScreenerClient, DexScreenerConfig};
use dipwatch::application::{CycleOutcome, UpdateScheduler};
use dipwatch::config::{load_config, Config};
use dipwatch::domain::{Journey, JourneyStore, TokenCandidate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (endpoint overrides go here)
    dotenvy::dotenv().ok();

    let app = CliApp::parse();
    init_logging(app.verbose, app.debug);

    match app.command {
        Command::Run(cmd) => run_command(cmd).await,
        Command::Scan(cmd) => scan_command(cmd).await,
    }
}

fn init_logging(verbose: bool, debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::new("warn")
    };

    fmt().with_env_filter(filter).init();
}

/// Build the store, price client, and scheduler from a loaded config.
fn build_engine(config: &Config) -> Result<(Arc<RwLock<JourneyStore>>, UpdateScheduler)> {
    let client_config = DexScreenerConfig::from(&config.price_source);
    let client = DexScreenerClient::new(client_config)
        .context("Failed to create price source client")?;

    let store = Arc::new(RwLock::new(JourneyStore::new(
        config.tracker.max_history,
        Duration::seconds(config.tracker.min_snapshot_interval_secs as i64),
        Duration::minutes(config.tracker.max_tracked_age_minutes as i64),
    )));

    let scheduler = UpdateScheduler::new(
        store.clone(),
        Arc::new(client),
        Duration::seconds(config.tracker.min_cycle_interval_secs as i64),
        Duration::minutes(config.tracker.max_tracked_age_minutes as i64),
    );

    Ok((store, scheduler))
}

/// Turn the configured watchlist into tracking candidates. Watchlist tokens
/// are treated as freshly detected at process start, so they age out of
/// tracking on the same clock as discovered tokens would.
fn watchlist_candidates(config: &Config) -> Vec<TokenCandidate> {
    let detected_at = Utc::now();
    config
        .watchlist
        .iter()
        .map(|entry| TokenCandidate {
            address: entry.address.clone(),
            symbol: entry.symbol.clone(),
            detected_at,
            market_cap_hint: None,
        })
        .collect()
}

async fn run_command(cmd: RunCmd) -> Result<()> {
    let config = load_config(&cmd.config).context("Failed to load configuration")?;

    let candidates = watchlist_candidates(&config);
    if candidates.is_empty() {
        tracing::warn!("watchlist is empty, nothing to track");
    }

    let (store, scheduler) = build_engine(&config)?;

    let poll_interval = cmd
        .poll_interval
        .unwrap_or(config.tracker.poll_interval_secs);
    tracing::info!(
        "starting dipwatch: {} watchlist tokens, polling every {}s",
        candidates.len(),
        poll_interval
    );

    loop {
        let outcome = scheduler.run_cycle(&candidates, Utc::now()).await;
        if let CycleOutcome::Completed { .. } = outcome {
            let store = store.read().await;
            let stats = store.stats();
            tracing::info!(
                "tracking {} journeys: {} strong buy, {} buy, {} watch, {} avoid",
                stats.total_tracked,
                stats.signal_counts.strong_buy,
                stats.signal_counts.buy,
                stats.signal_counts.watch,
                stats.signal_counts.avoid
            );
        }

        tokio::select! {
            _ = tokio::time::sleep(StdDuration::from_secs(poll_interval)) => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
                break;
            }
        }
    }

    tracing::info!("Dipwatch stopped");
    Ok(())
}

async fn scan_command(cmd: ScanCmd) -> Result<()> {
    let config = load_config(&cmd.config).context("Failed to load configuration")?;

    let candidates = watchlist_candidates(&config);
    let (store, scheduler) = build_engine(&config)?;

    scheduler.run_cycle(&candidates, Utc::now()).await;

    let store = store.read().await;
    let journeys = store.get_all();
    let stats = store.stats();

    if cmd.json {
        let report = serde_json::json!({
            "stats": stats,
            "journeys": journeys,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if journeys.is_empty() {
        println!("No journeys tracked (watchlist empty or no prices resolved)");
        return Ok(());
    }

    for journey in &journeys {
        print_journey(journey);
    }
    println!(
        "{} tracked | {} strong buy, {} buy, {} watch, {} avoid",
        stats.total_tracked,
        stats.signal_counts.strong_buy,
        stats.signal_counts.buy,
        stats.signal_counts.watch,
        stats.signal_counts.avoid
    );

    Ok(())
}

fn print_journey(journey: &Journey) {
    let signals = journey.signals();
    println!(
        "{} ({}) - {} [score {:.0}]",
        journey.symbol(),
        journey.address(),
        signals.entry_signal,
        signals.score
    );
    println!(
        "  baseline ${:.0} | now ${:.0} | pump {:.1}x | drawdown {:.1}% | trend {} | risk {}",
        journey.migration_baseline().market_cap,
        journey.latest().market_cap,
        signals.pump_multiple,
        signals.drawdown_percent,
        signals.trend,
        signals.risk_level
    );
    for reason in &signals.reasons {
        println!("  + {}", reason);
    }
    for warning in &signals.warnings {
        println!("  ! {}", warning);
    }
}
