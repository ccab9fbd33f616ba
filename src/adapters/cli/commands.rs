//! CLI Command Definitions
//!
//! Command-line surface for the dipwatch journey tracker.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Dipwatch - Token Journey Tracker and Retracement Signal Engine
#[derive(Parser, Debug)]
#[command(
    name = "dipwatch",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "Token journey tracker and retracement entry-signal engine",
    long_about = "Dipwatch tracks newly migrated tokens against their migration baseline, \
                  keeps bounded price history per token, and scores buy-the-dip entries \
                  from pump history, drawdown, trend, and pullback freshness."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the tracking loop against the configured watchlist
    Run(RunCmd),

    /// Run a single refresh cycle and print the tracked journeys
    Scan(ScanCmd),
}

/// Run the tracking loop
#[derive(Parser, Debug)]
pub struct RunCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Override the poll interval in seconds
    #[arg(long, value_name = "SECS")]
    pub poll_interval: Option<u64>,
}

/// Run one cycle and print the result
#[derive(Parser, Debug)]
pub struct ScanCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Print journeys and stats as JSON
    #[arg(long)]
    pub json: bool,
}
