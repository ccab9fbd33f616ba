//! Adapters Layer - External System Implementations
//!
//! Implementations of the port traits and the CLI surface:
//! - Market Data: DexScreener batched price client
//! - CLI: command-line interface handlers

pub mod cli;
pub mod market_data;

pub use cli::CliApp;
pub use market_data::{DexScreenerClient, DexScreenerConfig};
