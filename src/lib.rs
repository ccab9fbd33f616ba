//! Dipwatch - Token Journey Tracker and Retracement Signal Engine
//!
//! Tracks newly migrated tokens against their migration baseline, keeps a
//! bounded price history per token, and scores buy-the-dip entries from pump
//! history, drawdown from the high, short-term trend, and pullback freshness.
//!
//! # Modules
//!
//! - `domain`: Core business logic (Journey, JourneyStore, signal scoring)
//! - `ports`: Trait abstractions (PriceSourcePort)
//! - `adapters`: External implementations (DexScreener client, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Update scheduler driving the store

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
