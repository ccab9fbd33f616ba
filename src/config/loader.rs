//! Configuration Loader
//!
//! Loads and validates configuration from TOML files matching the shipped
//! config/default.toml structure.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::adapters::market_data::MAX_ADDRESSES_PER_BATCH;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub tracker: TrackerSection,
    pub price_source: PriceSourceSection,
    pub logging: LoggingSection,
    /// Tokens the binary treats as its candidate feed
    #[serde(default)]
    pub watchlist: Vec<WatchlistEntry>,
}

/// Journey tracking configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct TrackerSection {
    /// Maximum snapshots retained per journey (oldest trimmed first)
    pub max_history: usize,
    /// Minimum spacing between two snapshots for the same journey
    pub min_snapshot_interval_secs: u64,
    /// Minimum spacing between refresh cycles (throttle)
    pub min_cycle_interval_secs: u64,
    /// Candidates older than this are not picked up for tracking;
    /// journeys are evicted at twice this age
    pub max_tracked_age_minutes: u64,
    /// How often the run loop triggers a cycle
    pub poll_interval_secs: u64,
}

/// Price provider configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct PriceSourceSection {
    /// Batched token endpoint base URL
    pub api_url: String,
    /// Addresses per request (provider ceiling is 30)
    pub batch_size: usize,
    /// Pause between sequential batches in milliseconds
    pub batch_delay_ms: u64,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl PriceSourceSection {
    /// Get the API URL with environment variable override.
    /// Checks DIPWATCH_API_URL first, falls back to the config value.
    pub fn get_api_url(&self) -> String {
        std::env::var("DIPWATCH_API_URL").unwrap_or_else(|_| self.api_url.clone())
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

/// One watchlist token
#[derive(Debug, Clone, Deserialize)]
pub struct WatchlistEntry {
    /// Token mint address
    pub address: String,
    /// Token symbol (for logging and display)
    pub symbol: String,
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tracker.max_history == 0 {
            return Err(ConfigError::ValidationError(
                "max_history must be > 0".to_string(),
            ));
        }

        if self.tracker.min_snapshot_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "min_snapshot_interval_secs must be > 0".to_string(),
            ));
        }

        if self.tracker.min_cycle_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "min_cycle_interval_secs must be > 0".to_string(),
            ));
        }

        if self.tracker.max_tracked_age_minutes == 0 {
            return Err(ConfigError::ValidationError(
                "max_tracked_age_minutes must be > 0".to_string(),
            ));
        }

        if self.tracker.poll_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "poll_interval_secs must be > 0".to_string(),
            ));
        }

        if self.price_source.api_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "api_url cannot be empty".to_string(),
            ));
        }

        if self.price_source.batch_size == 0
            || self.price_source.batch_size > MAX_ADDRESSES_PER_BATCH
        {
            return Err(ConfigError::ValidationError(format!(
                "batch_size must be 1-{}, got {}",
                MAX_ADDRESSES_PER_BATCH, self.price_source.batch_size
            )));
        }

        for entry in &self.watchlist {
            if entry.address.is_empty() {
                return Err(ConfigError::ValidationError(
                    "watchlist address cannot be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}

// Conversion to the price client config
impl From<&PriceSourceSection> for crate::adapters::market_data::DexScreenerConfig {
    fn from(section: &PriceSourceSection) -> Self {
        Self {
            api_url: section.get_api_url(),
            batch_size: section.batch_size,
            batch_delay_ms: section.batch_delay_ms,
            timeout_secs: section.timeout_secs,
        }
    }
}
