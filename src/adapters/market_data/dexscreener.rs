//! DexScreener Price Client
//!
//! Batched market data fetches against the DexScreener token endpoint.
//! Addresses are chunked to the provider's per-request ceiling and batches
//! are issued sequentially with a short pause between them to stay inside
//! the implicit rate limit. A failed batch is logged and skipped; it never
//! aborts sibling batches, and there are no retries within a cycle — the
//! next cycle refreshes whatever was missed.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::TokenObservation;
use crate::ports::PriceSourcePort;

/// DexScreener batched token endpoint
const DEXSCREENER_TOKENS_API: &str = "https://api.dexscreener.com/latest/dex/tokens";

/// Provider ceiling on addresses per request
pub const MAX_ADDRESSES_PER_BATCH: usize = 30;

const DEFAULT_BATCH_DELAY_MS: u64 = 250;
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Price client errors
#[derive(Debug, Error)]
pub enum PriceSourceError {
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Provider returned status {0}")]
    BadStatus(reqwest::StatusCode),
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DexScreenerConfig {
    /// Base URL of the token endpoint
    pub api_url: String,
    /// Addresses per request, capped by the provider
    pub batch_size: usize,
    /// Pause between sequential batches
    pub batch_delay_ms: u64,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for DexScreenerConfig {
    fn default() -> Self {
        Self {
            api_url: DEXSCREENER_TOKENS_API.to_string(),
            batch_size: MAX_ADDRESSES_PER_BATCH,
            batch_delay_ms: DEFAULT_BATCH_DELAY_MS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl DexScreenerConfig {
    pub fn validate(&self) -> Result<(), PriceSourceError> {
        if self.api_url.is_empty() {
            return Err(PriceSourceError::ConfigError(
                "api_url cannot be empty".into(),
            ));
        }
        if self.batch_size == 0 || self.batch_size > MAX_ADDRESSES_PER_BATCH {
            return Err(PriceSourceError::ConfigError(format!(
                "batch_size must be 1-{}, got {}",
                MAX_ADDRESSES_PER_BATCH, self.batch_size
            )));
        }
        Ok(())
    }
}

/// DexScreener-backed implementation of the price source port
#[derive(Debug)]
pub struct DexScreenerClient {
    config: DexScreenerConfig,
    http_client: Client,
}

impl DexScreenerClient {
    pub fn new(config: DexScreenerConfig) -> Result<Self, PriceSourceError> {
        config.validate()?;

        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(PriceSourceError::HttpError)?;

        Ok(Self {
            config,
            http_client,
        })
    }

    async fn fetch_batch(&self, chunk: &[String]) -> Result<Vec<PairInfo>, PriceSourceError> {
        let url = format!("{}/{}", self.config.api_url, chunk.join(","));

        let response = self.http_client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(PriceSourceError::BadStatus(response.status()));
        }

        let data: TokensResponse = response.json().await?;
        Ok(data.pairs.unwrap_or_default())
    }
}

#[async_trait]
impl PriceSourcePort for DexScreenerClient {
    async fn fetch_prices(&self, addresses: &[String]) -> HashMap<String, TokenObservation> {
        let mut result = HashMap::new();
        if addresses.is_empty() {
            return result;
        }

        for (i, chunk) in addresses.chunks(self.config.batch_size).enumerate() {
            if i > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.batch_delay_ms)).await;
            }
            match self.fetch_batch(chunk).await {
                Ok(pairs) => fold_pairs(&mut result, pairs),
                Err(e) => {
                    tracing::warn!("price batch of {} addresses failed: {}", chunk.len(), e);
                }
            }
        }

        tracing::debug!(
            "resolved {} of {} addresses from price provider",
            result.len(),
            addresses.len()
        );
        result
    }
}

/// Reduce raw pairs to one observation per token, preferring the deepest
/// pool. Market cap falls back to fully diluted value; tokens with neither
/// are omitted.
fn fold_pairs(result: &mut HashMap<String, TokenObservation>, pairs: Vec<PairInfo>) {
    for pair in pairs {
        let Some(market_cap) = pair.market_cap.or(pair.fdv) else {
            continue;
        };
        let price = pair
            .price_usd
            .as_deref()
            .and_then(|p| p.parse::<f64>().ok())
            .unwrap_or(0.0);
        let liquidity = pair.liquidity.as_ref().and_then(|l| l.usd);
        let observation = TokenObservation {
            market_cap,
            price,
            liquidity,
        };

        match result.entry(pair.base_token.address) {
            Entry::Occupied(mut entry) => {
                if liquidity.unwrap_or(0.0) > entry.get().liquidity.unwrap_or(0.0) {
                    entry.insert(observation);
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(observation);
            }
        }
    }
}

/// DexScreener token endpoint response
#[derive(Debug, Deserialize)]
struct TokensResponse {
    pairs: Option<Vec<PairInfo>>,
}

#[derive(Debug, Deserialize)]
struct PairInfo {
    #[serde(rename = "baseToken")]
    base_token: PairToken,
    #[serde(rename = "priceUsd")]
    price_usd: Option<String>,
    liquidity: Option<PairLiquidity>,
    fdv: Option<f64>,
    #[serde(rename = "marketCap")]
    market_cap: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct PairToken {
    address: String,
}

#[derive(Debug, Deserialize)]
struct PairLiquidity {
    usd: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(address: &str, market_cap: Option<f64>, fdv: Option<f64>, liq: Option<f64>) -> PairInfo {
        PairInfo {
            base_token: PairToken {
                address: address.to_string(),
            },
            price_usd: Some("0.0015".to_string()),
            liquidity: liq.map(|usd| PairLiquidity { usd: Some(usd) }),
            fdv,
            market_cap,
        }
    }

    #[test]
    fn test_config_default_is_valid() {
        let config = DexScreenerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.batch_size, 30);
    }

    #[test]
    fn test_config_rejects_oversized_batch() {
        let config = DexScreenerConfig {
            batch_size: 31,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = DexScreenerConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_rejects_empty_url() {
        let config = DexScreenerConfig {
            api_url: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_client_rejects_invalid_config() {
        let config = DexScreenerConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert!(DexScreenerClient::new(config).is_err());
    }

    #[test]
    fn test_fold_pairs_prefers_deepest_pool() {
        let mut result = HashMap::new();
        fold_pairs(
            &mut result,
            vec![
                pair("mint1", Some(10_000.0), None, Some(2_000.0)),
                pair("mint1", Some(12_000.0), None, Some(8_000.0)),
                pair("mint1", Some(11_000.0), None, Some(500.0)),
            ],
        );

        assert_eq!(result.len(), 1);
        let obs = &result["mint1"];
        assert_eq!(obs.market_cap, 12_000.0);
        assert_eq!(obs.liquidity, Some(8_000.0));
    }

    #[test]
    fn test_fold_pairs_fdv_fallback() {
        let mut result = HashMap::new();
        fold_pairs(&mut result, vec![pair("mint1", None, Some(9_500.0), None)]);
        assert_eq!(result["mint1"].market_cap, 9_500.0);
        assert_eq!(result["mint1"].liquidity, None);
    }

    #[test]
    fn test_fold_pairs_skips_unpriced_tokens() {
        let mut result = HashMap::new();
        fold_pairs(&mut result, vec![pair("mint1", None, None, Some(1_000.0))]);
        assert!(result.is_empty());
    }

    #[test]
    fn test_fold_pairs_parses_price() {
        let mut result = HashMap::new();
        fold_pairs(
            &mut result,
            vec![pair("mint1", Some(10_000.0), None, Some(1_000.0))],
        );
        assert_eq!(result["mint1"].price, 0.0015);
    }

    #[tokio::test]
    async fn test_fetch_prices_empty_input() {
        let client = DexScreenerClient::new(DexScreenerConfig::default()).unwrap();
        let result = client.fetch_prices(&[]).await;
        assert!(result.is_empty());
    }

    /// Accept one connection and answer it with a canned HTTP response
    async fn serve_once(listener: &tokio::net::TcpListener, status_line: &str, body: &str) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 1024];
        let _ = socket.read(&mut buf).await;
        let response = format!(
            "{}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.flush().await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_batch_is_skipped_and_siblings_fold() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // First batch resolves, second batch errors out server-side
        let server = tokio::spawn(async move {
            let body = r#"{"pairs":[{"baseToken":{"address":"good"},"priceUsd":"0.002","liquidity":{"usd":9000.0},"marketCap":15000.0}]}"#;
            serve_once(&listener, "HTTP/1.1 200 OK", body).await;
            serve_once(&listener, "HTTP/1.1 500 Internal Server Error", "{}").await;
        });

        let client = DexScreenerClient::new(DexScreenerConfig {
            api_url: format!("http://{}", addr),
            batch_size: 1,
            batch_delay_ms: 1,
            timeout_secs: 2,
        })
        .unwrap();

        let result = client
            .fetch_prices(&["good".to_string(), "bad".to_string()])
            .await;
        server.await.unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result["good"].market_cap, 15_000.0);
        assert_eq!(result["good"].liquidity, Some(9_000.0));
        assert!(!result.contains_key("bad"));
    }

    #[tokio::test]
    async fn test_all_batches_failing_yields_empty_map() {
        // Nothing listens on port 1, so every batch hits a transport error
        let client = DexScreenerClient::new(DexScreenerConfig {
            api_url: "http://127.0.0.1:1".to_string(),
            batch_size: 1,
            batch_delay_ms: 1,
            timeout_secs: 1,
        })
        .unwrap();

        let result = client
            .fetch_prices(&["mint1".to_string(), "mint2".to_string()])
            .await;
        assert!(result.is_empty());
    }
}
