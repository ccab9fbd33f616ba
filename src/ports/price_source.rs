//! Price source port
//!
//! Abstraction over the external market data provider. Implementations are
//! expected to contain their own I/O failures: a batch that cannot be fetched
//! simply contributes nothing to the returned map, and the next cycle retries
//! naturally. Addresses absent from the result mean "no data this round", not
//! an error.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::TokenObservation;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceSourcePort: Send + Sync {
    /// Fetch current market data for a set of token addresses.
    ///
    /// Returns an observation for every address the provider could resolve.
    async fn fetch_prices(&self, addresses: &[String]) -> HashMap<String, TokenObservation>;
}
