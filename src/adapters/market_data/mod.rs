//! Market Data Adapters
//!
//! External price sources:
//! - `DexScreenerClient`: batched token market data with chunking to the
//!   provider's per-request ceiling and inter-batch pacing

mod dexscreener;

pub use dexscreener::{
    DexScreenerClient, DexScreenerConfig, PriceSourceError, MAX_ADDRESSES_PER_BATCH,
};
