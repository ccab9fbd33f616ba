//! Domain Layer - Core journey tracking and signal logic
//!
//! Pure domain types and computation with no I/O. External interactions
//! happen through the ports layer.
//!
//! - `journey`: per-token aggregate record (baseline, ATH, bounded history)
//! - `signals`: trend/risk classification and the weighted entry score
//! - `store`: process-wide keyed cache with eviction and read accessors

pub mod journey;
pub mod signals;
pub mod store;

pub use journey::{
    Journey, LatestQuote, MarketCapPoint, PriceSnapshot, TokenCandidate, TokenObservation,
};
pub use signals::{compute_signals, EntrySignal, RetracementSignals, RiskLevel, Trend};
pub use store::{CacheStats, JourneyStore, SignalCounts};
