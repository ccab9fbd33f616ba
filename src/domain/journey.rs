//! Token Journey
//!
//! Per-token aggregate record: migration baseline, all-time high, latest
//! quote, and a bounded history of price snapshots. Journeys are created and
//! mutated only through the `JourneyStore`, which recomputes the derived
//! signals after every change.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::signals::{compute_signals, RetracementSignals};

/// Point-in-time observation returned by the price provider
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TokenObservation {
    /// Market cap in USD
    pub market_cap: f64,
    /// Price in USD
    pub price: f64,
    /// Liquidity in USD, if the provider reports it
    pub liquidity: Option<f64>,
}

/// A token the caller wants tracked
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenCandidate {
    /// Token mint address
    pub address: String,
    /// Token symbol
    pub symbol: String,
    /// When the caller first detected the token
    pub detected_at: DateTime<Utc>,
    /// Market cap at detection time, if known
    pub market_cap_hint: Option<f64>,
}

/// Immutable snapshot retained in a journey's bounded history
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub timestamp: DateTime<Utc>,
    pub market_cap: f64,
    pub price: f64,
    pub liquidity: Option<f64>,
}

/// A market cap pinned to the instant it was observed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketCapPoint {
    pub market_cap: f64,
    pub at: DateTime<Utc>,
}

/// Most recent observation folded into a journey
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatestQuote {
    pub market_cap: f64,
    pub price: f64,
    pub liquidity: Option<f64>,
    pub updated_at: DateTime<Utc>,
}

/// Aggregate record for one tracked token.
///
/// Fields are private so the invariants hold by construction: the baseline is
/// immutable after creation, the all-time high only ever advances, history is
/// capped, and `signals` has no setter — it is recomputed wholesale from the
/// other fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Journey {
    address: String,
    symbol: String,
    migration_baseline: MarketCapPoint,
    all_time_high: MarketCapPoint,
    latest: LatestQuote,
    history: VecDeque<PriceSnapshot>,
    signals: RetracementSignals,
}

impl Journey {
    /// Create a journey from the first successful observation.
    ///
    /// The migration baseline comes from the caller's hint when it is
    /// positive, otherwise from the observation itself. The all-time high
    /// starts at the baseline and is advanced immediately if the first
    /// observation exceeds it.
    pub(crate) fn new(
        address: &str,
        symbol: &str,
        migration_hint: Option<f64>,
        observation: &TokenObservation,
        now: DateTime<Utc>,
    ) -> Self {
        let baseline_cap = migration_hint
            .filter(|m| *m > 0.0)
            .unwrap_or(observation.market_cap);
        let migration_baseline = MarketCapPoint {
            market_cap: baseline_cap,
            at: now,
        };
        let all_time_high = if observation.market_cap > baseline_cap {
            MarketCapPoint {
                market_cap: observation.market_cap,
                at: now,
            }
        } else {
            migration_baseline
        };

        let mut history = VecDeque::new();
        history.push_back(PriceSnapshot {
            timestamp: now,
            market_cap: observation.market_cap,
            price: observation.price,
            liquidity: observation.liquidity,
        });

        Self {
            address: address.to_string(),
            symbol: symbol.to_string(),
            migration_baseline,
            all_time_high,
            latest: LatestQuote {
                market_cap: observation.market_cap,
                price: observation.price,
                liquidity: observation.liquidity,
                updated_at: now,
            },
            history,
            signals: RetracementSignals::no_data(),
        }
    }

    /// Fold a new observation into the journey.
    ///
    /// The all-time high advances if exceeded and `latest` is always
    /// replaced. A snapshot is appended only when at least
    /// `min_snapshot_interval` has elapsed since the previous one, so storage
    /// growth is bounded independent of caller cadence. History beyond
    /// `max_history` is trimmed oldest-first.
    pub(crate) fn apply(
        &mut self,
        observation: &TokenObservation,
        min_snapshot_interval: Duration,
        max_history: usize,
        now: DateTime<Utc>,
    ) {
        if observation.market_cap > self.all_time_high.market_cap {
            self.all_time_high = MarketCapPoint {
                market_cap: observation.market_cap,
                at: now,
            };
        }

        self.latest = LatestQuote {
            market_cap: observation.market_cap,
            price: observation.price,
            liquidity: observation.liquidity,
            updated_at: now,
        };

        let snapshot_due = match self.history.back() {
            Some(last) => now - last.timestamp >= min_snapshot_interval,
            None => true,
        };
        if snapshot_due {
            self.history.push_back(PriceSnapshot {
                timestamp: now,
                market_cap: observation.market_cap,
                price: observation.price,
                liquidity: observation.liquidity,
            });
            while self.history.len() > max_history {
                self.history.pop_front();
            }
        }
    }

    /// Recompute the derived signals from the current state
    pub(crate) fn refresh_signals(&mut self, now: DateTime<Utc>) {
        self.signals = compute_signals(self, now);
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn migration_baseline(&self) -> &MarketCapPoint {
        &self.migration_baseline
    }

    pub fn all_time_high(&self) -> &MarketCapPoint {
        &self.all_time_high
    }

    pub fn latest(&self) -> &LatestQuote {
        &self.latest
    }

    /// Snapshot history, oldest first
    pub fn history(&self) -> &VecDeque<PriceSnapshot> {
        &self.history
    }

    pub fn signals(&self) -> &RetracementSignals {
        &self.signals
    }

    /// Minutes elapsed since the migration baseline was set
    pub fn age_minutes(&self, now: DateTime<Utc>) -> f64 {
        ((now - self.migration_baseline.at).num_seconds() as f64 / 60.0).max(0.0)
    }
}
