//! Update Scheduler
//!
//! The single write path into the journey store. Callers hand it candidate
//! tokens on whatever cadence they like; the scheduler throttles to a minimum
//! cycle interval, fetches batched prices through the price source port,
//! folds usable observations into the store, and evicts expired journeys.
//! A cycle gate collapses overlapping invocations into a no-op so two cycles
//! can never interleave writes.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, RwLock};

use crate::domain::{JourneyStore, TokenCandidate};
use crate::ports::PriceSourcePort;

/// Result of a `run_cycle` invocation.
///
/// `Throttled` and `Skipped` are designed no-ops, not failures: the former
/// when the minimum interval has not elapsed, the latter when another cycle
/// is already in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Completed { refreshed: usize, evicted: usize },
    Throttled,
    Skipped,
}

#[derive(Debug, Default)]
struct CycleState {
    last_cycle_at: Option<DateTime<Utc>>,
}

/// Throttled refresh driver for the journey store
pub struct UpdateScheduler {
    store: Arc<RwLock<JourneyStore>>,
    price_source: Arc<dyn PriceSourcePort>,
    min_cycle_interval: Duration,
    max_tracked_age: Duration,
    cycle_gate: Mutex<CycleState>,
}

impl UpdateScheduler {
    pub fn new(
        store: Arc<RwLock<JourneyStore>>,
        price_source: Arc<dyn PriceSourcePort>,
        min_cycle_interval: Duration,
        max_tracked_age: Duration,
    ) -> Self {
        Self {
            store,
            price_source,
            min_cycle_interval,
            max_tracked_age,
            cycle_gate: Mutex::new(CycleState::default()),
        }
    }

    /// Run one refresh cycle at `now`.
    ///
    /// Candidates detected longer than `max_tracked_age` ago are ignored for
    /// new tracking (journeys already in the store age out via eviction
    /// instead). Observations with a non-positive market cap are discarded as
    /// unusable. Price fetch happens outside the store lock, so concurrent
    /// readers are never blocked on the network.
    pub async fn run_cycle(&self, candidates: &[TokenCandidate], now: DateTime<Utc>) -> CycleOutcome {
        let mut state = match self.cycle_gate.try_lock() {
            Ok(state) => state,
            Err(_) => {
                tracing::debug!("refresh cycle already in flight, skipping");
                return CycleOutcome::Skipped;
            }
        };

        if let Some(last) = state.last_cycle_at {
            if now - last < self.min_cycle_interval {
                tracing::debug!(
                    "refresh throttled, {}s since last cycle",
                    (now - last).num_seconds()
                );
                return CycleOutcome::Throttled;
            }
        }

        let fresh: Vec<&TokenCandidate> = candidates
            .iter()
            .filter(|c| now - c.detected_at <= self.max_tracked_age)
            .collect();

        let addresses: Vec<String> = fresh.iter().map(|c| c.address.clone()).collect();
        let observations = self.price_source.fetch_prices(&addresses).await;

        let mut refreshed = 0;
        let evicted;
        let tracked;
        {
            let mut store = self.store.write().await;
            for candidate in &fresh {
                if let Some(observation) = observations.get(&candidate.address) {
                    if observation.market_cap > 0.0 {
                        store.upsert(
                            &candidate.address,
                            &candidate.symbol,
                            observation,
                            candidate.market_cap_hint,
                            now,
                        );
                        refreshed += 1;
                    }
                }
            }
            evicted = store.evict_expired(now);
            store.mark_polled(now);
            tracked = store.len();
        }
        state.last_cycle_at = Some(now);

        tracing::info!(
            "refresh cycle complete: {} refreshed, {} evicted, {} tracked",
            refreshed,
            evicted,
            tracked
        );
        CycleOutcome::Completed { refreshed, evicted }
    }
}
