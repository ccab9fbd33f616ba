//! Journey Store
//!
//! Process-wide keyed cache of token journeys. One instance is created at
//! startup, wrapped in `Arc<RwLock<..>>`, and injected into the scheduler and
//! any read-side consumers; there is no ambient global. All mutation goes
//! through `upsert`/`evict_expired`, which keep the derived signals in lock
//! step with the state they were computed from. Nothing is persisted — the
//! cache rebuilds from scratch on restart by design.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::journey::{Journey, TokenObservation};
use crate::domain::signals::EntrySignal;

/// Journey counts per signal bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalCounts {
    pub strong_buy: usize,
    pub buy: usize,
    pub watch: usize,
    pub avoid: usize,
    pub no_data: usize,
}

/// Aggregate view of the cache for dashboards and logs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub total_tracked: usize,
    pub last_poll_at: Option<DateTime<Utc>>,
    pub signal_counts: SignalCounts,
}

/// Keyed cache of journeys with bounded per-token history.
#[derive(Debug)]
pub struct JourneyStore {
    journeys: HashMap<String, Journey>,
    last_poll_at: Option<DateTime<Utc>>,
    max_history: usize,
    min_snapshot_interval: Duration,
    max_tracked_age: Duration,
}

impl JourneyStore {
    pub fn new(
        max_history: usize,
        min_snapshot_interval: Duration,
        max_tracked_age: Duration,
    ) -> Self {
        Self {
            journeys: HashMap::new(),
            last_poll_at: None,
            max_history,
            min_snapshot_interval,
            max_tracked_age,
        }
    }

    /// Create or update the journey for `address` from a fresh observation.
    ///
    /// On first sight the migration baseline comes from `migration_hint` when
    /// positive, otherwise from the observation. On update the ATH advances
    /// if exceeded, `latest` is replaced unconditionally, and a snapshot is
    /// appended only if the minimum interval elapsed. Signals are recomputed
    /// before returning, so no caller ever sees a journey whose signals lag
    /// its history.
    pub fn upsert(
        &mut self,
        address: &str,
        symbol: &str,
        observation: &TokenObservation,
        migration_hint: Option<f64>,
        now: DateTime<Utc>,
    ) {
        match self.journeys.entry(address.to_string()) {
            Entry::Occupied(mut entry) => {
                let journey = entry.get_mut();
                journey.apply(observation, self.min_snapshot_interval, self.max_history, now);
                journey.refresh_signals(now);
            }
            Entry::Vacant(entry) => {
                let mut journey = Journey::new(address, symbol, migration_hint, observation, now);
                journey.refresh_signals(now);
                tracing::debug!(
                    "tracking new journey {} ({}) baseline ${:.0}",
                    symbol,
                    address,
                    journey.migration_baseline().market_cap
                );
                entry.insert(journey);
            }
        }
    }

    /// Drop journeys whose age since migration exceeds twice the tracking
    /// window. Returns how many were removed.
    pub fn evict_expired(&mut self, now: DateTime<Utc>) -> usize {
        let cutoff = self.max_tracked_age * 2;
        let before = self.journeys.len();
        self.journeys
            .retain(|_, journey| now - journey.migration_baseline().at <= cutoff);
        before - self.journeys.len()
    }

    /// Record that a poll cycle touched the store
    pub fn mark_polled(&mut self, now: DateTime<Utc>) {
        self.last_poll_at = Some(now);
    }

    pub fn get(&self, address: &str) -> Option<&Journey> {
        self.journeys.get(address)
    }

    pub fn get_all(&self) -> Vec<&Journey> {
        self.journeys.values().collect()
    }

    /// Journeys whose current entry signal is in `signals`
    pub fn get_by_signal(&self, signals: &[EntrySignal]) -> Vec<&Journey> {
        self.journeys
            .values()
            .filter(|journey| signals.contains(&journey.signals().entry_signal))
            .collect()
    }

    pub fn stats(&self) -> CacheStats {
        let mut counts = SignalCounts::default();
        for journey in self.journeys.values() {
            match journey.signals().entry_signal {
                EntrySignal::StrongBuy => counts.strong_buy += 1,
                EntrySignal::Buy => counts.buy += 1,
                EntrySignal::Watch => counts.watch += 1,
                EntrySignal::Avoid => counts.avoid += 1,
                EntrySignal::NoData => counts.no_data += 1,
            }
        }
        CacheStats {
            total_tracked: self.journeys.len(),
            last_poll_at: self.last_poll_at,
            signal_counts: counts,
        }
    }

    pub fn len(&self) -> usize {
        self.journeys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.journeys.is_empty()
    }
}
