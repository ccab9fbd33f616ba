//! Journey Engine Integration Tests
//!
//! Integration tests that verify the tracking components work together:
//! 1. UpdateScheduler -> JourneyStore refresh flow
//! 2. Journey lifecycle from migration baseline through pump, retrace, signal
//! 3. Throttling, partial provider responses, and eviction
//!
//! All tests are deterministic (no real network calls) and use a scripted
//! price source.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use dipwatch::application::{CycleOutcome, UpdateScheduler};
use dipwatch::domain::{
    EntrySignal, JourneyStore, TokenCandidate, TokenObservation, Trend,
};
use dipwatch::ports::PriceSourcePort;

// ============================================================================
// Test Fixtures
// ============================================================================

/// Scripted price source: pops one response map per fetch and records the
/// addresses it was asked for.
struct ScriptedPriceSource {
    responses: Mutex<Vec<HashMap<String, TokenObservation>>>,
    requests: Mutex<Vec<Vec<String>>>,
}

impl ScriptedPriceSource {
    fn new(responses: Vec<HashMap<String, TokenObservation>>) -> Self {
        // Stored reversed so pop() yields them in script order
        let mut responses = responses;
        responses.reverse();
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn recorded_requests(&self) -> Vec<Vec<String>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PriceSourcePort for ScriptedPriceSource {
    async fn fetch_prices(&self, addresses: &[String]) -> HashMap<String, TokenObservation> {
        self.requests.lock().unwrap().push(addresses.to_vec());
        self.responses.lock().unwrap().pop().unwrap_or_default()
    }
}

fn observation(market_cap: f64) -> TokenObservation {
    TokenObservation {
        market_cap,
        price: market_cap / 1_000_000_000.0,
        liquidity: Some(20_000.0),
    }
}

fn response(prices: &[(&str, f64)]) -> HashMap<String, TokenObservation> {
    prices
        .iter()
        .map(|(addr, cap)| (addr.to_string(), observation(*cap)))
        .collect()
}

fn candidate(address: &str, detected_at: DateTime<Utc>, hint: Option<f64>) -> TokenCandidate {
    TokenCandidate {
        address: address.to_string(),
        symbol: address.to_uppercase(),
        detected_at,
        market_cap_hint: hint,
    }
}

fn t0() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-01-05T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn new_store() -> Arc<RwLock<JourneyStore>> {
    Arc::new(RwLock::new(JourneyStore::new(
        50,
        Duration::seconds(30),
        Duration::minutes(60),
    )))
}

fn new_scheduler(
    store: Arc<RwLock<JourneyStore>>,
    source: Arc<ScriptedPriceSource>,
) -> UpdateScheduler {
    UpdateScheduler::new(store, source, Duration::seconds(30), Duration::minutes(60))
}

// ============================================================================
// Tests
// ============================================================================

/// A token pumps 30x from its migration baseline, retraces 50%, and holds.
/// The engine should surface it as a buy-grade dip entry with the exact
/// pump and drawdown figures.
#[tokio::test]
async fn test_full_journey_pump_retrace_signal() {
    let caps = [
        10_000.0, 300_000.0, 150_000.0, 150_000.0, 150_000.0, 150_000.0, 150_000.0,
    ];
    let source = Arc::new(ScriptedPriceSource::new(
        caps.iter().map(|cap| response(&[("mint1", *cap)])).collect(),
    ));
    let store = new_store();
    let scheduler = new_scheduler(store.clone(), source.clone());

    let candidates = [candidate("mint1", t0(), Some(10_000.0))];
    for i in 0..caps.len() {
        let outcome = scheduler
            .run_cycle(&candidates, t0() + Duration::minutes(i as i64))
            .await;
        assert!(matches!(outcome, CycleOutcome::Completed { .. }));
    }

    let store = store.read().await;
    let journey = store.get("mint1").unwrap();
    let signals = journey.signals();

    assert_eq!(journey.migration_baseline().market_cap, 10_000.0);
    assert_eq!(journey.all_time_high().market_cap, 300_000.0);
    assert_eq!(journey.latest().market_cap, 150_000.0);
    assert_eq!(journey.history().len(), caps.len());

    assert_eq!(signals.pump_multiple, 30.0);
    assert_eq!(signals.current_multiple, 15.0);
    assert_eq!(signals.drawdown_percent, 50.0);
    assert_eq!(signals.trend, Trend::Consolidating);
    assert!(matches!(
        signals.entry_signal,
        EntrySignal::Buy | EntrySignal::StrongBuy
    ));
    assert!(signals.score >= 65.0);

    // Each cycle asked the provider for the candidate address
    let requests = source.recorded_requests();
    assert_eq!(requests.len(), caps.len());
    assert!(requests.iter().all(|r| r == &vec!["mint1".to_string()]));
}

/// Cycles inside the minimum interval are collapsed to no-ops and leave the
/// store untouched.
#[tokio::test]
async fn test_throttled_cycle_leaves_store_unchanged() {
    let source = Arc::new(ScriptedPriceSource::new(vec![
        response(&[("mint1", 10_000.0)]),
        response(&[("mint1", 999_999.0)]),
    ]));
    let store = new_store();
    let scheduler = new_scheduler(store.clone(), source.clone());
    let candidates = [candidate("mint1", t0(), None)];

    let first = scheduler.run_cycle(&candidates, t0()).await;
    assert!(matches!(first, CycleOutcome::Completed { .. }));

    // 5 seconds later, under the 30s interval
    let second = scheduler
        .run_cycle(&candidates, t0() + Duration::seconds(5))
        .await;
    assert_eq!(second, CycleOutcome::Throttled);

    let store = store.read().await;
    let journey = store.get("mint1").unwrap();
    assert_eq!(journey.latest().market_cap, 10_000.0);
    assert_eq!(store.stats().last_poll_at, Some(t0()));

    // Throttled cycle never reached the provider
    assert_eq!(source.recorded_requests().len(), 1);
}

/// The provider resolving only part of a batch is routine: resolved tokens
/// refresh, unresolved ones keep their prior state, and the poll instant
/// still advances.
#[tokio::test]
async fn test_partial_provider_response() {
    let source = Arc::new(ScriptedPriceSource::new(vec![
        response(&[("mint1", 10_000.0), ("mint2", 20_000.0)]),
        response(&[("mint1", 15_000.0)]),
    ]));
    let store = new_store();
    let scheduler = new_scheduler(store.clone(), source);

    let candidates = [candidate("mint1", t0(), None), candidate("mint2", t0(), None)];
    scheduler.run_cycle(&candidates, t0()).await;

    let t1 = t0() + Duration::minutes(1);
    let outcome = scheduler.run_cycle(&candidates, t1).await;
    assert_eq!(
        outcome,
        CycleOutcome::Completed {
            refreshed: 1,
            evicted: 0
        }
    );

    let store = store.read().await;
    assert_eq!(store.get("mint1").unwrap().latest().market_cap, 15_000.0);
    // mint2 missed this round but keeps its last known state
    assert_eq!(store.get("mint2").unwrap().latest().market_cap, 20_000.0);
    assert_eq!(store.get("mint2").unwrap().latest().updated_at, t0());
    assert_eq!(store.stats().last_poll_at, Some(t1));
}

/// Journeys past twice the tracking window are evicted during a cycle, while
/// younger ones survive.
#[tokio::test]
async fn test_eviction_of_expired_journeys() {
    let source = Arc::new(ScriptedPriceSource::new(vec![
        response(&[("old", 5_000.0)]),
        response(&[("young", 8_000.0)]),
    ]));
    let store = new_store();

    // "old" enters the store well in the past
    let birth = t0() - Duration::minutes(130);
    let scheduler = new_scheduler(store.clone(), source.clone());
    scheduler
        .run_cycle(&[candidate("old", birth, None)], birth)
        .await;

    // Store window is 60 minutes, so at t0 "old" is past the 120-minute
    // eviction cutoff
    let outcome = scheduler
        .run_cycle(&[candidate("young", t0(), None)], t0())
        .await;
    assert_eq!(
        outcome,
        CycleOutcome::Completed {
            refreshed: 1,
            evicted: 1
        }
    );

    let store = store.read().await;
    assert!(store.get("old").is_none());
    assert!(store.get("young").is_some());
    assert_eq!(store.len(), 1);
}

/// Stats reflect the signal distribution across tracked journeys.
#[tokio::test]
async fn test_stats_signal_distribution() {
    let source = Arc::new(ScriptedPriceSource::new(vec![response(&[
        ("mint1", 10_000.0),
        ("mint2", 25_000.0),
    ])]));
    let store = new_store();
    let scheduler = new_scheduler(store.clone(), source);

    let candidates = [candidate("mint1", t0(), None), candidate("mint2", t0(), None)];
    scheduler.run_cycle(&candidates, t0()).await;

    let store = store.read().await;
    let stats = store.stats();
    assert_eq!(stats.total_tracked, 2);
    assert_eq!(stats.last_poll_at, Some(t0()));

    let counts = stats.signal_counts;
    let total = counts.strong_buy + counts.buy + counts.watch + counts.avoid + counts.no_data;
    assert_eq!(total, 2);
    // First observation gives no pump, no drawdown: nothing buy-grade yet
    assert_eq!(counts.strong_buy, 0);
    assert_eq!(counts.buy, 0);
}
