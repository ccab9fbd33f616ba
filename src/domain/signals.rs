//! Retracement Signal Engine
//!
//! Pure computation over a journey: trend classification, risk level, and a
//! weighted entry score bucketed into a recommendation. The weights and
//! thresholds are empirically tuned product values and are reproduced here
//! exactly; changing them changes trading behavior.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::domain::journey::{Journey, PriceSnapshot};

/// Minimum snapshots required before a trend can be read
const TREND_MIN_SNAPSHOTS: usize = 3;

/// Trend is classified over the most recent snapshots only
const TREND_WINDOW: usize = 5;

/// Mean fractional change beyond which the token is pumping or dumping
const TREND_MOVE_THRESHOLD: f64 = 0.05;

/// Change dispersion below which a sideways token counts as consolidating
const TREND_CONSOLIDATION_STD_DEV: f64 = 0.03;

/// Short-term market cap direction over the recent snapshot window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Pumping,
    Dumping,
    Consolidating,
    Unknown,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Pumping => write!(f, "pumping"),
            Trend::Dumping => write!(f, "dumping"),
            Trend::Consolidating => write!(f, "consolidating"),
            Trend::Unknown => write!(f, "unknown"),
        }
    }
}

/// Risk bucket derived from liquidity, drawdown, trend, and pump history
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Extreme,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
            RiskLevel::Extreme => write!(f, "extreme"),
        }
    }
}

/// Bucketed entry recommendation.
///
/// `NoData` only exists before the first computation; after that a journey
/// moves freely between the other four on every recomputation. There is no
/// hysteresis by design — the signal is a pure function of current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntrySignal {
    StrongBuy,
    Buy,
    Watch,
    Avoid,
    NoData,
}

impl fmt::Display for EntrySignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntrySignal::StrongBuy => write!(f, "strong_buy"),
            EntrySignal::Buy => write!(f, "buy"),
            EntrySignal::Watch => write!(f, "watch"),
            EntrySignal::Avoid => write!(f, "avoid"),
            EntrySignal::NoData => write!(f, "no_data"),
        }
    }
}

/// Derived signals, recomputed wholesale on every journey update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetracementSignals {
    /// ATH market cap over the migration baseline
    pub pump_multiple: f64,
    /// Latest market cap over the migration baseline
    pub current_multiple: f64,
    /// Percentage decline from ATH to the latest market cap, in [0, 100]
    pub drawdown_percent: f64,
    /// Minutes elapsed since the ATH was set
    pub minutes_since_ath: f64,
    pub trend: Trend,
    pub risk_level: RiskLevel,
    pub entry_signal: EntrySignal,
    /// Weighted entry score in [0, 100]
    pub score: f64,
    /// Factors that raised the score
    pub reasons: Vec<String>,
    /// Factors that lowered the score or warrant caution
    pub warnings: Vec<String>,
}

impl RetracementSignals {
    /// Placeholder state before the first computation
    pub fn no_data() -> Self {
        Self {
            pump_multiple: 0.0,
            current_multiple: 0.0,
            drawdown_percent: 0.0,
            minutes_since_ath: 0.0,
            trend: Trend::Unknown,
            risk_level: RiskLevel::High,
            entry_signal: EntrySignal::NoData,
            score: 0.0,
            reasons: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

/// Compute the full signal set for a journey at `now`.
///
/// Pure function of the journey's observable state; callers are expected to
/// recompute after every mutation so signals never drift from history.
pub fn compute_signals(journey: &Journey, now: DateTime<Utc>) -> RetracementSignals {
    let baseline = journey.migration_baseline().market_cap;
    let ath = journey.all_time_high().market_cap;
    let latest = journey.latest().market_cap;

    let pump_multiple = if baseline > 0.0 { ath / baseline } else { 0.0 };
    let current_multiple = if baseline > 0.0 { latest / baseline } else { 0.0 };
    let drawdown_percent = if ath > 0.0 {
        100.0 * (ath - latest) / ath
    } else {
        0.0
    };
    let minutes_since_ath =
        ((now - journey.all_time_high().at).num_seconds() as f64 / 60.0).max(0.0);

    let trend = classify_trend(journey.history());
    let risk_level = classify_risk(
        journey.latest().liquidity,
        drawdown_percent,
        trend,
        pump_multiple,
    );

    let mut score: f64 = 50.0;
    let mut reasons = Vec::new();
    let mut warnings = Vec::new();

    // Age penalty: pullback entries decay fast after the first hour
    let age_minutes = journey.age_minutes(now);
    if age_minutes > 60.0 {
        score -= 20.0;
        warnings.push(format!("Token is {:.0} minutes past migration", age_minutes));
    }

    // Pump-proof bonus: a demonstrated pump makes a second leg more likely
    if pump_multiple >= 20.0 {
        score += 25.0;
        reasons.push(format!("Proven {:.1}x pump from migration", pump_multiple));
    } else if pump_multiple >= 10.0 {
        score += 15.0;
        reasons.push(format!("Strong {:.1}x pump from migration", pump_multiple));
    } else if pump_multiple >= 5.0 {
        score += 5.0;
        reasons.push(format!("Moderate {:.1}x pump from migration", pump_multiple));
    } else {
        score -= 15.0;
        warnings.push(format!("Weak pump history ({:.1}x)", pump_multiple));
    }

    // Drawdown bonus: 40-70% off ATH is the sweet spot for a retracement entry
    if (40.0..=70.0).contains(&drawdown_percent) {
        score += 25.0;
        reasons.push(format!(
            "Retraced {:.0}% from ATH into the entry zone",
            drawdown_percent
        ));
    } else if (30.0..=80.0).contains(&drawdown_percent) {
        score += 10.0;
        reasons.push(format!("Retraced {:.0}% from ATH", drawdown_percent));
    } else if drawdown_percent < 30.0 {
        score -= 10.0;
        warnings.push(format!(
            "Still within {:.0}% of ATH, little discount",
            drawdown_percent
        ));
    } else {
        score -= 20.0;
        warnings.push(format!(
            "Down {:.0}% from ATH, token may be dead",
            drawdown_percent
        ));
    }

    // Trend bonus
    match trend {
        Trend::Consolidating => {
            score += 15.0;
            reasons.push("Price is consolidating after the pullback".to_string());
        }
        Trend::Pumping => {
            score += 5.0;
            reasons.push("Price is already moving back up".to_string());
        }
        Trend::Dumping => {
            score -= 15.0;
            warnings.push("Price is still dumping".to_string());
        }
        Trend::Unknown => {}
    }

    // Freshness of the pullback
    if minutes_since_ath <= 30.0 {
        score += 10.0;
        reasons.push("Pullback is fresh (ATH under 30 minutes ago)".to_string());
    } else if minutes_since_ath <= 60.0 {
        score += 5.0;
        reasons.push("Pullback is recent (ATH under an hour ago)".to_string());
    }

    // Remaining upside back to the prior high
    if current_multiple > 0.0 && pump_multiple / current_multiple >= 2.0 {
        score += 10.0;
        reasons.push("At least 2x upside back to the prior high".to_string());
    }

    let score = score.clamp(0.0, 100.0);

    RetracementSignals {
        pump_multiple,
        current_multiple,
        drawdown_percent,
        minutes_since_ath,
        trend,
        risk_level,
        entry_signal: bucket_score(score),
        score,
        reasons,
        warnings,
    }
}

/// Map a clamped score onto its recommendation bucket
fn bucket_score(score: f64) -> EntrySignal {
    if score >= 80.0 {
        EntrySignal::StrongBuy
    } else if score >= 65.0 {
        EntrySignal::Buy
    } else if score >= 45.0 {
        EntrySignal::Watch
    } else {
        EntrySignal::Avoid
    }
}

/// Classify the short-term trend from the most recent snapshots.
///
/// Looks at the sequential fractional market-cap changes over the last
/// `TREND_WINDOW` snapshots: a mean move beyond +-5% is directional, a quiet
/// tape (population std-dev under 3%) is consolidation, anything else is
/// unreadable.
fn classify_trend(history: &std::collections::VecDeque<PriceSnapshot>) -> Trend {
    if history.len() < TREND_MIN_SNAPSHOTS {
        return Trend::Unknown;
    }

    let start = history.len().saturating_sub(TREND_WINDOW);
    let window: Vec<f64> = history.iter().skip(start).map(|s| s.market_cap).collect();

    let changes: Vec<f64> = window
        .windows(2)
        .map(|pair| {
            if pair[0] > 0.0 {
                (pair[1] - pair[0]) / pair[0]
            } else {
                0.0
            }
        })
        .collect();

    let mean = changes.iter().copied().mean();
    if mean > TREND_MOVE_THRESHOLD {
        return Trend::Pumping;
    }
    if mean < -TREND_MOVE_THRESHOLD {
        return Trend::Dumping;
    }

    let std_dev = changes.iter().copied().population_std_dev();
    if std_dev < TREND_CONSOLIDATION_STD_DEV {
        Trend::Consolidating
    } else {
        Trend::Unknown
    }
}

/// Additive risk score bucketed into a level
fn classify_risk(
    liquidity: Option<f64>,
    drawdown_percent: f64,
    trend: Trend,
    pump_multiple: f64,
) -> RiskLevel {
    let mut risk_score: u32 = 0;

    match liquidity {
        Some(liq) if liq < 5_000.0 => risk_score += 3,
        Some(liq) if liq < 10_000.0 => risk_score += 2,
        Some(liq) if liq < 20_000.0 => risk_score += 1,
        Some(_) => {}
        None => risk_score += 2,
    }

    if drawdown_percent > 70.0 {
        risk_score += 2;
    } else if drawdown_percent > 50.0 {
        risk_score += 1;
    }

    if trend == Trend::Dumping {
        risk_score += 2;
    }

    if pump_multiple < 5.0 {
        risk_score += 2;
    }

    match risk_score {
        0..=2 => RiskLevel::Low,
        3..=4 => RiskLevel::Medium,
        5..=6 => RiskLevel::High,
        _ => RiskLevel::Extreme,
    }
}
