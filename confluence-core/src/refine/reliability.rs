//! Reliability check: does the last closed candle and momentum back a signal?

use crate::domain::{Candle, Signal};
use crate::history::BoundedLog;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReliabilityCategory {
    Consistent,
    Alert,
    BullishInconsistency,
    BearishInconsistency,
    InsufficientData,
}

impl fmt::Display for ReliabilityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReliabilityCategory::Consistent => "CONSISTENT",
            ReliabilityCategory::Alert => "ALERT",
            ReliabilityCategory::BullishInconsistency => "BULLISH INCONSISTENCY",
            ReliabilityCategory::BearishInconsistency => "BEARISH INCONSISTENCY",
            ReliabilityCategory::InsufficientData => "INSUFFICIENT DATA",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReliabilityCheck {
    pub reliable: bool,
    pub category: ReliabilityCategory,
    pub action: String,
    pub reason: String,
}

impl ReliabilityCheck {
    fn unreliable(category: ReliabilityCategory, action: &str, reason: &str) -> Self {
        Self {
            reliable: false,
            category,
            action: action.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Check `signal` against the last closed candle (second to last) and the
/// histogram/oscillator pair.
pub fn check_reliability(
    signal: Signal,
    candles: &[Candle],
    histogram: f64,
    oscillator: f64,
) -> ReliabilityCheck {
    if candles.len() < 2 {
        return ReliabilityCheck::unreliable(
            ReliabilityCategory::InsufficientData,
            "WAIT",
            "not enough candles",
        );
    }
    let last_closed = &candles[candles.len() - 2];
    let red = last_closed.is_bearish();

    match signal {
        Signal::Buy if red => {
            return ReliabilityCheck::unreliable(
                ReliabilityCategory::BullishInconsistency,
                "WAIT for confirmation",
                "BUY signal on a red candle, possible correction",
            )
        }
        Signal::Sell if !red => {
            return ReliabilityCheck::unreliable(
                ReliabilityCategory::BearishInconsistency,
                "WAIT for confirmation",
                "SELL signal on a green candle, possible reversal",
            )
        }
        _ => {}
    }

    let mut reliable = true;
    let mut action = format!("{signal} normal");
    let mut reason = if red {
        "red candle confirms the decline"
    } else {
        "green candle confirms the rise"
    };

    match signal {
        Signal::Buy => {
            if histogram < 0.1 && oscillator > 70.0 {
                reliable = false;
                action = "WAIT (overbought)".into();
                reason = "weak MACD with elevated RSI";
            } else if histogram < 0.0 {
                reliable = false;
                action = "SELL or exit".into();
                reason = "negative MACD signals bearish momentum";
            }
        }
        Signal::Sell => {
            if histogram > -0.1 && oscillator < 30.0 {
                reliable = false;
                action = "WAIT (oversold)".into();
                reason = "weak MACD with depressed RSI";
            } else if histogram > 0.0 {
                reliable = false;
                action = "BUY or exit".into();
                reason = "positive MACD signals bullish momentum";
            }
        }
        Signal::Hold => {}
    }

    ReliabilityCheck {
        reliable,
        category: if reliable {
            ReliabilityCategory::Consistent
        } else {
            ReliabilityCategory::Alert
        },
        action,
        reason: reason.to_string(),
    }
}

/// Quick decision table keyed by MACD histogram and oscillator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuickCall {
    ReliableBuy,
    ModerateBuy,
    CautiousBuy,
    DoNotEnter,
    ConsiderSell,
    NeedsAnalysis,
}

impl QuickCall {
    /// Rows are checked top to bottom.
    pub fn from_readings(histogram: f64, oscillator: f64) -> QuickCall {
        if histogram > 1.0 && oscillator < 60.0 {
            QuickCall::ReliableBuy
        } else if histogram > 0.5 && oscillator < 65.0 {
            QuickCall::ModerateBuy
        } else if histogram > 0.1 && oscillator < 70.0 {
            QuickCall::CautiousBuy
        } else if histogram < 0.1 && oscillator > 70.0 {
            QuickCall::DoNotEnter
        } else if histogram < 0.0 {
            QuickCall::ConsiderSell
        } else {
            QuickCall::NeedsAnalysis
        }
    }
}

impl fmt::Display for QuickCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            QuickCall::ReliableBuy => "BUY (reliable)",
            QuickCall::ModerateBuy => "BUY (moderate)",
            QuickCall::CautiousBuy => "BUY (with caution)",
            QuickCall::DoNotEnter => "DO NOT ENTER (review)",
            QuickCall::ConsiderSell => "CONSIDER SELL",
            QuickCall::NeedsAnalysis => "FURTHER ANALYSIS",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReliabilityRecord {
    pub time: DateTime<Utc>,
    pub signal: Signal,
    pub reliable: bool,
    pub category: ReliabilityCategory,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReliabilityStats {
    pub total: usize,
    pub reliable: usize,
    /// Percent of logged checks that were reliable.
    pub rate: f64,
    pub last_category: Option<ReliabilityCategory>,
}

impl ReliabilityStats {
    pub fn from_log(log: &BoundedLog<ReliabilityRecord>) -> Self {
        if log.is_empty() {
            return Self::default();
        }
        let total = log.len();
        let reliable = log.iter().filter(|r| r.reliable).count();
        Self {
            total,
            reliable,
            rate: reliable as f64 / total as f64 * 100.0,
            last_category: log.latest().map(|r| r.category),
        }
    }
}
