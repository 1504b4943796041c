//! Market-condition reading: trend, volatility, momentum and consolidation
//! scores mapped to a condition and its probability multipliers.

use crate::domain::Candle;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketCondition {
    Consolidation,
    HighVolatility,
    StrongBullishMomentum,
    StrongBearishMomentum,
    Uptrend,
    Downtrend,
    Volatile,
    #[default]
    Neutral,
}

impl fmt::Display for MarketCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MarketCondition::Consolidation => "CONSOLIDATION",
            MarketCondition::HighVolatility => "HIGH VOLATILITY",
            MarketCondition::StrongBullishMomentum => "STRONG BULLISH MOMENTUM",
            MarketCondition::StrongBearishMomentum => "STRONG BEARISH MOMENTUM",
            MarketCondition::Uptrend => "UPTREND",
            MarketCondition::Downtrend => "DOWNTREND",
            MarketCondition::Volatile => "VOLATILE",
            MarketCondition::Neutral => "NEUTRAL",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Grade {
    Strong,
    #[default]
    Moderate,
    Weak,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VolatilityLevel {
    High,
    #[default]
    Medium,
    Low,
}

/// Raw scores behind a condition.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ConditionScores {
    /// -1, 0 or 1 from price against a short and a long mean.
    pub trend: f64,
    /// Mean last-10 range as percent of close.
    pub volatility: f64,
    /// 5-candle percent change divided by 10.
    pub momentum: f64,
    /// 1, 0.5 or 0 as the 20-candle relative range tightens.
    pub consolidation: f64,
}

/// Multipliers applied per condition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Adjustments {
    pub trend_strength: f64,
    pub periods: f64,
    pub indicators: f64,
    pub oscillator: f64,
    pub sensitivity: f64,
    pub aggressiveness: f64,
}

impl Default for Adjustments {
    /// Used when there is too little history to read the market.
    fn default() -> Self {
        Self {
            trend_strength: 1.0,
            periods: 1.0,
            indicators: 1.0,
            oscillator: 1.0,
            sensitivity: 1.3,
            aggressiveness: 1.2,
        }
    }
}

impl Adjustments {
    pub fn for_condition(condition: MarketCondition) -> Self {
        let (trend_strength, periods, indicators, sensitivity, aggressiveness) = match condition {
            MarketCondition::Consolidation => (0.6, 1.0, 0.8, 1.1, 0.8),
            MarketCondition::HighVolatility => (1.0, 0.9, 1.0, 1.0, 0.9),
            MarketCondition::Uptrend | MarketCondition::Downtrend => (1.2, 1.2, 1.3, 1.3, 1.3),
            MarketCondition::StrongBullishMomentum | MarketCondition::StrongBearishMomentum => {
                (1.0, 1.1, 1.5, 1.5, 1.7)
            }
            MarketCondition::Volatile => (0.9, 1.0, 1.1, 1.1, 1.0),
            MarketCondition::Neutral => (0.8, 1.1, 1.1, 1.1, 1.1),
        };
        Self {
            trend_strength,
            periods,
            indicators,
            oscillator: 1.0,
            sensitivity,
            aggressiveness,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MarketConditions {
    pub scores: ConditionScores,
    pub condition: MarketCondition,
    pub trend_grade: Grade,
    pub volatility_level: VolatilityLevel,
    pub adjustments: Adjustments,
    /// False when history was too short and defaults apply.
    pub measured: bool,
}

/// Read the market over `candles`. Fewer than `min_candles` yields the
/// default multipliers with `measured == false`.
pub fn assess_conditions(candles: &[Candle], min_candles: usize) -> MarketConditions {
    if candles.len() < min_candles.max(1) {
        return MarketConditions::default();
    }
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let scores = ConditionScores {
        trend: trend_score(&closes),
        volatility: mean_range_pct(candles, 10),
        momentum: momentum_score(&closes),
        consolidation: consolidation_score(candles),
    };
    let condition = classify(&scores);
    let trend_grade = if scores.trend.abs() > 0.3 {
        Grade::Strong
    } else if scores.trend.abs() > 0.15 {
        Grade::Moderate
    } else {
        Grade::Weak
    };
    let volatility_level = if scores.volatility > 1.5 {
        VolatilityLevel::High
    } else if scores.volatility > 0.5 {
        VolatilityLevel::Medium
    } else {
        VolatilityLevel::Low
    };
    MarketConditions {
        scores,
        condition,
        trend_grade,
        volatility_level,
        adjustments: Adjustments::for_condition(condition),
        measured: true,
    }
}

fn classify(s: &ConditionScores) -> MarketCondition {
    if s.consolidation > 0.7 {
        MarketCondition::Consolidation
    } else if s.volatility > 2.0 {
        MarketCondition::HighVolatility
    } else if s.momentum.abs() > 2.0 {
        if s.momentum > 0.0 {
            MarketCondition::StrongBullishMomentum
        } else {
            MarketCondition::StrongBearishMomentum
        }
    } else if s.trend > 0.3 {
        MarketCondition::Uptrend
    } else if s.trend < -0.3 {
        MarketCondition::Downtrend
    } else if s.volatility > 1.0 {
        MarketCondition::Volatile
    } else {
        MarketCondition::Neutral
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn trend_score(closes: &[f64]) -> f64 {
    if closes.len() < 20 {
        return 0.0;
    }
    let short = (closes.len() / 5).min(10);
    let long = (closes.len() / 2).min(20);
    let price = closes[closes.len() - 1];
    let above_short = if price > mean(&closes[closes.len() - short..]) { 0.5 } else { 0.0 };
    let above_long = if price > mean(&closes[closes.len() - long..]) { 0.5 } else { 0.0 };
    (above_short + above_long) * 2.0 - 1.0
}

/// Mean high-low range of the last `window` candles, percent of close.
pub fn mean_range_pct(candles: &[Candle], window: usize) -> f64 {
    if candles.len() < window || window == 0 {
        return 0.0;
    }
    let ranges: Vec<f64> = candles[candles.len() - window..]
        .iter()
        .filter(|c| c.close != 0.0)
        .map(|c| c.range() / c.close * 100.0)
        .collect();
    let v = mean(&ranges);
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

fn momentum_score(closes: &[f64]) -> f64 {
    if closes.len() < 5 {
        return 0.0;
    }
    let current = closes[closes.len() - 1];
    let reference = closes[closes.len() - 5];
    if reference == 0.0 {
        return 0.0;
    }
    (current - reference) / reference * 100.0 / 10.0
}

fn consolidation_score(candles: &[Candle]) -> f64 {
    if candles.len() < 20 {
        return 0.0;
    }
    let recent = &candles[candles.len() - 20..];
    let ranges: Vec<f64> = recent.iter().map(Candle::range).collect();
    let closes: Vec<f64> = recent.iter().map(|c| c.close).collect();
    let average_price = mean(&closes);
    if average_price == 0.0 {
        return 0.0;
    }
    let relative = mean(&ranges) / average_price;
    if relative < 0.005 {
        1.0
    } else if relative < 0.01 {
        0.5
    } else {
        0.0
    }
}
