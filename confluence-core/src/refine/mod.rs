//! Single-period quick assessment.
//!
//! Works on one candle series instead of a full snapshot: a dual-trend base
//! signal, then the adjustment cascade driven by market conditions, the
//! reliability check and any external corroboration. Each analyzer owns its
//! bounded logs.

pub mod adjust;
pub mod conditions;
pub mod dual_trend;
pub mod reliability;

pub use adjust::{adjust_probability, apply_mode, AdjustInputs, Adjusted, Corroboration, WaveReading};
pub use conditions::{assess_conditions, Adjustments, MarketCondition, MarketConditions};
pub use dual_trend::{analyze_dual_trend, Alignment, BaseSignal, DualTrend, Recommendation};
pub use reliability::{
    check_reliability, QuickCall, ReliabilityCategory, ReliabilityCheck, ReliabilityRecord,
    ReliabilityStats,
};

use crate::config::{AssetClass, EngineConfig};
use crate::domain::{Candle, Signal};
use crate::history::BoundedLog;
use crate::indicators::{Adx, Macd, MacdReading, Rsi};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RefineError {
    #[error("insufficient data: {got} usable candles, need at least {required}")]
    InsufficientData { got: usize, required: usize },
}

/// MACD trend reading for one series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MacdTrend {
    StrongUp,
    StrongDown,
    ModerateUp,
    ModerateDown,
    #[default]
    Neutral,
}

/// Histogram magnitude separating strong from moderate MACD trends.
pub const STRONG_HISTOGRAM: f64 = 0.001;

impl MacdTrend {
    pub fn from_reading(macd: &MacdReading) -> MacdTrend {
        if !macd.valid {
            return MacdTrend::Neutral;
        }
        let h = macd.histogram;
        if h > STRONG_HISTOGRAM && macd.line > macd.signal {
            MacdTrend::StrongUp
        } else if h < -STRONG_HISTOGRAM && macd.line < macd.signal {
            MacdTrend::StrongDown
        } else if h > 0.0 {
            MacdTrend::ModerateUp
        } else if h < 0.0 {
            MacdTrend::ModerateDown
        } else {
            MacdTrend::Neutral
        }
    }
}

impl fmt::Display for MacdTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MacdTrend::StrongUp => "STRONG UP",
            MacdTrend::StrongDown => "STRONG DOWN",
            MacdTrend::ModerateUp => "MODERATE UP",
            MacdTrend::ModerateDown => "MODERATE DOWN",
            MacdTrend::Neutral => "NEUTRAL",
        })
    }
}

/// Histogram-only signal for fast screening.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickMacdSignal {
    pub signal: Signal,
    pub strong: bool,
    pub probability: f64,
    pub reason: String,
}

pub const QUICK_SIGNAL_MIN_CANDLES: usize = 30;

/// None below 30 candles, on an invalid MACD, or inside the ±0.001 band.
pub fn quick_macd_signal(candles: &[Candle], macd: &Macd) -> Option<QuickMacdSignal> {
    if candles.len() < QUICK_SIGNAL_MIN_CANDLES {
        return None;
    }
    let reading = macd.reading(candles);
    if !reading.valid {
        return None;
    }
    let h = reading.histogram;
    let (signal, strong) = if h > 0.002 {
        (Signal::Buy, true)
    } else if h > STRONG_HISTOGRAM {
        (Signal::Buy, false)
    } else if h < -0.002 {
        (Signal::Sell, true)
    } else if h < -STRONG_HISTOGRAM {
        (Signal::Sell, false)
    } else {
        return None;
    };
    let sign = if signal == Signal::Buy { "positive" } else { "negative" };
    let grade = if strong { "strong" } else { "moderate" };
    Some(QuickMacdSignal {
        signal,
        strong,
        probability: if strong { 0.68 } else { 0.62 },
        reason: format!("MACD {sign} {grade} ({h:.4})"),
    })
}

/// Mean last-10 high-low range as a percent of `price`.
pub fn volatility_pct(candles: &[Candle], price: f64) -> f64 {
    if candles.len() < 10 || price.is_nan() || price <= 0.0 {
        return 0.0;
    }
    let recent = &candles[candles.len() - 10..];
    let v = recent.iter().map(|c| c.range() / price * 100.0).sum::<f64>() / 10.0;
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionRecord {
    pub time: DateTime<Utc>,
    pub condition: MarketCondition,
    pub scores: conditions::ConditionScores,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickAssessment {
    pub signal: Signal,
    pub probability: f64,
    pub trend: MacdTrend,
    pub oscillator: f64,
    pub trend_strength: f64,
    pub price: f64,
    pub recent_change_pct: f64,
    pub rule: String,
    pub volatility_pct: f64,
    pub asset_class: Option<AssetClass>,
    pub quick_call: QuickCall,
    pub macd: MacdReading,
    pub dual_trend: DualTrend,
    pub reliability: ReliabilityCheck,
    pub conditions: MarketConditions,
    pub wave_confirms: bool,
    pub converged: bool,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct QuickAnalyzer {
    config: EngineConfig,
    asset_class: Option<AssetClass>,
    rsi: Rsi,
    adx: Adx,
    macd: Macd,
    dual_trend_log: BoundedLog<DualTrend>,
    reliability_log: BoundedLog<ReliabilityRecord>,
    condition_log: BoundedLog<ConditionRecord>,
}

impl QuickAnalyzer {
    pub fn new(config: EngineConfig) -> Self {
        let a = &config.analyzer;
        let h = &config.history;
        Self {
            rsi: Rsi::new(a.rsi_period),
            adx: Adx::new(a.adx_period),
            macd: Macd::histogram(a.macd_fast, a.macd_slow, a.macd_signal),
            dual_trend_log: BoundedLog::new(h.dual_trend_log),
            reliability_log: BoundedLog::new(h.reliability_log),
            condition_log: BoundedLog::new(h.condition_log),
            asset_class: None,
            config,
        }
    }

    /// Analyzer tuned for the asset class detected from `symbol`.
    pub fn for_symbol(config: EngineConfig, symbol: &str) -> Self {
        let mut analyzer = Self::new(config.for_asset(symbol));
        analyzer.asset_class = Some(AssetClass::detect(symbol));
        analyzer
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn macd(&self) -> &Macd {
        &self.macd
    }

    pub fn dual_trend_log(&self) -> &BoundedLog<DualTrend> {
        &self.dual_trend_log
    }

    pub fn reliability_log(&self) -> &BoundedLog<ReliabilityRecord> {
        &self.reliability_log
    }

    pub fn condition_log(&self) -> &BoundedLog<ConditionRecord> {
        &self.condition_log
    }

    pub fn reliability_stats(&self) -> ReliabilityStats {
        ReliabilityStats::from_log(&self.reliability_log)
    }

    pub fn analyze(
        &mut self,
        candles: &[Candle],
        corroboration: &Corroboration,
    ) -> Result<QuickAssessment, RefineError> {
        let candles: Vec<Candle> = candles.iter().filter(|c| !c.is_void()).cloned().collect();
        let required = self.config.refine.min_candles.max(2);
        if candles.len() < required {
            return Err(RefineError::InsufficientData {
                got: candles.len(),
                required,
            });
        }

        let n = candles.len();
        let price = candles[n - 1].close;
        let previous = candles[n - 2].close;
        let last_closed = &candles[n - 2];
        let time = candles[n - 1].time;

        let conditions = assess_conditions(&candles, self.config.refine.min_candles);
        self.condition_log.push(ConditionRecord {
            time,
            condition: conditions.condition,
            scores: conditions.scores,
        });

        let oscillator = self.rsi.value(&candles);
        let trend_strength = self.adx.value(&candles);
        let macd = self.macd.reading(&candles);
        let volatility = volatility_pct(&candles, price);
        let trend = MacdTrend::from_reading(&macd);

        let dual = analyze_dual_trend(price, previous, &macd, oscillator, trend_strength, last_closed);
        self.dual_trend_log.push(dual.clone());
        let base = dual.base_signal();

        let adjusted = adjust_probability(
            &AdjustInputs {
                signal: base.signal,
                probability: base.probability,
                candles: &candles,
                histogram: macd.histogram,
                oscillator,
                volatility_pct: volatility,
                adjustments: &conditions.adjustments,
                mode: self.config.refine.mode,
                min_probability: self.config.refine.min_probability,
            },
            corroboration,
        );

        if adjusted.reliability.category != ReliabilityCategory::InsufficientData {
            self.reliability_log.push(ReliabilityRecord {
                time,
                signal: adjusted.signal,
                reliable: adjusted.reliability.reliable,
                category: adjusted.reliability.category,
            });
        }

        let mut rule = base.reason;
        for note in &adjusted.notes {
            rule.push_str(" | ");
            rule.push_str(note);
        }

        debug!(
            condition = %conditions.condition,
            alignment = %dual.alignment,
            base_signal = %base.signal,
            base_probability = base.probability,
            reliable = adjusted.reliability.reliable,
            "quick assessment inputs"
        );
        info!(
            signal = %adjusted.signal,
            probability = adjusted.probability,
            trend = %trend,
            "quick assessment complete"
        );

        Ok(QuickAssessment {
            signal: adjusted.signal,
            probability: adjusted.probability,
            trend,
            oscillator,
            trend_strength,
            price,
            recent_change_pct: dual.short.change_pct,
            rule,
            volatility_pct: volatility,
            asset_class: self.asset_class,
            quick_call: QuickCall::from_readings(macd.histogram, oscillator),
            macd,
            dual_trend: dual,
            reliability: adjusted.reliability,
            conditions,
            wave_confirms: adjusted.wave_confirms,
            converged: adjusted.converged,
            time,
        })
    }
}

impl Default for QuickAnalyzer {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
