//! Engine configuration: every threshold the decision path and regime gate use.
//!
//! Each section carries `#[serde(default)]`, so a TOML file only needs the keys
//! it overrides. `validate()` rejects combinations the engine cannot honor.

use crate::domain::Period;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub analyzer: AnalyzerConfig,
    pub weights: PeriodWeights,
    pub cascade: CascadeConfig,
    pub probability: ProbabilityConfig,
    pub levels: LevelConfig,
    pub regime: RegimeConfig,
    pub exhaustion: ExhaustionConfig,
    pub pullback: PullbackConfig,
    pub refine: RefineConfig,
    pub history: HistoryConfig,
}

impl EngineConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Apply the per-asset-class profile detected from `symbol`.
    pub fn for_asset(mut self, symbol: &str) -> Self {
        let profile = AssetProfile::for_class(AssetClass::detect(symbol));
        self.pullback.atr_multiplier = profile.atr_multiplier;
        self.exhaustion.oscillator_low = profile.oscillator_extreme_low;
        self.exhaustion.oscillator_high = profile.oscillator_extreme_high;
        self.refine.min_probability = profile.min_probability;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let a = &self.analyzer;
        if a.rsi_period == 0 || a.adx_period == 0 || a.macd_fast == 0 || a.macd_signal == 0 {
            return Err(ConfigError::Invalid("indicator periods must be positive".into()));
        }
        if a.macd_slow <= a.macd_fast {
            return Err(ConfigError::Invalid(format!(
                "macd_slow ({}) must exceed macd_fast ({})",
                a.macd_slow, a.macd_fast
            )));
        }
        if a.oscillator_low >= a.oscillator_high {
            return Err(ConfigError::Invalid("analyzer oscillator band is inverted".into()));
        }
        if self.regime.oversold >= self.regime.overbought {
            return Err(ConfigError::Invalid("regime oscillator band is inverted".into()));
        }
        if self.exhaustion.oscillator_low >= self.exhaustion.oscillator_high {
            return Err(ConfigError::Invalid("exhaustion oscillator band is inverted".into()));
        }

        let sum = self.weights.sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(ConfigError::Invalid(format!(
                "period weights must sum to 1.0, got {sum}"
            )));
        }
        if Period::ALL.iter().any(|p| self.weights.weight(*p) < 0.0) {
            return Err(ConfigError::Invalid("period weights must be non-negative".into()));
        }

        let p = &self.probability;
        if p.min >= p.max {
            return Err(ConfigError::Invalid("probability clamp is inverted".into()));
        }
        if self.levels.level_floor <= 0.0 {
            return Err(ConfigError::Invalid("level_floor must be positive".into()));
        }
        if self.pullback.window < 2 || self.pullback.atr_period < 2 {
            return Err(ConfigError::Invalid(
                "pullback window and atr_period must be at least 2".into(),
            ));
        }
        if self.exhaustion.min_signs == 0 {
            return Err(ConfigError::Invalid("exhaustion min_signs must be positive".into()));
        }
        Ok(())
    }
}

/// Per-period analyzer thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub min_candles: usize,
    pub rsi_period: usize,
    pub adx_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    /// Trend-label bands, checked in order: very strong, strong, moderate, weak.
    pub trend_very_strong: f64,
    pub trend_strong: f64,
    pub trend_moderate: f64,
    pub trend_weak: f64,
    /// Histogram magnitude above which momentum counts as strong.
    pub strong_momentum: f64,
    /// Deadband around zero inside which the histogram reads neutral.
    pub momentum_deadband: f64,
    pub strong_momentum_bonus: f64,
    pub momentum_bonus: f64,
    pub oscillator_low: f64,
    pub oscillator_high: f64,
    pub oscillator_bonus: f64,
    pub volume_strong_bonus: f64,
    pub volume_bonus: f64,
    /// Candles back for the change percentage.
    pub change_lookback: usize,
    /// Readings reported by a degraded (insufficient history) analysis.
    pub default_oscillator: f64,
    pub default_trend_strength: f64,
    /// Additive strength points by trend-strength tier, highest tier first.
    pub strength_tiers: Vec<StrengthTier>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrengthTier {
    pub min_trend_strength: f64,
    pub points: f64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            min_candles: 20,
            rsi_period: 14,
            adx_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            trend_very_strong: 50.0,
            trend_strong: 40.0,
            trend_moderate: 25.0,
            trend_weak: 20.0,
            strong_momentum: 0.001,
            momentum_deadband: 1e-9,
            strong_momentum_bonus: 30.0,
            momentum_bonus: 20.0,
            oscillator_low: 30.0,
            oscillator_high: 70.0,
            oscillator_bonus: 10.0,
            volume_strong_bonus: 15.0,
            volume_bonus: 5.0,
            change_lookback: 10,
            default_oscillator: 50.0,
            default_trend_strength: 20.0,
            strength_tiers: vec![
                StrengthTier { min_trend_strength: 50.0, points: 50.0 },
                StrengthTier { min_trend_strength: 40.0, points: 40.0 },
                StrengthTier { min_trend_strength: 30.0, points: 30.0 },
                StrengthTier { min_trend_strength: 25.0, points: 20.0 },
                StrengthTier { min_trend_strength: 20.0, points: 10.0 },
            ],
        }
    }
}

/// Relative importance of each period. Coarser periods weigh more.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeriodWeights {
    #[serde(rename = "24h")]
    pub d1: f64,
    #[serde(rename = "4h")]
    pub h4: f64,
    #[serde(rename = "1h")]
    pub h1: f64,
    #[serde(rename = "30m")]
    pub m30: f64,
    #[serde(rename = "15m")]
    pub m15: f64,
    #[serde(rename = "5m")]
    pub m5: f64,
}

impl Default for PeriodWeights {
    fn default() -> Self {
        Self {
            d1: 0.35,
            h4: 0.25,
            h1: 0.20,
            m30: 0.10,
            m15: 0.06,
            m5: 0.04,
        }
    }
}

impl PeriodWeights {
    pub fn weight(&self, period: Period) -> f64 {
        match period {
            Period::D1 => self.d1,
            Period::H4 => self.h4,
            Period::H1 => self.h1,
            Period::M30 => self.m30,
            Period::M15 => self.m15,
            Period::M5 => self.m5,
        }
    }

    pub fn sum(&self) -> f64 {
        Period::ALL.iter().map(|p| self.weight(*p)).sum()
    }
}

/// Priority cascade gates and the periods each rule inspects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CascadeConfig {
    pub dominant_period: Period,
    pub mid_period: Period,
    pub fine_period: Period,
    pub dominant_trend_strength: f64,
    pub mid_trend_strength: f64,
    pub fallback_trend_strength: f64,
    /// Either side above this escalates a divergence to HIGH.
    pub divergence_escalation: f64,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            dominant_period: Period::D1,
            mid_period: Period::H4,
            fine_period: Period::H1,
            dominant_trend_strength: 50.0,
            mid_trend_strength: 40.0,
            fallback_trend_strength: 30.0,
            divergence_escalation: 40.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbabilityConfig {
    pub base: f64,
    pub margin_cap: f64,
    pub sequence_cap: f64,
    pub sequence_divisor: f64,
    pub priority_bonus: f64,
    pub divergence_step: f64,
    pub divergence_cap: f64,
    pub min: f64,
    pub max: f64,
    /// Force margin above which the aggregator winner becomes the final signal.
    pub final_signal_margin: f64,
}

impl Default for ProbabilityConfig {
    fn default() -> Self {
        Self {
            base: 50.0,
            margin_cap: 20.0,
            sequence_cap: 25.0,
            sequence_divisor: 4.0,
            priority_bonus: 10.0,
            divergence_step: 5.0,
            divergence_cap: 15.0,
            min: 10.0,
            max: 90.0,
            final_signal_margin: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    /// Lower bound on the trend-strength volatility proxy.
    pub min_volatility: f64,
    /// Absolute lower bound on the final volatility proxy.
    pub volatility_floor: f64,
    /// Multiplier applied to the average last-candle range ratio.
    pub range_factor: f64,
    /// Used when no last-candle range is available.
    pub default_range_ratio: f64,
    pub multipliers: [f64; 3],
    pub stop_multiplier: f64,
    pub level_floor: f64,
    /// Offsets for the price-only fallback levels.
    pub fallback_steps: [f64; 3],
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            min_volatility: 0.005,
            volatility_floor: 0.01,
            range_factor: 2.0,
            default_range_ratio: 0.01,
            multipliers: [1.0, 1.5, 2.0],
            stop_multiplier: 1.5,
            level_floor: 1.0,
            fallback_steps: [0.01, 0.02, 0.03],
        }
    }
}

/// Regime classifier thresholds and the periods its descriptors come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimeConfig {
    pub trend_strength: f64,
    pub range_strength: f64,
    pub oversold: f64,
    pub overbought: f64,
    pub structural_magnitude: f64,
    pub composite_gate: f64,
    pub structural_period: Period,
    pub momentum_period: Period,
    pub quality_period: Period,
    pub alignment_bonus: f64,
    pub correction_bonus: f64,
    pub confirmation_bonus: f64,
    pub quality_bonus: f64,
    pub exhaustion_factor: f64,
}

impl Default for RegimeConfig {
    fn default() -> Self {
        Self {
            trend_strength: 25.0,
            range_strength: 20.0,
            oversold: 30.0,
            overbought: 70.0,
            structural_magnitude: 0.0005,
            composite_gate: 60.0,
            structural_period: Period::H4,
            momentum_period: Period::H1,
            quality_period: Period::M15,
            alignment_bonus: 30.0,
            correction_bonus: 20.0,
            confirmation_bonus: 20.0,
            quality_bonus: 15.0,
            exhaustion_factor: 0.7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExhaustionConfig {
    pub min_candles: usize,
    pub min_signs: usize,
    pub shadow_ratio: f64,
    pub oscillator_low: f64,
    pub oscillator_high: f64,
    /// Histogram samples handed to the detector.
    pub histogram_samples: usize,
}

impl Default for ExhaustionConfig {
    fn default() -> Self {
        Self {
            min_candles: 5,
            min_signs: 2,
            shadow_ratio: 1.5,
            oscillator_low: 30.0,
            oscillator_high: 70.0,
            histogram_samples: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PullbackConfig {
    pub window: usize,
    pub min_counter_candles: usize,
    pub atr_period: usize,
    pub atr_multiplier: f64,
    pub confidence_step: f64,
    pub confidence_cap: f64,
    pub max_age_secs: i64,
}

impl Default for PullbackConfig {
    fn default() -> Self {
        Self {
            window: 5,
            min_counter_candles: 2,
            atr_period: 14,
            atr_multiplier: 0.5,
            confidence_step: 20.0,
            confidence_cap: 80.0,
            max_age_secs: 300,
        }
    }
}

/// How the final probability filter treats marginal setups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradingMode {
    Conservative,
    #[default]
    Normal,
    Aggressive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefineConfig {
    pub min_candles: usize,
    pub mode: TradingMode,
    /// Conservative mode floors anything below this to the rejection value.
    pub min_probability: f64,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            min_candles: 50,
            mode: TradingMode::Normal,
            min_probability: 0.55,
        }
    }
}

/// Capacities of the bounded logs owned by the engines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub signal_log: usize,
    pub exhaustion_log: usize,
    pub zone_log: usize,
    pub reliability_log: usize,
    pub dual_trend_log: usize,
    pub condition_log: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            signal_log: 100,
            exhaustion_log: 20,
            zone_log: 50,
            reliability_log: 50,
            dual_trend_log: 100,
            condition_log: 100,
        }
    }
}

/// Asset class inferred from a trading symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    VolatilityIndex,
    Commodity,
    Crypto,
    Index,
}

impl AssetClass {
    pub fn detect(symbol: &str) -> AssetClass {
        let s = symbol.trim().to_ascii_uppercase();
        if s.starts_with("R_") {
            AssetClass::VolatilityIndex
        } else if s.contains("XAU") || s.contains("XAG") || s.contains("OIL") {
            AssetClass::Commodity
        } else if s.contains("CRY") {
            AssetClass::Crypto
        } else {
            AssetClass::Index
        }
    }
}

/// Per-class tuning table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetProfile {
    pub class: AssetClass,
    pub name: String,
    pub oscillator_low: f64,
    pub oscillator_high: f64,
    pub oscillator_extreme_low: f64,
    pub oscillator_extreme_high: f64,
    pub min_probability: f64,
    pub aggressiveness: f64,
    pub atr_multiplier: f64,
    pub default_stop_pct: f64,
    pub default_target_pct: f64,
}

impl AssetProfile {
    pub fn for_class(class: AssetClass) -> AssetProfile {
        let (name, ext_low, ext_high, min_prob, aggr, atr, stop, target) = match class {
            AssetClass::Commodity => ("Commodity", 12.0, 88.0, 0.55, 1.2, 2.5, 1.2, 3.5),
            AssetClass::Index => ("Index", 15.0, 90.0, 0.50, 1.0, 1.8, 0.8, 2.5),
            AssetClass::VolatilityIndex => ("Volatility Index", 20.0, 85.0, 0.48, 1.5, 2.0, 0.3, 1.0),
            AssetClass::Crypto => ("Crypto", 18.0, 82.0, 0.52, 1.3, 2.2, 0.5, 2.0),
        };
        AssetProfile {
            class,
            name: name.to_string(),
            oscillator_low: 20.0,
            oscillator_high: 80.0,
            oscillator_extreme_low: ext_low,
            oscillator_extreme_high: ext_high,
            min_probability: min_prob,
            aggressiveness: aggr,
            atr_multiplier: atr,
            default_stop_pct: stop,
            default_target_pct: target,
        }
    }
}
