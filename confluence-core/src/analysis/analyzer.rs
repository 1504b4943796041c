//! Per-period analyzer: raw candles in, a normalized `PeriodAnalysis` out.
//!
//! Never fails. Too little history, void candles, or NaN indicator output all
//! degrade to named defaults so a cycle always completes.

use crate::config::AnalyzerConfig;
use crate::domain::{Candle, MomentumLabel, Period, PeriodSnapshot, Signal, TrendLabel};
use crate::indicators::{confirm_volume, Adx, Macd, MacdReading, Rsi, VolumeConfirmation, VolumeStrength};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Normalized view of one period, recomputed every cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodAnalysis {
    pub period: Period,
    pub price: f64,
    pub signal: Signal,
    pub strength: f64,
    pub trend: TrendLabel,
    pub oscillator: f64,
    pub trend_strength: f64,
    pub momentum: MomentumLabel,
    pub macd: MacdReading,
    pub volume: VolumeConfirmation,
    pub change_pct: f64,
    pub last_candle: Option<Candle>,
    /// True when the analysis is the neutral default.
    pub degraded: bool,
}

impl PeriodAnalysis {
    /// Neutral default: HOLD, strength 0, neutral readings.
    pub fn neutral(period: Period, config: &AnalyzerConfig) -> Self {
        Self {
            period,
            price: 0.0,
            signal: Signal::Hold,
            strength: 0.0,
            trend: TrendLabel::Lateral,
            oscillator: config.default_oscillator,
            trend_strength: config.default_trend_strength,
            momentum: MomentumLabel::Neutral,
            macd: MacdReading::default(),
            volume: VolumeConfirmation::default(),
            change_pct: 0.0,
            last_candle: None,
            degraded: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PeriodAnalyzer {
    config: AnalyzerConfig,
    rsi: Rsi,
    adx: Adx,
    macd: Macd,
}

impl PeriodAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        let rsi = Rsi::new(config.rsi_period);
        let adx = Adx::new(config.adx_period);
        let macd = Macd::histogram(config.macd_fast, config.macd_slow, config.macd_signal);
        Self {
            config,
            rsi,
            adx,
            macd,
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn analyze(&self, period: Period, snapshot: &PeriodSnapshot) -> PeriodAnalysis {
        let candles: Vec<Candle> = snapshot
            .candles
            .iter()
            .filter(|c| !c.is_void())
            .cloned()
            .collect();

        if candles.len() < self.config.min_candles {
            warn!(
                period = %period,
                candles = candles.len(),
                required = self.config.min_candles,
                "insufficient history, using neutral analysis"
            );
            return PeriodAnalysis::neutral(period, &self.config);
        }

        let price = candles
            .last()
            .map(|c| c.close)
            .filter(|p| p.is_finite() && *p > 0.0)
            .unwrap_or_else(|| snapshot.effective_price());

        let oscillator = finite_or(self.rsi.value(&candles), self.config.default_oscillator);
        let trend_strength = finite_or(self.adx.value(&candles), self.config.default_trend_strength);
        let macd = self.macd.reading(&candles);
        let volume = confirm_volume(&candles);

        let trend = self.trend_label(trend_strength);
        let momentum = self.momentum_label(&macd);
        let signal = momentum.bias().to_signal();
        let strength = self.strength(trend_strength, momentum, signal, oscillator, &volume);
        let change_pct = self.change_pct(&candles, price);

        debug!(
            period = %period,
            signal = %signal,
            strength,
            trend_strength,
            oscillator,
            histogram = macd.histogram,
            "period analyzed"
        );

        PeriodAnalysis {
            period,
            price,
            signal,
            strength,
            trend,
            oscillator,
            trend_strength,
            momentum,
            macd,
            volume,
            change_pct,
            last_candle: candles.last().cloned(),
            degraded: false,
        }
    }

    fn trend_label(&self, trend_strength: f64) -> TrendLabel {
        let c = &self.config;
        if trend_strength >= c.trend_very_strong {
            TrendLabel::VeryStrong
        } else if trend_strength >= c.trend_strong {
            TrendLabel::Strong
        } else if trend_strength >= c.trend_moderate {
            TrendLabel::Moderate
        } else if trend_strength >= c.trend_weak {
            TrendLabel::Weak
        } else {
            TrendLabel::Lateral
        }
    }

    fn momentum_label(&self, macd: &MacdReading) -> MomentumLabel {
        let c = &self.config;
        let hist = macd.histogram;
        if !macd.valid || !hist.is_finite() {
            return MomentumLabel::Neutral;
        }
        if hist > c.strong_momentum && macd.line > macd.signal {
            MomentumLabel::StrongBullish
        } else if hist > c.momentum_deadband {
            MomentumLabel::Bullish
        } else if hist < -c.strong_momentum && macd.line < macd.signal {
            MomentumLabel::StrongBearish
        } else if hist < -c.momentum_deadband {
            MomentumLabel::Bearish
        } else {
            MomentumLabel::Neutral
        }
    }

    fn strength(
        &self,
        trend_strength: f64,
        momentum: MomentumLabel,
        signal: Signal,
        oscillator: f64,
        volume: &VolumeConfirmation,
    ) -> f64 {
        let c = &self.config;
        let mut strength = c
            .strength_tiers
            .iter()
            .find(|t| trend_strength >= t.min_trend_strength)
            .map_or(0.0, |t| t.points);

        strength += match momentum {
            MomentumLabel::StrongBullish | MomentumLabel::StrongBearish => c.strong_momentum_bonus,
            MomentumLabel::Bullish | MomentumLabel::Bearish => c.momentum_bonus,
            MomentumLabel::Neutral => 0.0,
        };

        if signal.is_directional() && oscillator > c.oscillator_low && oscillator < c.oscillator_high {
            strength += c.oscillator_bonus;
        }

        if volume.confirmed {
            strength += match volume.strength {
                Some(VolumeStrength::Strong) => c.volume_strong_bonus,
                _ => c.volume_bonus,
            };
        }

        finite_or(strength, 0.0).clamp(0.0, 100.0)
    }

    fn change_pct(&self, candles: &[Candle], price: f64) -> f64 {
        let lookback = self.config.change_lookback;
        if lookback == 0 || candles.len() < lookback {
            return 0.0;
        }
        let reference = candles[candles.len() - lookback].close;
        if reference == 0.0 || !reference.is_finite() {
            return 0.0;
        }
        finite_or((price - reference) / reference * 100.0, 0.0)
    }
}

fn finite_or(value: f64, default: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        default
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_candles;

    fn analyzer() -> PeriodAnalyzer {
        PeriodAnalyzer::new(AnalyzerConfig::default())
    }

    fn trending(n: usize, step: f64) -> PeriodSnapshot {
        let closes: Vec<f64> = (0..n).map(|i| 1000.0 + i as f64 * step).collect();
        PeriodSnapshot::from_candles(make_candles(&closes))
    }

    #[test]
    fn short_history_is_neutral_default() {
        let a = analyzer().analyze(Period::H1, &trending(10, 1.0));
        assert!(a.degraded);
        assert_eq!(a.signal, Signal::Hold);
        assert_eq!(a.strength, 0.0);
        assert_eq!(a.oscillator, 50.0);
        assert_eq!(a.trend_strength, 20.0);
    }

    #[test]
    fn void_candles_do_not_count() {
        let mut snap = trending(25, 1.0);
        for c in snap.candles.iter_mut().take(10) {
            c.close = f64::NAN;
        }
        assert!(analyzer().analyze(Period::H1, &snap).degraded);
    }

    #[test]
    fn accelerating_uptrend_reads_buy() {
        // Quadratic growth keeps the MACD histogram positive.
        let closes: Vec<f64> = (0..80).map(|i| 1000.0 + (i * i) as f64 * 0.5).collect();
        let a = analyzer().analyze(Period::H4, &PeriodSnapshot::from_candles(make_candles(&closes)));
        assert!(!a.degraded);
        assert_eq!(a.signal, Signal::Buy);
        assert_eq!(a.momentum, MomentumLabel::StrongBullish);
        assert_eq!(a.trend, TrendLabel::VeryStrong);
        // 50 (tier) + 30 (strong momentum); oscillator pinned at 100 gives no bonus
        assert_eq!(a.strength, 80.0);
    }

    #[test]
    fn decelerating_downtrend_reads_sell() {
        let closes: Vec<f64> = (0..80).map(|i| 5000.0 - (i * i) as f64 * 0.5).collect();
        let a = analyzer().analyze(Period::H4, &PeriodSnapshot::from_candles(make_candles(&closes)));
        assert_eq!(a.signal, Signal::Sell);
        assert!(a.change_pct < 0.0);
    }

    #[test]
    fn strength_tiers_and_bonuses() {
        let an = analyzer();
        let weak_volume = VolumeConfirmation::default();
        assert_eq!(
            an.strength(22.0, MomentumLabel::Bullish, Signal::Buy, 50.0, &weak_volume),
            10.0 + 20.0 + 10.0
        );
        let strong_volume = VolumeConfirmation {
            confirmed: true,
            strength: Some(VolumeStrength::Strong),
            reason: String::new(),
            tendency: None,
        };
        assert_eq!(
            an.strength(45.0, MomentumLabel::StrongBearish, Signal::Sell, 80.0, &strong_volume),
            40.0 + 30.0 + 15.0
        );
        assert_eq!(
            an.strength(10.0, MomentumLabel::Neutral, Signal::Hold, 50.0, &weak_volume),
            0.0
        );
    }

    #[test]
    fn trend_label_bands() {
        let an = analyzer();
        assert_eq!(an.trend_label(55.0), TrendLabel::VeryStrong);
        assert_eq!(an.trend_label(40.0), TrendLabel::Strong);
        assert_eq!(an.trend_label(30.0), TrendLabel::Moderate);
        assert_eq!(an.trend_label(20.0), TrendLabel::Weak);
        assert_eq!(an.trend_label(19.9), TrendLabel::Lateral);
    }

    #[test]
    fn momentum_deadband_is_neutral() {
        let an = analyzer();
        let reading = MacdReading {
            line: 0.0,
            signal: 0.0,
            histogram: 1e-12,
            valid: true,
        };
        assert_eq!(an.momentum_label(&reading), MomentumLabel::Neutral);
        let invalid = MacdReading {
            histogram: 5.0,
            ..MacdReading::default()
        };
        assert_eq!(an.momentum_label(&invalid), MomentumLabel::Neutral);
    }
}
