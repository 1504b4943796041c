//! Regime analyzer: builds classifier inputs from a market snapshot, then
//! runs the exhaustion and pullback detectors on the resolved bias.

use super::classifier::{classify, BlockReason, DailyContext, MarketState, RegimeInputs, RegimeResult, SignalType};
use super::confidence::IndicatorWeights;
use super::exhaustion::{ExhaustionDetector, ExhaustionReport};
use super::pullback::{PullbackZone, PullbackZoneCalculator};
use super::structure::MacdStructure;
use crate::config::EngineConfig;
use crate::domain::{Candle, MarketSnapshot, Period, Signal};
use crate::indicators::{Adx, Macd, Rsi};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Collaborator inputs that do not come from the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegimeContext {
    pub daily: Option<DailyContext>,
    pub composite_score: f64,
}

impl Default for RegimeContext {
    fn default() -> Self {
        Self {
            daily: None,
            composite_score: 50.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeSummary {
    pub signal: Signal,
    pub confidence: f64,
    pub trade_allowed: bool,
    pub state: MarketState,
    pub signal_type: SignalType,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeAnalysis {
    pub inputs: RegimeInputs,
    pub result: RegimeResult,
    pub weights: IndicatorWeights,
    pub exhaustion: Option<ExhaustionReport>,
    pub pullback: Option<PullbackZone>,
    pub summary: RegimeSummary,
}

#[derive(Debug, Clone)]
pub struct RegimeAnalyzer {
    config: EngineConfig,
    macd: Macd,
    rsi: Rsi,
    adx: Adx,
    exhaustion: ExhaustionDetector,
    pullback: PullbackZoneCalculator,
}

impl RegimeAnalyzer {
    pub fn new(config: EngineConfig) -> Self {
        let a = &config.analyzer;
        let macd = Macd::histogram(a.macd_fast, a.macd_slow, a.macd_signal);
        let rsi = Rsi::new(a.rsi_period);
        let adx = Adx::new(a.adx_period);
        let exhaustion = ExhaustionDetector::new(config.exhaustion.clone(), config.history.exhaustion_log);
        let pullback = PullbackZoneCalculator::new(config.pullback.clone(), config.history.zone_log);
        Self {
            config,
            macd,
            rsi,
            adx,
            exhaustion,
            pullback,
        }
    }

    pub fn exhaustion_detector(&self) -> &ExhaustionDetector {
        &self.exhaustion
    }

    pub fn pullback_calculator(&self) -> &PullbackZoneCalculator {
        &self.pullback
    }

    /// Descriptors and readings for the configured periods. Missing periods
    /// read neutral with default trend strength and oscillator.
    pub fn inputs(&self, snapshot: &MarketSnapshot, context: RegimeContext) -> RegimeInputs {
        let rc = &self.config.regime;
        let structural = candles_of(snapshot, rc.structural_period);
        let fine = candles_of(snapshot, rc.momentum_period);

        let mut inputs = RegimeInputs::new(
            MacdStructure::from_reading(&self.macd.reading(&structural)),
            MacdStructure::from_reading(&self.macd.reading(&fine)),
        );
        inputs.trend_strength = finite_or(self.adx.value(&structural), inputs.trend_strength);
        inputs.oscillator = finite_or(self.rsi.value(&structural), inputs.oscillator);
        inputs.quality = snapshot.get(rc.quality_period).map(|_| {
            let quality = candles_of(snapshot, rc.quality_period);
            MacdStructure::from_reading(&self.macd.reading(&quality)).momentum_bias
        });
        inputs.daily = context.daily;
        inputs.composite_score = context.composite_score;
        inputs
    }

    pub fn analyze(&mut self, snapshot: &MarketSnapshot, context: RegimeContext) -> RegimeAnalysis {
        let inputs = self.inputs(snapshot, context);
        let mut result = classify(&inputs, &self.config.regime);
        let now = snapshot.latest_time().unwrap_or_default();
        let fine = candles_of(snapshot, self.config.regime.momentum_period);

        let exhaustion = if result.bias.is_directional() {
            let histogram = self
                .macd
                .recent_histogram(&fine, self.config.exhaustion.histogram_samples);
            let report = self.exhaustion.detect(
                &fine,
                result.bias.to_signal(),
                &histogram,
                Some(inputs.oscillator),
                now,
            );
            if report.exhausted && result.trade_allowed {
                result.block(BlockReason::ExhaustionAgainstBias);
            }
            Some(report)
        } else {
            None
        };

        let pullback = if result.signal_type == SignalType::Pullback {
            self.pullback.prune(now);
            let atr = self.pullback.atr(&fine);
            self.pullback.calculate(&fine, result.bias.to_signal(), atr, now)
        } else {
            None
        };

        let weights = IndicatorWeights::for_score(result.confidence);
        let summary = RegimeSummary {
            signal: result.bias.to_signal(),
            confidence: result.confidence,
            trade_allowed: result.trade_allowed,
            state: result.state,
            signal_type: result.signal_type,
            reason: result.reason(),
        };

        debug!(
            structural = %inputs.structure.structural_bias,
            momentum = %inputs.momentum.momentum_bias,
            trend_strength = inputs.trend_strength,
            oscillator = inputs.oscillator,
            "regime inputs"
        );
        info!(
            state = %summary.state,
            allowed = summary.trade_allowed,
            confidence = summary.confidence,
            reason = %summary.reason,
            "regime classified"
        );

        RegimeAnalysis {
            inputs,
            result,
            weights,
            exhaustion,
            pullback,
            summary,
        }
    }
}

impl Default for RegimeAnalyzer {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

fn candles_of(snapshot: &MarketSnapshot, period: Period) -> Vec<Candle> {
    snapshot
        .get(period)
        .map(|s| s.candles.iter().filter(|c| !c.is_void()).cloned().collect())
        .unwrap_or_default()
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
    use crate::domain::{Bias, PeriodSnapshot};
    use crate::indicators::make_candles;

    fn rising(n: usize) -> PeriodSnapshot {
        let closes: Vec<f64> = (0..n).map(|i| 1000.0 + (i * i) as f64 * 0.5).collect();
        PeriodSnapshot::from_candles(make_candles(&closes))
    }

    #[test]
    fn empty_snapshot_is_blocked() {
        let mut analyzer = RegimeAnalyzer::default();
        let a = analyzer.analyze(&MarketSnapshot::new(), RegimeContext::default());
        assert!(!a.summary.trade_allowed);
        assert_eq!(a.summary.signal, Signal::Hold);
        assert!(a.exhaustion.is_none());
        assert!(a.pullback.is_none());
    }

    #[test]
    fn accelerating_uptrend_is_bullish() {
        let snap = MarketSnapshot::new()
            .with(Period::H4, rising(80))
            .with(Period::H1, rising(80))
            .with(Period::M15, rising(80));
        let a = RegimeAnalyzer::default().inputs(&snap, RegimeContext::default());
        assert_eq!(a.structure.structural_bias, Bias::Bullish);
        assert_eq!(a.momentum.momentum_bias, Bias::Bullish);
        assert_eq!(a.quality, Some(Bias::Bullish));
        assert!(a.trend_strength > 25.0);
    }

    #[test]
    fn veto_context_blocks() {
        let snap = MarketSnapshot::new().with(Period::H4, rising(80)).with(Period::H1, rising(80));
        let ctx = RegimeContext {
            daily: Some(DailyContext {
                block_all: true,
                bias: Bias::Bullish,
            }),
            composite_score: 90.0,
        };
        let a = RegimeAnalyzer::default().analyze(&snap, ctx);
        assert_eq!(a.summary.state, MarketState::NoTrade);
        assert!(!a.summary.trade_allowed);
    }

    #[test]
    fn missing_quality_period_is_none() {
        let snap = MarketSnapshot::new().with(Period::H4, rising(80));
        let a = RegimeAnalyzer::default().inputs(&snap, RegimeContext::default());
        assert_eq!(a.quality, None);
        assert_eq!(a.momentum, MacdStructure::default());
    }
}
