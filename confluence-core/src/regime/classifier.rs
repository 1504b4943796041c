//! Regime classifier: structural bias vs. fine momentum → market state and a
//! trade gate.
//!
//! A pure function of its inputs. There is no transition memory between
//! cycles; the same inputs always classify the same way.

use super::confidence::confidence_score;
use super::structure::MacdStructure;
use crate::config::RegimeConfig;
use crate::domain::Bias;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketState {
    StrongBullTrend,
    StrongBearTrend,
    BullishCorrection,
    BearishCorrection,
    Transition,
    Range,
    Exhaustion,
    NoTrade,
}

impl fmt::Display for MarketState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MarketState::StrongBullTrend => "STRONG_BULL_TREND",
            MarketState::StrongBearTrend => "STRONG_BEAR_TREND",
            MarketState::BullishCorrection => "BULLISH_CORRECTION",
            MarketState::BearishCorrection => "BEARISH_CORRECTION",
            MarketState::Transition => "TRANSITION",
            MarketState::Range => "RANGE",
            MarketState::Exhaustion => "EXHAUSTION",
            MarketState::NoTrade => "NO_TRADE",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalType {
    TrendContinuation,
    Pullback,
    Transition,
    RangeBreakout,
    None,
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SignalType::TrendContinuation => "TREND_CONTINUATION",
            SignalType::Pullback => "PULLBACK",
            SignalType::Transition => "TRANSITION",
            SignalType::RangeBreakout => "RANGE_BREAKOUT",
            SignalType::None => "NONE",
        })
    }
}

/// How the fine period's momentum reads against the structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FineConfirmation {
    BullishConfirmed,
    BearishConfirmed,
    BullishCorrection,
    BearishCorrection,
    Transition,
    Range,
    Exhaustion,
    Unclear,
}

impl FineConfirmation {
    pub fn is_confirmed(&self) -> bool {
        matches!(
            self,
            FineConfirmation::BullishConfirmed | FineConfirmation::BearishConfirmed
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockReason {
    ExternalVeto,
    Transition,
    Range,
    OscillatorExtreme,
    NoStructure,
    ContinuationAgainstMomentum,
    NeutralDailyContext,
    ExhaustionAgainstBias,
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BlockReason::ExternalVeto => "external veto: all trades blocked",
            BlockReason::Transition => "market in transition (structure vs momentum)",
            BlockReason::Range => "Range - low trend strength",
            BlockReason::OscillatorExtreme => "exhaustion detected (oscillator extreme)",
            BlockReason::NoStructure => "no clear market structure",
            BlockReason::ContinuationAgainstMomentum => {
                "momentum against structure: correction only, no continuation"
            }
            BlockReason::NeutralDailyContext => "daily context neutral and composite score below gate",
            BlockReason::ExhaustionAgainstBias => "exhaustion detected against bias",
        })
    }
}

/// Optional higher-horizon summary supplied by an external collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DailyContext {
    /// Veto flag: blocks every trade.
    #[serde(default)]
    pub block_all: bool,
    #[serde(default)]
    pub bias: Bias,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeInputs {
    pub structure: MacdStructure,
    /// Descriptor of the fine period; only its momentum bias is read.
    pub momentum: MacdStructure,
    pub trend_strength: f64,
    pub oscillator: f64,
    /// Momentum bias of the quality period, if available.
    pub quality: Option<Bias>,
    pub daily: Option<DailyContext>,
    pub composite_score: f64,
}

impl RegimeInputs {
    pub fn new(structure: MacdStructure, momentum: MacdStructure) -> Self {
        Self {
            structure,
            momentum,
            trend_strength: crate::indicators::adx::DEFAULT_ADX,
            oscillator: crate::indicators::rsi::DEFAULT_RSI,
            quality: None,
            daily: None,
            composite_score: 50.0,
        }
    }

    pub fn vetoed(&self) -> bool {
        self.daily.is_some_and(|d| d.block_all)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeResult {
    pub state: MarketState,
    pub signal_type: SignalType,
    pub trade_allowed: bool,
    pub blocked: Option<BlockReason>,
    pub confidence: f64,
    pub bias: Bias,
    pub confirmation: FineConfirmation,
    pub quality_ok: bool,
}

impl RegimeResult {
    fn blocked(state: MarketState, signal_type: SignalType, reason: BlockReason, confirmation: FineConfirmation) -> Self {
        Self {
            state,
            signal_type,
            trade_allowed: false,
            blocked: Some(reason),
            confidence: 0.0,
            bias: Bias::Neutral,
            confirmation,
            quality_ok: false,
        }
    }

    fn allowed(state: MarketState, signal_type: SignalType, bias: Bias, confirmation: FineConfirmation) -> Self {
        Self {
            state,
            signal_type,
            trade_allowed: true,
            blocked: None,
            confidence: 0.0,
            bias,
            confirmation,
            quality_ok: false,
        }
    }

    pub fn block(&mut self, reason: BlockReason) {
        self.trade_allowed = false;
        self.blocked = Some(reason);
    }

    pub fn reason(&self) -> String {
        self.blocked
            .map_or_else(|| "OK to trade".to_string(), |r| r.to_string())
    }
}

/// Ordered predicates, first match wins, then the post-hoc vetoes and the
/// confidence score.
pub fn classify(inputs: &RegimeInputs, config: &RegimeConfig) -> RegimeResult {
    if inputs.vetoed() {
        return RegimeResult::blocked(
            MarketState::NoTrade,
            SignalType::None,
            BlockReason::ExternalVeto,
            FineConfirmation::Unclear,
        );
    }

    let structural = inputs.structure.structural_bias;
    let fine = inputs.momentum.momentum_bias;
    let trending = inputs.trend_strength > config.trend_strength;
    let overbought = inputs.oscillator > config.overbought;
    let oversold = inputs.oscillator < config.oversold;

    let mut result = match (structural, fine) {
        (Bias::Bearish, Bias::Bullish) if trending && !oversold => RegimeResult::allowed(
            MarketState::BearishCorrection,
            SignalType::Pullback,
            Bias::Bearish,
            FineConfirmation::BearishCorrection,
        ),
        (Bias::Bearish, Bias::Bearish) if trending && !oversold => RegimeResult::allowed(
            MarketState::StrongBearTrend,
            SignalType::TrendContinuation,
            Bias::Bearish,
            FineConfirmation::BearishConfirmed,
        ),
        (Bias::Bullish, Bias::Bearish) if trending && !overbought => RegimeResult::allowed(
            MarketState::BullishCorrection,
            SignalType::Pullback,
            Bias::Bullish,
            FineConfirmation::BullishCorrection,
        ),
        (Bias::Bullish, Bias::Bullish) if trending && !overbought => RegimeResult::allowed(
            MarketState::StrongBullTrend,
            SignalType::TrendContinuation,
            Bias::Bullish,
            FineConfirmation::BullishConfirmed,
        ),
        _ if inputs.structure.is_correction && trending => RegimeResult::blocked(
            MarketState::Transition,
            SignalType::Transition,
            BlockReason::Transition,
            FineConfirmation::Transition,
        ),
        _ if inputs.trend_strength < config.range_strength => RegimeResult::blocked(
            MarketState::Range,
            SignalType::RangeBreakout,
            BlockReason::Range,
            FineConfirmation::Range,
        ),
        _ if overbought || oversold => RegimeResult::blocked(
            MarketState::Exhaustion,
            SignalType::None,
            BlockReason::OscillatorExtreme,
            FineConfirmation::Exhaustion,
        ),
        _ => RegimeResult::blocked(
            MarketState::NoTrade,
            SignalType::None,
            BlockReason::NoStructure,
            FineConfirmation::Unclear,
        ),
    };

    // Opposing structure and momentum only ever justify a correction.
    if result.signal_type == SignalType::TrendContinuation && structural.opposes(fine) {
        result.block(BlockReason::ContinuationAgainstMomentum);
    }

    if let Some(daily) = inputs.daily {
        if daily.bias == Bias::Neutral
            && result.trade_allowed
            && inputs.composite_score < config.composite_gate
        {
            result.block(BlockReason::NeutralDailyContext);
        }
    }

    result.quality_ok = result.bias.is_directional() && inputs.quality == Some(result.bias);
    result.confidence = confidence_score(&result, &inputs.structure, &inputs.momentum, config);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(structural: (f64, f64, f64), fine_hist: f64, adx: f64, rsi: f64) -> RegimeInputs {
        let mut i = RegimeInputs::new(
            MacdStructure::new(structural.0, structural.1, structural.2),
            MacdStructure::new(0.0, 0.0, fine_hist),
        );
        i.trend_strength = adx;
        i.oscillator = rsi;
        i
    }

    fn cfg() -> RegimeConfig {
        RegimeConfig::default()
    }

    #[test]
    fn bearish_structure_bullish_momentum_is_bearish_correction() {
        let r = classify(&inputs((-0.002, -0.003, 0.001), 0.01, 30.0, 50.0), &cfg());
        assert_eq!(r.state, MarketState::BearishCorrection);
        assert_eq!(r.signal_type, SignalType::Pullback);
        assert!(r.trade_allowed);
        assert_eq!(r.bias, Bias::Bearish);
    }

    #[test]
    fn aligned_bull_is_continuation() {
        let r = classify(&inputs((0.002, 0.001, 0.001), 0.01, 30.0, 60.0), &cfg());
        assert_eq!(r.state, MarketState::StrongBullTrend);
        assert_eq!(r.signal_type, SignalType::TrendContinuation);
        assert!(r.trade_allowed);
        assert!(r.confirmation.is_confirmed());
        // 40 + 30 aligned + 20 confirmed
        assert_eq!(r.confidence, 90.0);
    }

    #[test]
    fn veto_blocks_everything() {
        let mut i = inputs((0.002, 0.001, 0.001), 0.01, 30.0, 60.0);
        i.daily = Some(DailyContext {
            block_all: true,
            bias: Bias::Bullish,
        });
        let r = classify(&i, &cfg());
        assert_eq!(r.state, MarketState::NoTrade);
        assert!(!r.trade_allowed);
        assert_eq!(r.blocked, Some(BlockReason::ExternalVeto));
    }

    #[test]
    fn neutral_everything_is_no_trade() {
        let r = classify(&inputs((0.0, 0.0, 0.0), 0.0, 22.0, 50.0), &cfg());
        assert_eq!(r.state, MarketState::NoTrade);
        assert!(!r.trade_allowed);
        assert_eq!(r.reason(), "no clear market structure");
        assert_eq!(r.confidence, 0.0);
    }

    #[test]
    fn neutral_fine_momentum_falls_through() {
        // bullish structure, strong trend, flat fine momentum, structural
        // histogram negative → correction → transition
        let r = classify(&inputs((0.002, 0.003, -0.001), 0.0, 30.0, 50.0), &cfg());
        assert_eq!(r.state, MarketState::Transition);
        assert!(!r.trade_allowed);
    }

    #[test]
    fn oversold_bear_structure_skips_to_later_rules() {
        let r = classify(&inputs((-0.002, -0.001, -0.001), -0.01, 30.0, 25.0), &cfg());
        assert_eq!(r.state, MarketState::Exhaustion);
        assert_eq!(r.blocked, Some(BlockReason::OscillatorExtreme));
    }

    #[test]
    fn low_trend_strength_is_range() {
        let r = classify(&inputs((0.002, 0.001, 0.001), 0.01, 15.0, 50.0), &cfg());
        assert_eq!(r.state, MarketState::Range);
        assert_eq!(r.reason(), "Range - low trend strength");
        assert_eq!(r.signal_type, SignalType::RangeBreakout);
    }

    #[test]
    fn neutral_daily_context_needs_score() {
        let mut i = inputs((0.002, 0.001, 0.001), 0.01, 30.0, 60.0);
        i.daily = Some(DailyContext::default());
        i.composite_score = 55.0;
        let r = classify(&i, &cfg());
        assert!(!r.trade_allowed);
        assert_eq!(r.blocked, Some(BlockReason::NeutralDailyContext));

        i.composite_score = 65.0;
        assert!(classify(&i, &cfg()).trade_allowed);
    }

    #[test]
    fn quality_check_adds_bonus() {
        let mut i = inputs((-0.002, -0.001, -0.001), -0.01, 30.0, 50.0);
        i.quality = Some(Bias::Bearish);
        let r = classify(&i, &cfg());
        assert!(r.quality_ok);
        assert_eq!(r.confidence, 100.0);
    }

    #[test]
    fn deterministic() {
        let i = inputs((-0.002, -0.003, 0.001), 0.01, 30.0, 50.0);
        assert_eq!(classify(&i, &cfg()), classify(&i, &cfg()));
    }
}
