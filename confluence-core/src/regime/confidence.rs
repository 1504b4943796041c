//! Regime confidence score and the score-keyed indicator weights.

use super::classifier::{MarketState, RegimeResult};
use super::structure::MacdStructure;
use crate::config::RegimeConfig;
use serde::{Deserialize, Serialize};

impl MarketState {
    /// Starting points before bonuses. `None` means the state always scores 0.
    pub fn base_confidence(&self) -> Option<f64> {
        match self {
            MarketState::StrongBullTrend | MarketState::StrongBearTrend => Some(40.0),
            MarketState::BullishCorrection | MarketState::BearishCorrection => Some(25.0),
            MarketState::Transition => Some(10.0),
            MarketState::Range => Some(15.0),
            MarketState::Exhaustion => Some(0.0),
            MarketState::NoTrade => None,
        }
    }
}

pub fn confidence_score(
    result: &RegimeResult,
    structure: &MacdStructure,
    momentum: &MacdStructure,
    config: &RegimeConfig,
) -> f64 {
    let Some(mut score) = result.state.base_confidence() else {
        return 0.0;
    };

    let structural = structure.structural_bias;
    let fine = momentum.momentum_bias;
    if structural.is_directional() && fine.is_directional() {
        if structural == fine {
            score += config.alignment_bonus;
        } else if structure.is_correction && structure.structural_strength > config.structural_magnitude {
            score += config.correction_bonus;
        }
    }

    if result.confirmation.is_confirmed() {
        score += config.confirmation_bonus;
    }
    if result.quality_ok {
        score += config.quality_bonus;
    }

    if result.state == MarketState::Exhaustion {
        score *= config.exhaustion_factor;
    }

    score.clamp(0.0, 100.0)
}

/// Indicator weights in percent, chosen by a composite score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorWeights {
    pub macd: f64,
    pub adx: f64,
    pub rsi: f64,
}

impl Default for IndicatorWeights {
    fn default() -> Self {
        Self {
            macd: 25.0,
            adx: 20.0,
            rsi: 15.0,
        }
    }
}

impl IndicatorWeights {
    /// Strong markets lean on momentum; weak ones on trend strength.
    pub fn for_score(score: f64) -> Self {
        if score > 70.0 {
            Self {
                macd: 30.0,
                adx: 25.0,
                rsi: 15.0,
            }
        } else if score < 30.0 {
            Self {
                macd: 20.0,
                adx: 30.0,
                rsi: 20.0,
            }
        } else {
            Self::default()
        }
    }

    /// Weighted blend of per-indicator scores, clamped to [0,100].
    pub fn weighted_score(&self, macd: f64, adx: f64, rsi: f64) -> f64 {
        let s = macd * self.macd / 100.0 + adx * self.adx / 100.0 + rsi * self.rsi / 100.0;
        if s.is_finite() {
            s.clamp(0.0, 100.0)
        } else {
            0.0
        }
    }
}
