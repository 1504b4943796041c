//! Directional vocabulary shared by the decision path and the regime gate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Directional trading signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    #[default]
    Hold,
}

impl Signal {
    pub fn is_directional(&self) -> bool {
        !matches!(self, Signal::Hold)
    }

    pub fn opposite(&self) -> Signal {
        match self {
            Signal::Buy => Signal::Sell,
            Signal::Sell => Signal::Buy,
            Signal::Hold => Signal::Hold,
        }
    }

    /// +1 for BUY, -1 for SELL, 0 for HOLD.
    pub fn sign(&self) -> f64 {
        match self {
            Signal::Buy => 1.0,
            Signal::Sell => -1.0,
            Signal::Hold => 0.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
            Signal::Hold => "HOLD",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction inferred from an indicator relative to a neutral baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Bias {
    Bullish,
    Bearish,
    #[default]
    Neutral,
}

impl Bias {
    /// Sign of `value` with a symmetric deadband around zero.
    pub fn from_sign(value: f64, deadband: f64) -> Bias {
        if !value.is_finite() {
            Bias::Neutral
        } else if value > deadband {
            Bias::Bullish
        } else if value < -deadband {
            Bias::Bearish
        } else {
            Bias::Neutral
        }
    }

    pub fn is_directional(&self) -> bool {
        !matches!(self, Bias::Neutral)
    }

    /// True when both biases are directional and point opposite ways.
    pub fn opposes(&self, other: Bias) -> bool {
        matches!(
            (self, other),
            (Bias::Bullish, Bias::Bearish) | (Bias::Bearish, Bias::Bullish)
        )
    }

    pub fn to_signal(&self) -> Signal {
        match self {
            Bias::Bullish => Signal::Buy,
            Bias::Bearish => Signal::Sell,
            Bias::Neutral => Signal::Hold,
        }
    }
}

impl fmt::Display for Bias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Bias::Bullish => "BULLISH",
            Bias::Bearish => "BEARISH",
            Bias::Neutral => "NEUTRAL",
        };
        f.write_str(s)
    }
}

/// Trend label derived from the trend-strength index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrendLabel {
    VeryStrong,
    Strong,
    Moderate,
    Weak,
    #[default]
    Lateral,
}

impl fmt::Display for TrendLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TrendLabel::VeryStrong => "VERY_STRONG",
            TrendLabel::Strong => "STRONG",
            TrendLabel::Moderate => "MODERATE",
            TrendLabel::Weak => "WEAK",
            TrendLabel::Lateral => "LATERAL",
        };
        f.write_str(s)
    }
}

/// Momentum descriptor derived from the moving-average momentum indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MomentumLabel {
    StrongBullish,
    Bullish,
    StrongBearish,
    Bearish,
    #[default]
    Neutral,
}

impl MomentumLabel {
    pub fn is_strong(&self) -> bool {
        matches!(self, MomentumLabel::StrongBullish | MomentumLabel::StrongBearish)
    }

    pub fn bias(&self) -> Bias {
        match self {
            MomentumLabel::StrongBullish | MomentumLabel::Bullish => Bias::Bullish,
            MomentumLabel::StrongBearish | MomentumLabel::Bearish => Bias::Bearish,
            MomentumLabel::Neutral => Bias::Neutral,
        }
    }
}
