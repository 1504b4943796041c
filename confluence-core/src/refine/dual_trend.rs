//! Short-term price action against medium-term MACD momentum.

use crate::domain::{Candle, Signal};
use crate::indicators::MacdReading;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Colour of the last closed candle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandleColour {
    Green,
    Red,
}

impl CandleColour {
    /// A doji counts as red.
    pub fn of(candle: &Candle) -> CandleColour {
        if candle.is_bullish() {
            CandleColour::Green
        } else {
            CandleColour::Red
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortTermTrend {
    pub signal: Signal,
    /// Absolute percent change between the last two closes.
    pub strength: f64,
    pub change_pct: f64,
    pub colour: CandleColour,
    pub candle_size_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediumTermTrend {
    pub signal: Signal,
    /// Absolute histogram value.
    pub strength: f64,
    pub histogram: f64,
    pub line: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Alignment {
    BullishConvergence,
    BearishConvergence,
    /// Price up while momentum points down.
    BearishDivergence,
    /// Price down while momentum points up.
    BullishDivergence,
}

impl Alignment {
    pub fn is_convergence(&self) -> bool {
        matches!(self, Alignment::BullishConvergence | Alignment::BearishConvergence)
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Alignment::BullishConvergence => "BULLISH CONVERGENCE",
            Alignment::BearishConvergence => "BEARISH CONVERGENCE",
            Alignment::BearishDivergence => "BEARISH DIVERGENCE",
            Alignment::BullishDivergence => "BULLISH DIVERGENCE",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "signal", rename_all = "snake_case")]
pub enum Recommendation {
    /// Both horizons agree.
    Follow(Signal),
    /// Momentum outweighs the recent move.
    MacdLed(Signal),
    /// The recent move is large on its own.
    PriceAction(Signal),
    Wait,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recommendation::Follow(s) => write!(f, "{s} STRONG"),
            Recommendation::MacdLed(s) => write!(f, "{s} (MACD stronger)"),
            Recommendation::PriceAction(s) => write!(f, "{s} (strong price action)"),
            Recommendation::Wait => f.write_str("WAIT for confirmation"),
        }
    }
}

/// Outcome of one dual-trend reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DualTrend {
    pub short: ShortTermTrend,
    pub medium: MediumTermTrend,
    pub alignment: Alignment,
    pub recommendation: Recommendation,
    pub explanation: String,
    pub oscillator: f64,
    pub trend_strength: f64,
    pub time: DateTime<Utc>,
}

/// Base signal derived from a dual-trend reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseSignal {
    pub signal: Signal,
    pub probability: f64,
    pub reason: String,
}

pub const CONVERGENCE_PROBABILITY: f64 = 0.75;
pub const STRONG_CONVERGENCE_PROBABILITY: f64 = 0.85;
pub const DIVERGENCE_PROBABILITY: f64 = 0.5;

impl DualTrend {
    /// Divergence always yields HOLD; its recommendation stays advisory.
    pub fn base_signal(&self) -> BaseSignal {
        let reason = format!("{} - {}", self.alignment, self.explanation);
        if !self.alignment.is_convergence() {
            return BaseSignal {
                signal: Signal::Hold,
                probability: DIVERGENCE_PROBABILITY,
                reason,
            };
        }
        let probability = if self.short.strength > 0.3 && self.medium.strength > 0.01 {
            STRONG_CONVERGENCE_PROBABILITY
        } else {
            CONVERGENCE_PROBABILITY
        };
        BaseSignal {
            signal: self.short.signal,
            probability,
            reason,
        }
    }
}

/// Compare the last close-to-close move with the MACD histogram sign.
///
/// `last_closed` is the most recent fully closed candle, not the forming one.
pub fn analyze_dual_trend(
    price: f64,
    previous: f64,
    macd: &MacdReading,
    oscillator: f64,
    trend_strength: f64,
    last_closed: &Candle,
) -> DualTrend {
    let change_pct = percent(price - previous, previous);
    let short_signal = if price > previous { Signal::Buy } else { Signal::Sell };
    let short = ShortTermTrend {
        signal: short_signal,
        strength: change_pct.abs(),
        change_pct,
        colour: CandleColour::of(last_closed),
        candle_size_pct: percent(last_closed.close - last_closed.open, last_closed.open).abs(),
    };

    let medium_signal = if macd.histogram > 0.0 { Signal::Buy } else { Signal::Sell };
    let medium = MediumTermTrend {
        signal: medium_signal,
        strength: macd.histogram.abs(),
        histogram: macd.histogram,
        line: macd.line,
    };

    let alignment = match (short.signal, medium.signal) {
        (Signal::Buy, Signal::Buy) => Alignment::BullishConvergence,
        (Signal::Buy, _) => Alignment::BearishDivergence,
        (_, Signal::Buy) => Alignment::BullishDivergence,
        _ => Alignment::BearishConvergence,
    };

    let (recommendation, explanation) = if alignment.is_convergence() {
        (Recommendation::Follow(short.signal), "both horizons agree")
    } else if medium.strength > change_pct.abs() * 10.0 {
        (
            Recommendation::MacdLed(medium.signal),
            "MACD outweighs the recent move",
        )
    } else if change_pct.abs() > 0.5 {
        (
            Recommendation::PriceAction(short.signal),
            "recent move is very strong",
        )
    } else {
        (Recommendation::Wait, "horizons conflict without clear strength")
    };

    DualTrend {
        short,
        medium,
        alignment,
        recommendation,
        explanation: explanation.to_string(),
        oscillator,
        trend_strength,
        time: last_closed.time,
    }
}

fn percent(delta: f64, base: f64) -> f64 {
    if base == 0.0 || !base.is_finite() {
        return 0.0;
    }
    let v = delta / base * 100.0;
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_ohlc_candles;

    fn reading(histogram: f64) -> MacdReading {
        MacdReading {
            line: histogram,
            signal: 0.0,
            histogram,
            valid: true,
        }
    }

    fn green() -> Candle {
        make_ohlc_candles(&[(100.0, 101.0, 99.5, 100.8)]).remove(0)
    }

    #[test]
    fn convergence_follows_price() {
        let d = analyze_dual_trend(100.1, 100.0, &reading(0.005), 55.0, 30.0, &green());
        assert_eq!(d.alignment, Alignment::BullishConvergence);
        assert_eq!(d.recommendation, Recommendation::Follow(Signal::Buy));
        let base = d.base_signal();
        assert_eq!(base.signal, Signal::Buy);
        assert_eq!(base.probability, CONVERGENCE_PROBABILITY);
    }

    #[test]
    fn strong_convergence_lifts_probability() {
        let d = analyze_dual_trend(99.0, 100.0, &reading(-0.5), 40.0, 30.0, &green());
        assert_eq!(d.alignment, Alignment::BearishConvergence);
        let base = d.base_signal();
        assert_eq!(base.signal, Signal::Sell);
        assert_eq!(base.probability, STRONG_CONVERGENCE_PROBABILITY);
    }

    #[test]
    fn divergence_is_hold_with_advice() {
        // price up 0.1 %, histogram -2 outweighs 0.1 * 10
        let d = analyze_dual_trend(100.1, 100.0, &reading(-2.0), 50.0, 20.0, &green());
        assert_eq!(d.alignment, Alignment::BearishDivergence);
        assert_eq!(d.recommendation, Recommendation::MacdLed(Signal::Sell));
        let base = d.base_signal();
        assert_eq!(base.signal, Signal::Hold);
        assert_eq!(base.probability, DIVERGENCE_PROBABILITY);
        assert!(base.reason.starts_with("BEARISH DIVERGENCE"));
    }

    #[test]
    fn divergence_recommendations() {
        let d = analyze_dual_trend(99.0, 100.0, &reading(0.5), 50.0, 20.0, &green());
        assert_eq!(d.alignment, Alignment::BullishDivergence);
        assert_eq!(d.recommendation, Recommendation::PriceAction(Signal::Sell));

        let d = analyze_dual_trend(99.9, 100.0, &reading(0.5), 50.0, 20.0, &green());
        assert_eq!(d.recommendation, Recommendation::Wait);
        assert_eq!(d.recommendation.to_string(), "WAIT for confirmation");
    }

    #[test]
    fn flat_price_reads_as_sell() {
        let d = analyze_dual_trend(100.0, 100.0, &reading(0.0), 50.0, 20.0, &green());
        assert_eq!(d.short.signal, Signal::Sell);
        assert_eq!(d.medium.signal, Signal::Sell);
        assert_eq!(d.short.colour, CandleColour::Green);
    }
}
