//! Probability adjustment cascade for the single-period assessment.
//!
//! Steps run in a fixed order and each one sees the output of the previous
//! step. Every step that changes the probability leaves a note.

use super::conditions::Adjustments;
use super::reliability::{check_reliability, ReliabilityCheck};
use crate::config::TradingMode;
use crate::domain::{Candle, Signal};
use serde::{Deserialize, Serialize};

pub const PATTERN_BONUS: f64 = 0.07;
pub const PATTERN_PENALTY: f64 = 0.05;
pub const WAVE_BONUS: f64 = 0.08;
pub const WAVE_PENALTY: f64 = 0.04;
/// Margin by which a dissenting wave reading must beat the running
/// probability to take over the signal.
pub const WAVE_OVERRIDE_MARGIN: f64 = 0.1;
pub const CONVERGENCE_BONUS: f64 = 0.1;
pub const UNRELIABLE_FACTOR: f64 = 0.7;
pub const HIGH_VOLATILITY_PCT: f64 = 2.0;
pub const LOW_VOLATILITY_PCT: f64 = 0.3;
pub const HIGH_VOLATILITY_FACTOR: f64 = 0.92;
pub const LOW_VOLATILITY_FACTOR: f64 = 1.1;
pub const REJECTED_PROBABILITY: f64 = 0.35;
pub const AGGRESSIVE_FACTOR: f64 = 1.12;
pub const AGGRESSIVE_CAP: f64 = 0.85;

/// Directional call from an external wave-count recognizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveReading {
    pub signal: Signal,
    pub confidence: f64,
    #[serde(default)]
    pub reason: String,
}

/// Optional corroboration from recognizers that live outside this crate.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Corroboration {
    /// Whether a chart-pattern recognizer confirms the base signal.
    pub pattern_confirms: Option<bool>,
    /// Combined signal from the same recognizer.
    pub pattern_signal: Option<Signal>,
    pub wave: Option<WaveReading>,
}

/// Everything the cascade reads besides the corroboration.
#[derive(Debug, Clone, Copy)]
pub struct AdjustInputs<'a> {
    pub signal: Signal,
    pub probability: f64,
    pub candles: &'a [Candle],
    pub histogram: f64,
    pub oscillator: f64,
    pub volatility_pct: f64,
    pub adjustments: &'a Adjustments,
    pub mode: TradingMode,
    pub min_probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adjusted {
    pub signal: Signal,
    pub probability: f64,
    pub notes: Vec<String>,
    pub wave_confirms: bool,
    pub converged: bool,
    /// Reliability of the signal after the corroboration steps.
    pub reliability: ReliabilityCheck,
}

pub fn adjust_probability(inputs: &AdjustInputs<'_>, corroboration: &Corroboration) -> Adjusted {
    let original = inputs.signal;
    let mut signal = original;
    let mut p = inputs.probability;
    let mut notes = Vec::new();

    if let Some(confirms) = corroboration.pattern_confirms {
        if confirms {
            p += PATTERN_BONUS;
            notes.push("confirmed by chart pattern".to_string());
        } else if original.is_directional() {
            p -= PATTERN_PENALTY;
            notes.push("chart pattern does not confirm".to_string());
        }
    }

    let wave = corroboration
        .wave
        .as_ref()
        .filter(|w| w.signal.is_directional());
    let wave_confirms = wave.is_some_and(|w| w.signal == original);
    if wave_confirms {
        p += WAVE_BONUS;
        notes.push("confirmed by wave count".to_string());
    } else if let Some(w) = wave.filter(|_| original.is_directional()) {
        if w.confidence > p + WAVE_OVERRIDE_MARGIN {
            signal = w.signal;
            p = w.confidence;
            notes.push(format!("wave count takes priority: {}", w.reason));
        } else {
            p -= WAVE_PENALTY;
            notes.push("wave count suggests a different direction".to_string());
        }
    }

    let agreeing = [
        corroboration.pattern_signal == Some(original),
        wave_confirms || wave.is_some_and(|w| w.signal == signal),
    ]
    .iter()
    .filter(|v| **v)
    .count();
    let converged = agreeing >= 2;
    if converged {
        p += CONVERGENCE_BONUS;
        notes.push("high convergence between methods".to_string());
    }

    let reliability = check_reliability(signal, inputs.candles, inputs.histogram, inputs.oscillator);
    if !reliability.reliable && signal.is_directional() {
        p *= UNRELIABLE_FACTOR;
        notes.push("low reliability".to_string());
    }

    if signal.is_directional() {
        p *= inputs.adjustments.sensitivity.clamp(0.8, 1.5);
        p *= inputs.adjustments.aggressiveness.clamp(0.8, 1.5);
        if inputs.volatility_pct > HIGH_VOLATILITY_PCT {
            p *= HIGH_VOLATILITY_FACTOR;
            notes.push("high volatility".to_string());
        } else if inputs.volatility_pct < LOW_VOLATILITY_PCT {
            p *= LOW_VOLATILITY_FACTOR;
            notes.push("low volatility".to_string());
        }
        p = p.clamp(0.30, 0.88);
    }

    p = apply_mode(signal, p, inputs.mode, inputs.min_probability);
    let probability = if p.is_finite() { p.clamp(0.35, 0.88) } else { REJECTED_PROBABILITY };

    Adjusted {
        signal,
        probability,
        notes,
        wave_confirms,
        converged,
        reliability,
    }
}

/// HOLD passes through untouched.
pub fn apply_mode(signal: Signal, probability: f64, mode: TradingMode, min_probability: f64) -> f64 {
    if !signal.is_directional() {
        return probability;
    }
    match mode {
        TradingMode::Conservative if probability < min_probability => REJECTED_PROBABILITY,
        TradingMode::Conservative | TradingMode::Normal => probability,
        TradingMode::Aggressive => (probability * AGGRESSIVE_FACTOR).min(AGGRESSIVE_CAP),
    }
}
