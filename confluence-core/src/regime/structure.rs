//! Structural and momentum descriptors derived from one MACD reading.
//!
//! Structure is where the market sits relative to the zero line (line and
//! signal on the same side). Momentum is where it is heading (histogram sign).
//! A correction is momentum running against structure.

use crate::domain::Bias;
use crate::indicators::MacdReading;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MacdStructure {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
    pub structural_bias: Bias,
    pub momentum_bias: Bias,
    pub is_correction: bool,
    /// |line|
    pub structural_strength: f64,
    /// |histogram|
    pub momentum_strength: f64,
}

impl MacdStructure {
    /// Non-finite inputs read as zero.
    pub fn new(line: f64, signal: f64, histogram: f64) -> Self {
        let line = finite(line);
        let signal = finite(signal);
        let histogram = finite(histogram);

        let structural_bias = if line > 0.0 && signal > 0.0 {
            Bias::Bullish
        } else if line < 0.0 && signal < 0.0 {
            Bias::Bearish
        } else {
            Bias::Neutral
        };
        let momentum_bias = Bias::from_sign(histogram, 0.0);

        Self {
            line,
            signal,
            histogram,
            structural_bias,
            momentum_bias,
            is_correction: structural_bias.opposes(momentum_bias),
            structural_strength: line.abs(),
            momentum_strength: histogram.abs(),
        }
    }

    /// An invalid reading yields the all-neutral descriptor.
    pub fn from_reading(reading: &MacdReading) -> Self {
        if reading.valid {
            Self::new(reading.line, reading.signal, reading.histogram)
        } else {
            Self::default()
        }
    }
}

fn finite(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}
