//! MACD: the moving-average momentum indicator.
//!
//! Three lines (separate Indicator instances):
//! - Line: EMA(close, fast) - EMA(close, slow)
//! - Signal: EMA(line, signal), seeded once the line leaves warmup
//! - Histogram: line - signal
//!
//! Lookback: slow + signal - 2.

use super::ema::{ema_after_warmup, ema_of_series};
use super::Indicator;
use crate::domain::Candle;
use serde::{Deserialize, Serialize};

/// Which MACD output line to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdLine {
    Line,
    Signal,
    Histogram,
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    output: MacdLine,
    name: String,
}

/// All three MACD series, aligned with the input candles.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub line: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

/// Latest MACD values. `valid == false` means the history was too short and
/// every value is 0.0.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MacdReading {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
    pub valid: bool,
}

impl Macd {
    fn build(fast: usize, slow: usize, signal: usize, output: MacdLine) -> Self {
        assert!(fast >= 1 && slow > fast, "MACD requires 1 <= fast < slow");
        assert!(signal >= 1, "MACD signal period must be >= 1");
        let label = match output {
            MacdLine::Line => "line",
            MacdLine::Signal => "signal",
            MacdLine::Histogram => "hist",
        };
        Self {
            fast,
            slow,
            signal,
            output,
            name: format!("macd_{label}_{fast}_{slow}_{signal}"),
        }
    }

    pub fn line(fast: usize, slow: usize, signal: usize) -> Self {
        Self::build(fast, slow, signal, MacdLine::Line)
    }

    pub fn signal(fast: usize, slow: usize, signal: usize) -> Self {
        Self::build(fast, slow, signal, MacdLine::Signal)
    }

    pub fn histogram(fast: usize, slow: usize, signal: usize) -> Self {
        Self::build(fast, slow, signal, MacdLine::Histogram)
    }

    /// Minimum candle count for a valid reading.
    pub fn min_candles(&self) -> usize {
        self.slow + self.signal
    }

    pub fn series(&self, candles: &[Candle]) -> MacdSeries {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let fast = ema_of_series(&closes, self.fast);
        let slow = ema_of_series(&closes, self.slow);
        let line: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
        let signal = ema_after_warmup(&line, self.signal);
        let histogram = line.iter().zip(&signal).map(|(l, s)| l - s).collect();
        MacdSeries {
            line,
            signal,
            histogram,
        }
    }

    /// Latest reading, zeros with `valid = false` when too short or tainted.
    pub fn reading(&self, candles: &[Candle]) -> MacdReading {
        if candles.len() < self.min_candles() {
            return MacdReading::default();
        }
        let s = self.series(candles);
        match (s.line.last(), s.signal.last(), s.histogram.last()) {
            (Some(&line), Some(&signal), Some(&histogram))
                if line.is_finite() && signal.is_finite() && histogram.is_finite() =>
            {
                MacdReading {
                    line,
                    signal,
                    histogram,
                    valid: true,
                }
            }
            _ => MacdReading::default(),
        }
    }

    /// The last `count` finite histogram values, oldest first.
    pub fn recent_histogram(&self, candles: &[Candle], count: usize) -> Vec<f64> {
        let hist = self.series(candles).histogram;
        let finite: Vec<f64> = hist.into_iter().filter(|v| v.is_finite()).collect();
        let start = finite.len().saturating_sub(count);
        finite[start..].to_vec()
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        match self.output {
            MacdLine::Line => self.slow - 1,
            MacdLine::Signal | MacdLine::Histogram => self.slow + self.signal - 2,
        }
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let s = self.series(candles);
        match self.output {
            MacdLine::Line => s.line,
            MacdLine::Signal => s.signal,
            MacdLine::Histogram => s.histogram,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_candles};

    #[test]
    fn macd_positive_in_uptrend() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let reading = Macd::line(12, 26, 9).reading(&make_candles(&closes));
        assert!(reading.valid);
        assert!(reading.line > 0.0);
        assert!(reading.signal > 0.0);
    }

    #[test]
    fn macd_warmup_matches_lookback() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64).sin()).collect();
        let candles = make_candles(&closes);
        for macd in [
            Macd::line(12, 26, 9),
            Macd::signal(12, 26, 9),
            Macd::histogram(12, 26, 9),
        ] {
            let out = macd.compute(&candles);
            let lb = macd.lookback();
            assert!(out[lb - 1].is_nan(), "{} valid too early", macd.name());
            assert!(out[lb].is_finite(), "{} not valid at lookback", macd.name());
        }
    }

    #[test]
    fn histogram_is_line_minus_signal() {
        let closes: Vec<f64> = (0..50).map(|i| 100.0 + (i as f64 * 0.3).cos() * 5.0).collect();
        let s = Macd::histogram(12, 26, 9).series(&make_candles(&closes));
        let last = closes.len() - 1;
        assert_approx(s.histogram[last], s.line[last] - s.signal[last], 1e-12);
    }

    #[test]
    fn short_history_is_invalid_zeros() {
        let candles = make_candles(&[1.0, 2.0, 3.0]);
        let reading = Macd::histogram(12, 26, 9).reading(&candles);
        assert!(!reading.valid);
        assert_eq!(reading.histogram, 0.0);
    }

    #[test]
    fn recent_histogram_takes_tail() {
        let closes: Vec<f64> = (0..50).map(|i| 100.0 + i as f64 * 0.5).collect();
        let candles = make_candles(&closes);
        let tail = Macd::histogram(12, 26, 9).recent_histogram(&candles, 3);
        assert_eq!(tail.len(), 3);
    }
}
