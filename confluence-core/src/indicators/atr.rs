//! True range, Wilder smoothing, and Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|)
//! ATR uses Wilder smoothing (EMA with alpha = 1/period).
//! Lookback: period (needs period+1 candles for a full TR window).

use super::Indicator;
use crate::domain::Candle;

/// Fallback when there are too few candles for a dynamic ATR.
pub const DEFAULT_DYNAMIC_ATR: f64 = 0.001;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            name: format!("atr_{period}"),
        }
    }
}

/// Compute the True Range series from candles.
/// TR[0] = high[0] - low[0] (no previous close).
pub fn true_range(candles: &[Candle]) -> Vec<f64> {
    candles
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let (h, l) = (c.high, c.low);
            if h.is_nan() || l.is_nan() {
                return f64::NAN;
            }
            match i.checked_sub(1).map(|p| candles[p].close) {
                None => h - l,
                Some(pc) if pc.is_nan() => f64::NAN,
                Some(pc) => (h - l).max((h - pc).abs()).max((l - pc).abs()),
            }
        })
        .collect()
}

/// Apply Wilder smoothing to a series. Alpha = 1/period.
/// Seed: mean of the first window of `period` consecutive non-NaN values.
pub fn wilder_smooth(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if n < period || period == 0 {
        return result;
    }

    let Some(seed_start) = values
        .windows(period)
        .position(|w| w.iter().all(|v| !v.is_nan()))
    else {
        return result;
    };
    let seed_end = seed_start + period;

    let seed: f64 = values[seed_start..seed_end].iter().sum::<f64>() / period as f64;
    result[seed_end - 1] = seed;

    let alpha = 1.0 / period as f64;
    let mut prev = seed;

    for i in seed_end..n {
        if values[i].is_nan() {
            for val in result.iter_mut().skip(i) {
                *val = f64::NAN;
            }
            return result;
        }
        let smoothed = alpha * values[i] + (1.0 - alpha) * prev;
        result[i] = smoothed;
        prev = smoothed;
    }

    result
}

/// Mean true range over the last `period` candles.
///
/// Only pairs inside the window contribute, so `period` candles yield
/// `period - 1` ranges. Returns `DEFAULT_DYNAMIC_ATR` when the window cannot
/// be formed or contains no finite range.
pub fn dynamic_atr(candles: &[Candle], period: usize) -> f64 {
    if period < 2 || candles.len() < period {
        return DEFAULT_DYNAMIC_ATR;
    }
    let window = &candles[candles.len() - period..];
    let ranges: Vec<f64> = true_range(window)
        .into_iter()
        .skip(1)
        .filter(|v| v.is_finite())
        .collect();
    if ranges.is_empty() {
        return DEFAULT_DYNAMIC_ATR;
    }
    ranges.iter().sum::<f64>() / ranges.len() as f64
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let mut tr = true_range(candles);
        // TR[0] is not a proper true range; start the seed at TR[1].
        if let Some(first) = tr.first_mut() {
            *first = f64::NAN;
        }
        wilder_smooth(&tr, self.period)
    }
}
