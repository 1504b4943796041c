//! Exhaustion detector: counts independent warning signs that a directional
//! move is running out.

use crate::config::ExhaustionConfig;
use crate::domain::{Candle, Signal};
use crate::history::BoundedLog;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Signs counted toward the strength denominator.
pub const SIGN_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExhaustionSign {
    MomentumFading,
    RejectionCandle,
    OscillatorExtreme,
    VolumeDeclining,
}

impl fmt::Display for ExhaustionSign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExhaustionSign::MomentumFading => "MACD losing strength",
            ExhaustionSign::RejectionCandle => "rejection candle",
            ExhaustionSign::OscillatorExtreme => "RSI extreme",
            ExhaustionSign::VolumeDeclining => "volume declining",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExhaustionReport {
    pub exhausted: bool,
    pub signs: Vec<ExhaustionSign>,
    /// signs / 4
    pub strength: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExhaustionEvent {
    pub time: DateTime<Utc>,
    pub direction: Signal,
    pub signs: Vec<ExhaustionSign>,
}

#[derive(Debug, Clone)]
pub struct ExhaustionDetector {
    config: ExhaustionConfig,
    log: BoundedLog<ExhaustionEvent>,
}

impl ExhaustionDetector {
    pub fn new(config: ExhaustionConfig, log_capacity: usize) -> Self {
        Self {
            config,
            log: BoundedLog::new(log_capacity),
        }
    }

    /// Assess and log a positive result at `now`.
    pub fn detect(
        &mut self,
        candles: &[Candle],
        direction: Signal,
        histogram: &[f64],
        oscillator: Option<f64>,
        now: DateTime<Utc>,
    ) -> ExhaustionReport {
        let report = self.assess(candles, direction, histogram, oscillator);
        if report.exhausted {
            self.log.push(ExhaustionEvent {
                time: now,
                direction,
                signs: report.signs.clone(),
            });
        }
        report
    }

    /// `histogram` is oldest first.
    pub fn assess(
        &self,
        candles: &[Candle],
        direction: Signal,
        histogram: &[f64],
        oscillator: Option<f64>,
    ) -> ExhaustionReport {
        if candles.len() < self.config.min_candles {
            return ExhaustionReport::default();
        }

        let mut signs = Vec::new();
        if momentum_fading(histogram) {
            signs.push(ExhaustionSign::MomentumFading);
        }
        if candles
            .last()
            .is_some_and(|c| rejection_candle(c, direction, self.config.shadow_ratio))
        {
            signs.push(ExhaustionSign::RejectionCandle);
        }
        if let Some(osc) = oscillator.filter(|v| v.is_finite()) {
            let extreme = match direction {
                Signal::Buy => osc > self.config.oscillator_high,
                Signal::Sell => osc < self.config.oscillator_low,
                Signal::Hold => false,
            };
            if extreme {
                signs.push(ExhaustionSign::OscillatorExtreme);
            }
        }
        if volume_declining(candles) {
            signs.push(ExhaustionSign::VolumeDeclining);
        }

        ExhaustionReport {
            exhausted: signs.len() >= self.config.min_signs,
            strength: signs.len() as f64 / SIGN_COUNT as f64,
            signs,
        }
    }

    pub fn log(&self) -> &BoundedLog<ExhaustionEvent> {
        &self.log
    }

    /// Logged events newer than `now - within`.
    pub fn recent(&self, now: DateTime<Utc>, within: Duration) -> Vec<&ExhaustionEvent> {
        let cutoff = now - within;
        self.log.iter().filter(|e| e.time > cutoff).collect()
    }
}

/// |h| strictly shrinking over the last three samples.
fn momentum_fading(histogram: &[f64]) -> bool {
    let [a, b, c] = match histogram {
        [.., a, b, c] => [a.abs(), b.abs(), c.abs()],
        _ => return false,
    };
    c < b && b < a
}

fn rejection_candle(candle: &Candle, direction: Signal, ratio: f64) -> bool {
    let body = candle.body();
    if body.is_nan() || body <= 0.0 {
        return false;
    }
    match direction {
        Signal::Buy => candle.upper_shadow() > body * ratio,
        Signal::Sell => candle.lower_shadow() > body * ratio,
        Signal::Hold => false,
    }
}

/// The last five volumes, all present, with the four newest strictly falling.
fn volume_declining(candles: &[Candle]) -> bool {
    if candles.len() < 5 {
        return false;
    }
    let v: Vec<f64> = candles[candles.len() - 5..].iter().map(|c| c.clean_volume()).collect();
    if v.iter().any(|x| *x == 0.0) {
        return false;
    }
    v[4] < v[3] && v[3] < v[2] && v[2] < v[1]
}
