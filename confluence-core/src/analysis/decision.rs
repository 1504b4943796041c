//! The root output of a decision cycle and the text derived from it.

use super::analyzer::PeriodAnalysis;
use super::cascade::PriorityOutcome;
use super::divergence::{Divergence, Severity};
use super::force::ForceScore;
use super::hierarchy::Hierarchy;
use super::levels::Levels;
use super::probability::ConfidenceLabel;
use super::sequence::AlignedSequence;
use crate::domain::{Period, Signal};
use crate::fingerprint::SnapshotHash;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Cycle-level conditions. Recorded on the decision, never thrown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleError {
    #[error("snapshot contains no candles")]
    EmptyInput,

    #[error("no usable price in any period")]
    NoPrice,
}

/// Thresholds for the alert checks.
pub const PROBABILITY_EXTREME_HIGH: f64 = 85.0;
pub const PROBABILITY_EXTREME_LOW: f64 = 15.0;
pub const OSCILLATOR_ALERT_HIGH: f64 = 75.0;
pub const OSCILLATOR_ALERT_LOW: f64 = 25.0;
pub const TREND_ALERT: f64 = 60.0;
pub const STOP_DISTANCE_ALERT_PCT: f64 = 1.0;

/// Periods whose oscillator and volume are watched for alerts.
pub const WATCHED_PERIODS: [Period; 2] = [Period::H1, Period::H4];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Alert {
    HighDivergence { description: String },
    MultipleSequences { signal: Signal },
    ExtremeProbability { probability: f64 },
    Overbought { period: Period, oscillator: f64 },
    Oversold { period: Period, oscillator: f64 },
    ExtremeTrend { period: Period, trend_strength: f64 },
    TightStop { distance_pct: f64 },
    WeakVolume { period: Period },
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alert::HighDivergence { description } => {
                write!(f, "HIGH severity divergence: {description}")
            }
            Alert::MultipleSequences { signal } => {
                write!(f, "Multiple sequences aligned in {signal} - strong signal")
            }
            Alert::ExtremeProbability { probability } if *probability > 50.0 => {
                write!(f, "Extremely high probability ({probability:.0}%) - high-conviction buy")
            }
            Alert::ExtremeProbability { probability } => {
                write!(f, "Extremely low probability ({probability:.0}%) - high-conviction sell")
            }
            Alert::Overbought { period, oscillator } => {
                write!(f, "{period} RSI overbought ({oscillator:.1}) - possible correction")
            }
            Alert::Oversold { period, oscillator } => {
                write!(f, "{period} RSI oversold ({oscillator:.1}) - possible recovery")
            }
            Alert::ExtremeTrend { period, trend_strength } => {
                write!(f, "{period} ADX {trend_strength:.1} - extremely strong trend")
            }
            Alert::TightStop { distance_pct } => {
                write!(f, "Stop loss very close ({distance_pct:.1}%) - risk of premature stop")
            }
            Alert::WeakVolume { period } => {
                write!(f, "Weak volume on {period} - move may lack support")
            }
        }
    }
}

/// Root output of one cycle. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub final_signal: Signal,
    /// Probability of an upward move, 10..=90.
    pub probability: f64,
    pub confidence: ConfidenceLabel,
    pub action: String,
    pub levels: Levels,
    pub alerts: Vec<Alert>,
    pub rationale: Vec<String>,
    pub dominant_period: Option<Period>,
    pub current_price: f64,
    pub analyses: Vec<PeriodAnalysis>,
    pub hierarchy: Hierarchy,
    pub divergences: Vec<Divergence>,
    pub sequences: Vec<AlignedSequence>,
    pub force: ForceScore,
    pub priority: Option<PriorityOutcome>,
    pub timestamp: Option<DateTime<Utc>>,
    pub fingerprint: Option<SnapshotHash>,
    pub error: Option<CycleError>,
}

impl Decision {
    pub fn is_actionable(&self) -> bool {
        self.error.is_none() && self.final_signal.is_directional()
    }

    /// One-line summary for logs and terminals.
    pub fn headline(&self) -> String {
        format!(
            "{} @ {:.0}% ({}) - {}",
            self.final_signal, self.probability, self.confidence, self.action
        )
    }
}

/// Priority signal, else a decisive force winner, else the strongest
/// sequence, else HOLD.
pub fn resolve_final_signal(
    priority: Option<&PriorityOutcome>,
    force: &ForceScore,
    sequences: &[AlignedSequence],
    margin: f64,
) -> Signal {
    if let Some(o) = priority {
        return o.signal;
    }
    let winner = force.winner.signal();
    if winner.is_directional() && force.margin > margin {
        return winner;
    }
    sequences.first().map_or(Signal::Hold, |s| s.signal)
}

/// Everything the alert and rationale builders read.
pub struct Evidence<'a> {
    pub final_signal: Signal,
    pub probability: f64,
    pub current_price: f64,
    pub analyses: &'a [PeriodAnalysis],
    pub hierarchy: &'a Hierarchy,
    pub divergences: &'a [Divergence],
    pub sequences: &'a [AlignedSequence],
    pub force: &'a ForceScore,
    pub priority: Option<&'a PriorityOutcome>,
    pub levels: &'a Levels,
    pub dominant_period: Option<Period>,
}

pub fn build_alerts(ev: &Evidence<'_>) -> Vec<Alert> {
    let mut alerts = Vec::new();

    if let Some(d) = ev.divergences.iter().find(|d| d.severity == Severity::High) {
        alerts.push(Alert::HighDivergence {
            description: d.describe(),
        });
    }

    if ev.sequences.len() >= 2 {
        alerts.push(Alert::MultipleSequences {
            signal: ev.sequences[0].signal,
        });
    }

    if ev.probability > PROBABILITY_EXTREME_HIGH || ev.probability < PROBABILITY_EXTREME_LOW {
        alerts.push(Alert::ExtremeProbability {
            probability: ev.probability,
        });
    }

    for period in WATCHED_PERIODS {
        let Some(a) = ev.analyses.iter().find(|a| a.period == period) else {
            continue;
        };
        if a.oscillator > OSCILLATOR_ALERT_HIGH {
            alerts.push(Alert::Overbought {
                period,
                oscillator: a.oscillator,
            });
        } else if a.oscillator < OSCILLATOR_ALERT_LOW {
            alerts.push(Alert::Oversold {
                period,
                oscillator: a.oscillator,
            });
        }
    }

    for e in ev.hierarchy.entries() {
        if e.trend_strength > TREND_ALERT {
            alerts.push(Alert::ExtremeTrend {
                period: e.period,
                trend_strength: e.trend_strength,
            });
        }
    }

    if ev.final_signal.is_directional() && ev.current_price > 0.0 {
        let distance_pct = ev.levels.stop_distance_pct(ev.current_price);
        if distance_pct < STOP_DISTANCE_ALERT_PCT {
            alerts.push(Alert::TightStop { distance_pct });
        }
    }

    for a in ev.analyses {
        if WATCHED_PERIODS.contains(&a.period) && !a.degraded && !a.volume.confirmed {
            alerts.push(Alert::WeakVolume { period: a.period });
        }
    }

    alerts
}

pub fn build_rationale(ev: &Evidence<'_>) -> Vec<String> {
    let periods: Vec<&str> = ev.analyses.iter().map(|a| a.period.label()).collect();
    let dominant = match ev.dominant_period.and_then(|p| ev.hierarchy.get(p)) {
        Some(e) => format!("{} (ADX {:.1})", e.period, e.trend_strength),
        None => "none".to_string(),
    };
    let rule = ev.priority.map_or("none", |o| o.reason.as_str());
    let targets: Vec<String> = ev.levels.targets.iter().map(|t| format!("{t:.2}")).collect();

    vec![
        format!("Periods analysed: {}", periods.join(", ")),
        format!("Dominant period: {dominant}"),
        format!("Relative force: BUY {:.1} x SELL {:.1}", ev.force.buy, ev.force.sell),
        format!("Aligned sequences: {}", ev.sequences.len()),
        format!("Divergences detected: {}", ev.divergences.len()),
        format!("Priority rule: {rule}"),
        format!("Probability: {:.0}% for {}", ev.probability, ev.final_signal),
        format!("Suggested stop loss: {:.2}", ev.levels.stop_loss),
        format!("Suggested targets: {}", targets.join(" -> ")),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::cascade::PriorityRule;
    use crate::analysis::force::ForceWinner;
    use crate::analysis::hierarchy::entry;
    use crate::config::{AnalyzerConfig, LevelConfig};

    fn force(winner: ForceWinner, margin: f64) -> ForceScore {
        ForceScore {
            buy: 0.0,
            sell: 0.0,
            winner,
            margin,
        }
    }

    fn seq(signal: Signal) -> AlignedSequence {
        AlignedSequence {
            periods: vec![Period::H1, Period::M30, Period::M15],
            signal,
            strength: 60.0,
        }
    }

    #[test]
    fn final_signal_precedence() {
        let priority = PriorityOutcome {
            rule: PriorityRule::MidFineAligned,
            signal: Signal::Sell,
            reason: String::new(),
        };
        let f = force(ForceWinner::Buy, 40.0);
        assert_eq!(resolve_final_signal(Some(&priority), &f, &[], 10.0), Signal::Sell);
        assert_eq!(resolve_final_signal(None, &f, &[seq(Signal::Sell)], 10.0), Signal::Buy);

        let narrow = force(ForceWinner::Buy, 10.0);
        assert_eq!(resolve_final_signal(None, &narrow, &[seq(Signal::Sell)], 10.0), Signal::Sell);
        assert_eq!(resolve_final_signal(None, &narrow, &[], 10.0), Signal::Hold);
    }

    fn evidence_fixture() -> (Vec<PeriodAnalysis>, Hierarchy, Levels) {
        let mut h1 = PeriodAnalysis::neutral(Period::H1, &AnalyzerConfig::default());
        h1.degraded = false;
        h1.oscillator = 80.0;
        let mut h4 = PeriodAnalysis::neutral(Period::H4, &AnalyzerConfig::default());
        h4.degraded = false;
        h4.oscillator = 20.0;
        h4.volume.confirmed = true;
        let hierarchy = Hierarchy::from_entries(vec![
            entry(Period::H4, Signal::Buy, 50.0, 65.0),
            entry(Period::H1, Signal::Buy, 50.0, 30.0),
        ]);
        let levels = Levels::fallback(100.0, &LevelConfig::default());
        (vec![h4, h1], hierarchy, levels)
    }

    #[test]
    fn alerts_in_fixed_order() {
        let (analyses, hierarchy, levels) = evidence_fixture();
        let f = force(ForceWinner::Buy, 20.0);
        let sequences = vec![seq(Signal::Buy), seq(Signal::Buy)];
        let ev = Evidence {
            final_signal: Signal::Buy,
            probability: 88.0,
            current_price: 100.0,
            analyses: &analyses,
            hierarchy: &hierarchy,
            divergences: &[],
            sequences: &sequences,
            force: &f,
            priority: None,
            levels: &levels,
            dominant_period: Some(Period::H4),
        };
        let alerts = build_alerts(&ev);
        assert_eq!(
            alerts,
            vec![
                Alert::MultipleSequences { signal: Signal::Buy },
                Alert::ExtremeProbability { probability: 88.0 },
                Alert::Overbought { period: Period::H1, oscillator: 80.0 },
                Alert::Oversold { period: Period::H4, oscillator: 20.0 },
                Alert::ExtremeTrend { period: Period::H4, trend_strength: 65.0 },
                Alert::TightStop { distance_pct: 0.0 },
                Alert::WeakVolume { period: Period::H1 },
            ]
        );
        assert!(alerts[1].to_string().contains("high-conviction buy"));
    }

    #[test]
    fn hold_skips_stop_alert() {
        let (analyses, hierarchy, levels) = evidence_fixture();
        let f = ForceScore::default();
        let ev = Evidence {
            final_signal: Signal::Hold,
            probability: 50.0,
            current_price: 100.0,
            analyses: &analyses,
            hierarchy: &hierarchy,
            divergences: &[],
            sequences: &[],
            force: &f,
            priority: None,
            levels: &levels,
            dominant_period: None,
        };
        assert!(!build_alerts(&ev).iter().any(|a| matches!(a, Alert::TightStop { .. })));
    }

    #[test]
    fn rationale_lines() {
        let (analyses, hierarchy, levels) = evidence_fixture();
        let f = force(ForceWinner::Buy, 20.0);
        let ev = Evidence {
            final_signal: Signal::Buy,
            probability: 70.0,
            current_price: 100.0,
            analyses: &analyses,
            hierarchy: &hierarchy,
            divergences: &[],
            sequences: &[],
            force: &f,
            priority: None,
            levels: &levels,
            dominant_period: hierarchy.dominant_period(),
        };
        let lines = build_rationale(&ev);
        assert_eq!(lines.len(), 9);
        assert_eq!(lines[0], "Periods analysed: 4h, 1h");
        assert_eq!(lines[1], "Dominant period: 4h (ADX 65.0)");
        assert_eq!(lines[5], "Priority rule: none");
        assert_eq!(lines[6], "Probability: 70% for BUY");
        assert_eq!(lines[8], "Suggested targets: 100.00 -> 100.00");
    }

    #[test]
    fn cycle_error_serializes() {
        let json = serde_json::to_string(&CycleError::EmptyInput).unwrap();
        assert_eq!(json, "\"empty_input\"");
        assert_eq!(CycleError::NoPrice.to_string(), "no usable price in any period");
    }
}
