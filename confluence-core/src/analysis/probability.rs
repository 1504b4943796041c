//! Probability estimator.
//!
//! The result reads as the probability of an upward move: above 50 favors
//! BUY, below 50 favors SELL.

use super::cascade::PriorityOutcome;
use super::divergence::{Divergence, Severity};
use super::force::{ForceScore, ForceWinner};
use super::sequence::AlignedSequence;
use crate::config::ProbabilityConfig;
use crate::domain::Signal;
use serde::{Deserialize, Serialize};
use std::fmt;

pub fn estimate_probability(
    force: &ForceScore,
    sequences: &[AlignedSequence],
    priority: Option<&PriorityOutcome>,
    divergences: &[Divergence],
    config: &ProbabilityConfig,
) -> f64 {
    let mut p = config.base;

    let edge = force.margin.min(config.margin_cap);
    match force.winner {
        ForceWinner::Buy => p += edge,
        ForceWinner::Sell => p -= edge,
        ForceWinner::Tie => {}
    }

    // Sequences arrive ranked, strongest first.
    if let Some(seq) = sequences.first() {
        let bonus = (seq.strength / config.sequence_divisor).min(config.sequence_cap);
        p += seq.signal.sign() * bonus;
    }

    if let Some(o) = priority {
        p += o.signal.sign() * config.priority_bonus;
    }

    if divergences.iter().any(|d| d.severity == Severity::High) {
        let pull = (config.divergence_step * divergences.len() as f64).min(config.divergence_cap);
        p = if p > config.base {
            (p - pull).max(config.base)
        } else {
            (p + pull).min(config.base)
        };
    }

    if !p.is_finite() {
        p = config.base;
    }
    p.round().clamp(config.min, config.max)
}

/// Confidence bands over the probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfidenceLabel {
    VeryHigh,
    High,
    Moderate,
    Low,
    VeryLow,
}

impl ConfidenceLabel {
    pub fn from_probability(probability: f64) -> Self {
        if probability >= 80.0 {
            ConfidenceLabel::VeryHigh
        } else if probability >= 70.0 {
            ConfidenceLabel::High
        } else if probability >= 60.0 {
            ConfidenceLabel::Moderate
        } else if probability >= 50.0 {
            ConfidenceLabel::Low
        } else {
            ConfidenceLabel::VeryLow
        }
    }
}

impl fmt::Display for ConfidenceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConfidenceLabel::VeryHigh => "VERY HIGH",
            ConfidenceLabel::High => "HIGH",
            ConfidenceLabel::Moderate => "MODERATE",
            ConfidenceLabel::Low => "LOW",
            ConfidenceLabel::VeryLow => "VERY LOW",
        })
    }
}

/// Suggested action keyed by the final signal and probability band.
pub fn action_text(signal: Signal, probability: f64) -> &'static str {
    match signal {
        Signal::Buy if probability >= 75.0 => "BUY NOW (strong confirmed signal)",
        Signal::Buy if probability >= 65.0 => "BUY THE DIP (wait for support)",
        Signal::Buy if probability >= 55.0 => "WAIT for confirmation above resistance",
        Signal::Buy => "HOLD - no ideal conditions to buy",
        Signal::Sell if probability <= 25.0 => "SELL NOW (strong confirmed signal)",
        Signal::Sell if probability <= 35.0 => "SELL THE RALLY (wait for resistance)",
        Signal::Sell if probability <= 45.0 => "WAIT for confirmation below support",
        Signal::Sell => "HOLD - no ideal conditions to sell",
        Signal::Hold => "HOLD - neutral market, wait for direction",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::cascade::PriorityRule;
    use crate::analysis::divergence::DivergenceLabel;
    use crate::domain::Period;

    fn cfg() -> ProbabilityConfig {
        ProbabilityConfig::default()
    }

    fn force(winner: ForceWinner, margin: f64) -> ForceScore {
        ForceScore {
            buy: 0.0,
            sell: 0.0,
            winner,
            margin,
        }
    }

    fn seq(signal: Signal, strength: f64) -> AlignedSequence {
        AlignedSequence {
            periods: vec![Period::D1, Period::H4, Period::H1],
            signal,
            strength,
        }
    }

    fn high_divergence() -> Divergence {
        Divergence {
            coarse: Period::D1,
            fine: Period::H4,
            coarse_signal: Signal::Buy,
            fine_signal: Signal::Sell,
            severity: Severity::High,
            label: DivergenceLabel::Divergence,
        }
    }

    #[test]
    fn neutral_inputs_stay_at_base() {
        let p = estimate_probability(&ForceScore::default(), &[], None, &[], &cfg());
        assert_eq!(p, 50.0);
    }

    #[test]
    fn components_are_signed_and_capped() {
        let priority = PriorityOutcome {
            rule: PriorityRule::FullSequence,
            signal: Signal::Buy,
            reason: String::new(),
        };
        // 50 + 20 + 25 + 10 = 105 → 90
        let p = estimate_probability(
            &force(ForceWinner::Buy, 100.0),
            &[seq(Signal::Buy, 200.0)],
            Some(&priority),
            &[],
            &cfg(),
        );
        assert_eq!(p, 90.0);

        // 50 - 8 - 10 = 32
        let p = estimate_probability(
            &force(ForceWinner::Sell, 8.0),
            &[seq(Signal::Sell, 40.0)],
            None,
            &[],
            &cfg(),
        );
        assert_eq!(p, 32.0);
    }

    #[test]
    fn high_divergence_pulls_toward_base_without_crossing() {
        let divs = vec![high_divergence()];
        // 50 + 3 = 53, pull 5 → stops at 50
        let p = estimate_probability(&force(ForceWinner::Buy, 3.0), &[], None, &divs, &cfg());
        assert_eq!(p, 50.0);
        // 50 - 20 = 30, pull 5 → 35
        let p = estimate_probability(&force(ForceWinner::Sell, 20.0), &[], None, &divs, &cfg());
        assert_eq!(p, 35.0);
    }

    #[test]
    fn low_divergences_alone_do_not_pull() {
        let mut d = high_divergence();
        d.severity = Severity::Low;
        let p = estimate_probability(&force(ForceWinner::Buy, 20.0), &[], None, &[d], &cfg());
        assert_eq!(p, 70.0);
    }

    #[test]
    fn pull_counts_all_divergences_capped() {
        let mut low = high_divergence();
        low.severity = Severity::Low;
        let divs = vec![high_divergence(), low.clone(), low.clone(), low];
        // pull = min(15, 20) = 15
        let p = estimate_probability(&force(ForceWinner::Buy, 20.0), &[seq(Signal::Buy, 40.0)], None, &divs, &cfg());
        assert_eq!(p, 80.0 - 15.0);
    }

    #[test]
    fn confidence_bands() {
        assert_eq!(ConfidenceLabel::from_probability(80.0), ConfidenceLabel::VeryHigh);
        assert_eq!(ConfidenceLabel::from_probability(79.0), ConfidenceLabel::High);
        assert_eq!(ConfidenceLabel::from_probability(60.0), ConfidenceLabel::Moderate);
        assert_eq!(ConfidenceLabel::from_probability(50.0), ConfidenceLabel::Low);
        assert_eq!(ConfidenceLabel::from_probability(12.0), ConfidenceLabel::VeryLow);
    }

    #[test]
    fn action_bands() {
        assert!(action_text(Signal::Buy, 76.0).starts_with("BUY NOW"));
        assert!(action_text(Signal::Buy, 50.0).starts_with("HOLD"));
        assert!(action_text(Signal::Sell, 30.0).starts_with("SELL THE RALLY"));
        assert!(action_text(Signal::Sell, 60.0).starts_with("HOLD"));
        assert!(action_text(Signal::Hold, 90.0).contains("neutral"));
    }
}
