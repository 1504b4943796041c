//! Priority rule cascade.
//!
//! An ordered list of tagged rules, first match wins. Each rule is a pure
//! predicate over the hierarchy and the ranked sequences, so every rule can
//! be exercised on its own.

use super::hierarchy::Hierarchy;
use super::sequence::AlignedSequence;
use crate::config::CascadeConfig;
use crate::domain::Signal;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityRule {
    /// A five-period aligned sequence.
    FullSequence,
    /// A four-period aligned sequence.
    LongSequence,
    /// The coarsest period alone, on a very strong trend.
    DominantPeriod,
    /// The mid period overriding a disagreeing finer period.
    MidOverridesFine,
    /// Mid and finer period agreeing.
    MidFineAligned,
    /// The strongest-trending directional period.
    StrongestTrend,
}

impl PriorityRule {
    /// Evaluation order.
    pub const ORDER: [PriorityRule; 6] = [
        PriorityRule::FullSequence,
        PriorityRule::LongSequence,
        PriorityRule::DominantPeriod,
        PriorityRule::MidOverridesFine,
        PriorityRule::MidFineAligned,
        PriorityRule::StrongestTrend,
    ];

    pub fn evaluate(
        &self,
        hierarchy: &Hierarchy,
        sequences: &[AlignedSequence],
        config: &CascadeConfig,
    ) -> Option<PriorityOutcome> {
        match self {
            PriorityRule::FullSequence => self.sequence_of(sequences, 5),
            PriorityRule::LongSequence => self.sequence_of(sequences, 4),
            PriorityRule::DominantPeriod => {
                let e = hierarchy.get(config.dominant_period)?;
                if e.trend_strength < config.dominant_trend_strength || !e.signal.is_directional() {
                    return None;
                }
                Some(self.outcome(
                    e.signal,
                    format!("{} dominates with ADX {:.1} (very strong)", e.period, e.trend_strength),
                ))
            }
            PriorityRule::MidOverridesFine => {
                let mid = hierarchy.get(config.mid_period)?;
                let fine = hierarchy.get(config.fine_period)?;
                // A HOLD on the finer period counts as disagreement.
                if mid.trend_strength < config.mid_trend_strength
                    || !mid.signal.is_directional()
                    || mid.signal == fine.signal
                {
                    return None;
                }
                Some(self.outcome(
                    mid.signal,
                    format!(
                        "{} dominates {} with ADX {:.1}",
                        mid.period, fine.period, mid.trend_strength
                    ),
                ))
            }
            PriorityRule::MidFineAligned => {
                let mid = hierarchy.get(config.mid_period)?;
                let fine = hierarchy.get(config.fine_period)?;
                if !mid.signal.is_directional() || mid.signal != fine.signal {
                    return None;
                }
                Some(self.outcome(
                    mid.signal,
                    format!("{} and {} aligned in {}", mid.period, fine.period, mid.signal),
                ))
            }
            PriorityRule::StrongestTrend => {
                let mut best = None;
                let mut best_strength = 0.0;
                for e in hierarchy.entries() {
                    if e.signal.is_directional() && e.trend_strength > best_strength {
                        best_strength = e.trend_strength;
                        best = Some(e);
                    }
                }
                let e = best.filter(|_| best_strength > config.fallback_trend_strength)?;
                Some(self.outcome(
                    e.signal,
                    format!("{} has the highest ADX ({:.1})", e.period, e.trend_strength),
                ))
            }
        }
    }

    fn sequence_of(&self, sequences: &[AlignedSequence], min_len: usize) -> Option<PriorityOutcome> {
        let seq = sequences.iter().find(|s| s.len() >= min_len)?;
        let mut reason = format!("Sequence of {} periods aligned in {}", seq.len(), seq.signal);
        if *self == PriorityRule::FullSequence {
            reason.push_str(" (top priority)");
        }
        Some(self.outcome(seq.signal, reason))
    }

    fn outcome(&self, signal: Signal, reason: String) -> PriorityOutcome {
        PriorityOutcome {
            rule: *self,
            signal,
            reason,
        }
    }
}

impl fmt::Display for PriorityRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PriorityRule::FullSequence => "full_sequence",
            PriorityRule::LongSequence => "long_sequence",
            PriorityRule::DominantPeriod => "dominant_period",
            PriorityRule::MidOverridesFine => "mid_overrides_fine",
            PriorityRule::MidFineAligned => "mid_fine_aligned",
            PriorityRule::StrongestTrend => "strongest_trend",
        })
    }
}

/// The rule that fired, the signal it selected and a readable reason.
/// The signal is always directional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityOutcome {
    pub rule: PriorityRule,
    pub signal: Signal,
    pub reason: String,
}

/// Run the cascade. `None` when no rule matches.
pub fn resolve_priority(
    hierarchy: &Hierarchy,
    sequences: &[AlignedSequence],
    config: &CascadeConfig,
) -> Option<PriorityOutcome> {
    let outcome = PriorityRule::ORDER
        .iter()
        .find_map(|rule| rule.evaluate(hierarchy, sequences, config));
    match &outcome {
        Some(o) => debug!(rule = %o.rule, signal = %o.signal, reason = %o.reason, "priority rule fired"),
        None => debug!("no priority rule matched"),
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::hierarchy::entry;
    use crate::analysis::sequence::detect_sequences;
    use crate::domain::Period;

    fn run(h: &Hierarchy) -> Option<PriorityOutcome> {
        resolve_priority(h, &detect_sequences(h), &CascadeConfig::default())
    }

    #[test]
    fn five_sequence_beats_everything() {
        let h = Hierarchy::from_entries(vec![
            entry(Period::D1, Signal::Sell, 90.0, 70.0),
            entry(Period::H4, Signal::Buy, 10.0, 20.0),
            entry(Period::H1, Signal::Buy, 10.0, 20.0),
            entry(Period::M30, Signal::Buy, 10.0, 20.0),
            entry(Period::M15, Signal::Buy, 10.0, 20.0),
            entry(Period::M5, Signal::Buy, 10.0, 20.0),
        ]);
        let o = run(&h).unwrap();
        assert_eq!(o.rule, PriorityRule::FullSequence);
        assert_eq!(o.signal, Signal::Buy);
        assert!(o.reason.starts_with("Sequence of 5 periods aligned in BUY"));
    }

    #[test]
    fn four_sequence_rule() {
        let h = Hierarchy::from_entries(vec![
            entry(Period::D1, Signal::Sell, 10.0, 20.0),
            entry(Period::H4, Signal::Sell, 10.0, 20.0),
            entry(Period::H1, Signal::Sell, 10.0, 20.0),
            entry(Period::M30, Signal::Sell, 10.0, 20.0),
            entry(Period::M15, Signal::Buy, 10.0, 20.0),
        ]);
        assert_eq!(run(&h).unwrap().rule, PriorityRule::LongSequence);
    }

    #[test]
    fn dominant_period_needs_directional_signal() {
        let strong_hold = Hierarchy::from_entries(vec![entry(Period::D1, Signal::Hold, 0.0, 60.0)]);
        assert!(run(&strong_hold).is_none());

        let strong_sell = Hierarchy::from_entries(vec![
            entry(Period::D1, Signal::Sell, 40.0, 50.0),
            entry(Period::H4, Signal::Buy, 40.0, 45.0),
            entry(Period::H1, Signal::Buy, 40.0, 45.0),
        ]);
        let o = run(&strong_sell).unwrap();
        assert_eq!(o.rule, PriorityRule::DominantPeriod);
        assert_eq!(o.signal, Signal::Sell);
        assert_eq!(o.reason, "24h dominates with ADX 50.0 (very strong)");
    }

    #[test]
    fn mid_overrides_disagreeing_fine() {
        let h = Hierarchy::from_entries(vec![
            entry(Period::H4, Signal::Buy, 40.0, 40.0),
            entry(Period::H1, Signal::Sell, 40.0, 35.0),
        ]);
        let o = run(&h).unwrap();
        assert_eq!(o.rule, PriorityRule::MidOverridesFine);
        assert_eq!(o.signal, Signal::Buy);
        assert_eq!(o.reason, "4h dominates 1h with ADX 40.0");
    }

    #[test]
    fn mid_fine_alignment() {
        let h = Hierarchy::from_entries(vec![
            entry(Period::H4, Signal::Sell, 30.0, 22.0),
            entry(Period::H1, Signal::Sell, 30.0, 22.0),
        ]);
        let o = run(&h).unwrap();
        assert_eq!(o.rule, PriorityRule::MidFineAligned);
        assert_eq!(o.reason, "4h and 1h aligned in SELL");
    }

    #[test]
    fn strongest_trend_fallback_is_strict() {
        let h = Hierarchy::from_entries(vec![
            entry(Period::H4, Signal::Hold, 0.0, 80.0),
            entry(Period::M30, Signal::Buy, 30.0, 35.0),
            entry(Period::M15, Signal::Sell, 30.0, 35.0),
        ]);
        let o = run(&h).unwrap();
        assert_eq!(o.rule, PriorityRule::StrongestTrend);
        assert_eq!(o.signal, Signal::Buy);

        let weak = Hierarchy::from_entries(vec![entry(Period::M30, Signal::Buy, 30.0, 30.0)]);
        assert!(run(&weak).is_none());
    }

    #[test]
    fn rules_evaluate_independently() {
        let h = Hierarchy::from_entries(vec![
            entry(Period::H4, Signal::Buy, 30.0, 45.0),
            entry(Period::H1, Signal::Buy, 30.0, 45.0),
        ]);
        let cfg = CascadeConfig::default();
        assert!(PriorityRule::MidOverridesFine.evaluate(&h, &[], &cfg).is_none());
        assert!(PriorityRule::MidFineAligned.evaluate(&h, &[], &cfg).is_some());
        assert!(PriorityRule::StrongestTrend.evaluate(&h, &[], &cfg).is_some());
    }
}
