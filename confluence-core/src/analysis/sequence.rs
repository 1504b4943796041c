//! Sequence detector: contiguous runs of periods sharing one directional signal.

use super::hierarchy::Hierarchy;
use crate::domain::{Period, Signal};
use serde::{Deserialize, Serialize};

/// Window lengths scanned, shortest first.
pub const WINDOW_LENGTHS: [usize; 3] = [3, 4, 5];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedSequence {
    pub periods: Vec<Period>,
    pub signal: Signal,
    pub strength: f64,
}

impl AlignedSequence {
    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    pub fn describe(&self) -> String {
        let names: Vec<&str> = self.periods.iter().map(|p| p.label()).collect();
        format!("{} aligned on {}", names.join(", "), self.signal)
    }
}

/// All qualifying windows over the canonical period list, strongest first.
///
/// Every member of a window must be present and share one non-HOLD signal.
/// The sort is stable, so equal strengths keep discovery order (shorter
/// windows, then coarser starts).
pub fn detect_sequences(hierarchy: &Hierarchy) -> Vec<AlignedSequence> {
    let mut found: Vec<AlignedSequence> = Vec::new();

    for len in WINDOW_LENGTHS {
        for window in Period::ALL.windows(len) {
            let Some(seq) = qualify(hierarchy, window) else {
                continue;
            };
            if !found.iter().any(|s| s.periods == seq.periods) {
                found.push(seq);
            }
        }
    }

    found.sort_by(|a, b| b.strength.total_cmp(&a.strength));
    found
}

fn qualify(hierarchy: &Hierarchy, window: &[Period]) -> Option<AlignedSequence> {
    let entries = window
        .iter()
        .map(|p| hierarchy.get(*p))
        .collect::<Option<Vec<_>>>()?;
    let signal = entries.first()?.signal;
    if !signal.is_directional() || entries.iter().any(|e| e.signal != signal) {
        return None;
    }
    Some(AlignedSequence {
        periods: window.to_vec(),
        signal,
        strength: entries.iter().map(|e| e.strength).sum(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::hierarchy::entry;

    fn all_buy(strengths: [f64; 6]) -> Hierarchy {
        Hierarchy::from_entries(
            Period::ALL
                .iter()
                .zip(strengths)
                .map(|(p, s)| entry(*p, Signal::Buy, s, 30.0))
                .collect(),
        )
    }

    #[test]
    fn six_aligned_yields_every_window() {
        let seqs = detect_sequences(&all_buy([10.0, 20.0, 30.0, 40.0, 50.0, 60.0]));
        // 4 windows of 3, 3 of 4, 2 of 5
        assert_eq!(seqs.len(), 9);
        assert_eq!(seqs[0].strength, 20.0 + 30.0 + 40.0 + 50.0 + 60.0);
        assert_eq!(seqs[0].len(), 5);
        assert!(seqs.windows(2).all(|w| w[0].strength >= w[1].strength));
        assert!(seqs.iter().all(|s| s.len() <= 5));
    }

    #[test]
    fn missing_member_breaks_window() {
        let h = Hierarchy::from_entries(vec![
            entry(Period::D1, Signal::Sell, 10.0, 30.0),
            entry(Period::H4, Signal::Sell, 10.0, 30.0),
            entry(Period::M30, Signal::Sell, 10.0, 30.0),
        ]);
        assert!(detect_sequences(&h).is_empty());
    }

    #[test]
    fn hold_never_forms_sequence() {
        let h = Hierarchy::from_entries(
            Period::ALL.iter().map(|p| entry(*p, Signal::Hold, 0.0, 10.0)).collect(),
        );
        assert!(detect_sequences(&h).is_empty());
    }

    #[test]
    fn mixed_signals_qualify_separately() {
        let h = Hierarchy::from_entries(vec![
            entry(Period::D1, Signal::Buy, 10.0, 30.0),
            entry(Period::H4, Signal::Buy, 10.0, 30.0),
            entry(Period::H1, Signal::Buy, 10.0, 30.0),
            entry(Period::M30, Signal::Sell, 40.0, 30.0),
            entry(Period::M15, Signal::Sell, 40.0, 30.0),
            entry(Period::M5, Signal::Sell, 40.0, 30.0),
        ]);
        let seqs = detect_sequences(&h);
        assert_eq!(seqs.len(), 2);
        assert_eq!(seqs[0].signal, Signal::Sell);
        assert_eq!(seqs[0].describe(), "30m, 15m, 5m aligned on SELL");
    }
}
