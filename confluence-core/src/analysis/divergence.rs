//! Divergence detector: directional disagreement between adjacent periods.

use super::hierarchy::{Hierarchy, HierarchyEntry};
use crate::domain::{Period, Signal};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
        })
    }
}

/// Descriptive sub-label. Never changes severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DivergenceLabel {
    Divergence,
    Strong,
    BullishOscillator,
    BearishOscillator,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Divergence {
    pub coarse: Period,
    pub fine: Period,
    pub coarse_signal: Signal,
    pub fine_signal: Signal,
    pub severity: Severity,
    pub label: DivergenceLabel,
}

impl Divergence {
    pub fn describe(&self) -> String {
        format!(
            "{} wants {} but {} wants {}",
            self.coarse, self.coarse_signal, self.fine, self.fine_signal
        )
    }
}

/// The five adjacent pairs with their preset severity.
pub const PAIRS: [(Period, Period, Severity); 5] = [
    (Period::D1, Period::H4, Severity::High),
    (Period::H4, Period::H1, Severity::Medium),
    (Period::H1, Period::M30, Severity::Low),
    (Period::M30, Period::M15, Severity::Low),
    (Period::M15, Period::M5, Severity::Low),
];

/// Trend strength above which either side escalates a pair to HIGH.
pub const DEFAULT_ESCALATION: f64 = 40.0;

pub fn detect_divergences(hierarchy: &Hierarchy, escalation: f64) -> Vec<Divergence> {
    PAIRS
        .iter()
        .filter_map(|&(coarse, fine, preset)| {
            let a = hierarchy.get(coarse)?;
            let b = hierarchy.get(fine)?;
            compare(a, b, preset, escalation)
        })
        .collect()
}

fn compare(
    a: &HierarchyEntry,
    b: &HierarchyEntry,
    preset: Severity,
    escalation: f64,
) -> Option<Divergence> {
    if !a.signal.is_directional() || !b.signal.is_directional() || a.signal == b.signal {
        return None;
    }

    let strong = a.trend_strength > escalation || b.trend_strength > escalation;
    let severity = if strong { Severity::High } else { preset };

    let mut label = if strong {
        DivergenceLabel::Strong
    } else {
        DivergenceLabel::Divergence
    };
    match (a.signal, b.signal) {
        (Signal::Buy, Signal::Sell) if a.price > b.price && a.oscillator < b.oscillator => {
            label = DivergenceLabel::BullishOscillator;
        }
        (Signal::Sell, Signal::Buy) if a.price < b.price && a.oscillator > b.oscillator => {
            label = DivergenceLabel::BearishOscillator;
        }
        _ => {}
    }

    Some(Divergence {
        coarse: a.period,
        fine: b.period,
        coarse_signal: a.signal,
        fine_signal: b.signal,
        severity,
        label,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::hierarchy::entry;

    #[test]
    fn never_fires_with_hold() {
        let h = Hierarchy::from_entries(vec![
            entry(Period::D1, Signal::Buy, 50.0, 45.0),
            entry(Period::H4, Signal::Hold, 0.0, 45.0),
        ]);
        assert!(detect_divergences(&h, DEFAULT_ESCALATION).is_empty());
    }

    #[test]
    fn preset_severity_per_pair() {
        let h = Hierarchy::from_entries(vec![
            entry(Period::H4, Signal::Buy, 50.0, 30.0),
            entry(Period::H1, Signal::Sell, 50.0, 30.0),
            entry(Period::M30, Signal::Buy, 50.0, 30.0),
        ]);
        let d = detect_divergences(&h, DEFAULT_ESCALATION);
        assert_eq!(d.len(), 2);
        assert_eq!(d[0].severity, Severity::Medium);
        assert_eq!(d[1].severity, Severity::Low);
        assert_eq!(d[0].label, DivergenceLabel::Divergence);
        assert_eq!(d[0].describe(), "4h wants BUY but 1h wants SELL");
    }

    #[test]
    fn escalates_on_strong_trend() {
        let h = Hierarchy::from_entries(vec![
            entry(Period::M15, Signal::Sell, 50.0, 41.0),
            entry(Period::M5, Signal::Buy, 50.0, 10.0),
        ]);
        let d = detect_divergences(&h, DEFAULT_ESCALATION);
        assert_eq!(d[0].severity, Severity::High);
        assert_eq!(d[0].label, DivergenceLabel::Strong);
    }

    #[test]
    fn oscillator_sub_label_keeps_severity() {
        let mut coarse = entry(Period::H1, Signal::Buy, 50.0, 20.0);
        let mut fine = entry(Period::M30, Signal::Sell, 50.0, 20.0);
        coarse.price = 101.0;
        fine.price = 100.0;
        coarse.oscillator = 40.0;
        fine.oscillator = 60.0;
        let d = detect_divergences(&Hierarchy::from_entries(vec![coarse, fine]), DEFAULT_ESCALATION);
        assert_eq!(d[0].label, DivergenceLabel::BullishOscillator);
        assert_eq!(d[0].severity, Severity::Low);
    }

    #[test]
    fn non_adjacent_pairs_ignored() {
        let h = Hierarchy::from_entries(vec![
            entry(Period::D1, Signal::Buy, 50.0, 20.0),
            entry(Period::H1, Signal::Sell, 50.0, 20.0),
        ]);
        assert!(detect_divergences(&h, DEFAULT_ESCALATION).is_empty());
    }
}
