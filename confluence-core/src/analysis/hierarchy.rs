//! Hierarchy builder: per-period analyses paired with their configured weight.

use super::analyzer::PeriodAnalysis;
use crate::config::PeriodWeights;
use crate::domain::{Period, Signal, TrendLabel};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyEntry {
    pub period: Period,
    pub signal: Signal,
    pub strength: f64,
    pub weight: f64,
    pub trend: TrendLabel,
    pub trend_strength: f64,
    pub oscillator: f64,
    pub price: f64,
}

/// Entries for the present periods in canonical coarse → fine order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Hierarchy {
    entries: Vec<HierarchyEntry>,
}

impl Hierarchy {
    /// Missing periods are simply absent.
    pub fn build(analyses: &[PeriodAnalysis], weights: &PeriodWeights) -> Self {
        let mut entries: Vec<HierarchyEntry> = analyses
            .iter()
            .map(|a| HierarchyEntry {
                period: a.period,
                signal: a.signal,
                strength: a.strength,
                weight: weights.weight(a.period),
                trend: a.trend,
                trend_strength: a.trend_strength,
                oscillator: a.oscillator,
                price: a.price,
            })
            .collect();
        entries.sort_by_key(|e| e.period);
        entries.dedup_by_key(|e| e.period);
        Self { entries }
    }

    pub fn from_entries(mut entries: Vec<HierarchyEntry>) -> Self {
        entries.sort_by_key(|e| e.period);
        entries.dedup_by_key(|e| e.period);
        Self { entries }
    }

    pub fn get(&self, period: Period) -> Option<&HierarchyEntry> {
        self.entries.iter().find(|e| e.period == period)
    }

    pub fn entries(&self) -> &[HierarchyEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Period with the highest trend strength; the first strict maximum in
    /// canonical order wins ties. None when every reading is zero.
    pub fn dominant_period(&self) -> Option<Period> {
        let mut best: Option<(Period, f64)> = None;
        for e in &self.entries {
            if e.trend_strength > best.map_or(0.0, |(_, v)| v) {
                best = Some((e.period, e.trend_strength));
            }
        }
        best.map(|(p, _)| p)
    }
}

#[cfg(test)]
pub(crate) fn entry(period: Period, signal: Signal, strength: f64, trend_strength: f64) -> HierarchyEntry {
    HierarchyEntry {
        period,
        signal,
        strength,
        weight: PeriodWeights::default().weight(period),
        trend: TrendLabel::Moderate,
        trend_strength,
        oscillator: 50.0,
        price: 100.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_canonically_and_skips_missing() {
        let h = Hierarchy::from_entries(vec![
            entry(Period::M5, Signal::Buy, 10.0, 20.0),
            entry(Period::D1, Signal::Sell, 10.0, 20.0),
        ]);
        let periods: Vec<Period> = h.entries().iter().map(|e| e.period).collect();
        assert_eq!(periods, vec![Period::D1, Period::M5]);
        assert!(h.get(Period::H1).is_none());
        assert_eq!(h.get(Period::D1).unwrap().weight, 0.35);
    }

    #[test]
    fn dominant_period_first_strict_max() {
        let h = Hierarchy::from_entries(vec![
            entry(Period::D1, Signal::Hold, 0.0, 30.0),
            entry(Period::H4, Signal::Buy, 0.0, 45.0),
            entry(Period::H1, Signal::Buy, 0.0, 45.0),
        ]);
        assert_eq!(h.dominant_period(), Some(Period::H4));
        assert_eq!(Hierarchy::default().dominant_period(), None);
    }
}
