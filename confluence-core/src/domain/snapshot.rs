//! Market snapshot: the immutable per-cycle input.

use super::{Candle, Period};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One period's current price plus its ordered candle history.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PeriodSnapshot {
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub candles: Vec<Candle>,
}

impl PeriodSnapshot {
    pub fn new(price: f64, candles: Vec<Candle>) -> Self {
        Self { price, candles }
    }

    /// Build from candles alone, taking the last close as price.
    pub fn from_candles(candles: Vec<Candle>) -> Self {
        let price = candles.last().map(|c| c.close).unwrap_or(0.0);
        Self { price, candles }
    }

    pub fn last_candle(&self) -> Option<&Candle> {
        self.candles.last()
    }

    /// Reported price if usable, else the last finite close, else 0.0.
    pub fn effective_price(&self) -> f64 {
        if self.price.is_finite() && self.price > 0.0 {
            return self.price;
        }
        self.candles
            .iter()
            .rev()
            .map(|c| c.close)
            .find(|c| c.is_finite() && *c > 0.0)
            .unwrap_or(0.0)
    }

    pub fn latest_time(&self) -> Option<DateTime<Utc>> {
        self.candles.iter().map(|c| c.time).max()
    }
}

/// Mapping from period to its snapshot, any subset of the canonical set.
///
/// Iteration is always coarse → fine because `Period` orders canonically.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarketSnapshot {
    periods: BTreeMap<Period, PeriodSnapshot>,
}

impl MarketSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, period: Period, snapshot: PeriodSnapshot) {
        self.periods.insert(period, snapshot);
    }

    pub fn with(mut self, period: Period, snapshot: PeriodSnapshot) -> Self {
        self.insert(period, snapshot);
        self
    }

    pub fn get(&self, period: Period) -> Option<&PeriodSnapshot> {
        self.periods.get(&period)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Period, &PeriodSnapshot)> {
        self.periods.iter().map(|(p, s)| (*p, s))
    }

    pub fn periods(&self) -> impl Iterator<Item = Period> + '_ {
        self.periods.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    /// True when no period is present or every present period has no candles.
    pub fn is_empty(&self) -> bool {
        self.periods.values().all(|s| s.candles.is_empty())
    }

    /// Latest candle time across all periods.
    pub fn latest_time(&self) -> Option<DateTime<Utc>> {
        self.periods.values().filter_map(|s| s.latest_time()).max()
    }
}

impl FromIterator<(Period, PeriodSnapshot)> for MarketSnapshot {
    fn from_iter<I: IntoIterator<Item = (Period, PeriodSnapshot)>>(iter: I) -> Self {
        Self {
            periods: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn candle(ts: i64, close: f64) -> Candle {
        Candle {
            time: Utc.timestamp_opt(ts, 0).unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 10.0,
        }
    }

    #[test]
    fn iterates_coarse_to_fine() {
        let snap = MarketSnapshot::new()
            .with(Period::M5, PeriodSnapshot::default())
            .with(Period::D1, PeriodSnapshot::default())
            .with(Period::H1, PeriodSnapshot::default());
        let order: Vec<Period> = snap.periods().collect();
        assert_eq!(order, vec![Period::D1, Period::H1, Period::M5]);
    }

    #[test]
    fn effective_price_falls_back_to_close() {
        let snap = PeriodSnapshot::new(0.0, vec![candle(0, 10.0), candle(60, 12.0)]);
        assert_eq!(snap.effective_price(), 12.0);
        let snap = PeriodSnapshot::new(f64::NAN, vec![]);
        assert_eq!(snap.effective_price(), 0.0);
    }

    #[test]
    fn latest_time_spans_periods() {
        let snap = MarketSnapshot::new()
            .with(Period::H1, PeriodSnapshot::from_candles(vec![candle(100, 1.0)]))
            .with(Period::M5, PeriodSnapshot::from_candles(vec![candle(500, 1.0)]));
        assert_eq!(snap.latest_time(), Some(Utc.timestamp_opt(500, 0).unwrap()));
    }

    #[test]
    fn deserializes_from_period_keyed_map() {
        let json = r#"{"1h":{"price":101.5,"candles":[{"time":0,"open":1,"high":2,"low":0.5,"close":1.5}]}}"#;
        let snap: MarketSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap.get(Period::H1).unwrap().price, 101.5);
        assert!(!snap.is_empty());
    }
}
