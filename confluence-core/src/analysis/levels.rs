//! Level planner: volatility-scaled support, resistance, stop and targets.

use super::analyzer::PeriodAnalysis;
use crate::config::LevelConfig;
use crate::domain::Signal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Levels {
    pub entry: f64,
    /// Nearest first.
    pub supports: [f64; 3],
    /// Nearest first.
    pub resistances: [f64; 3],
    pub stop_loss: f64,
    pub targets: [f64; 2],
    /// Volatility proxy as a fraction of price. Zero for fallback levels.
    pub volatility: f64,
}

impl Levels {
    /// Price-only levels, used when the price or analyses are unavailable.
    pub fn fallback(price: f64, config: &LevelConfig) -> Self {
        let s = config.fallback_steps;
        let floor = |v: f64| floor_level(v, config.level_floor);
        Self {
            entry: floor(price),
            supports: s.map(|step| floor(price * (1.0 - step))),
            resistances: s.map(|step| floor(price * (1.0 + step))),
            stop_loss: floor(price),
            targets: [floor(price); 2],
            volatility: 0.0,
        }
    }

    /// Stop distance as a percentage of `price`.
    pub fn stop_distance_pct(&self, price: f64) -> f64 {
        if price > 0.0 {
            (self.stop_loss - price).abs() / price * 100.0
        } else {
            0.0
        }
    }
}

pub fn plan_levels(
    price: f64,
    analyses: &[PeriodAnalysis],
    signal: Signal,
    config: &LevelConfig,
) -> Levels {
    if !(price.is_finite() && price > 0.0) || analyses.is_empty() {
        return Levels::fallback(price.max(0.0), config);
    }

    let volatility = volatility_proxy(analyses, config);
    let floor = |v: f64| floor_level(v, config.level_floor);
    let distances = config.multipliers.map(|m| price * volatility * m);
    let supports = distances.map(|d| price - d);
    let resistances = distances.map(|d| price + d);

    let stop_distance = price * volatility * config.stop_multiplier;
    let (stop_loss, targets) = match signal {
        Signal::Buy => (
            supports[1].max(price - stop_distance),
            [resistances[0], resistances[1]],
        ),
        Signal::Sell => (
            resistances[1].min(price + stop_distance),
            [supports[0], supports[1]],
        ),
        Signal::Hold => (price, [price, price]),
    };

    Levels {
        entry: price,
        supports: supports.map(floor),
        resistances: resistances.map(floor),
        stop_loss: floor(stop_loss),
        targets: targets.map(floor),
        volatility,
    }
}

/// max(min_volatility, mean trend strength / 100, mean last-candle range ×
/// range_factor, volatility_floor).
pub fn volatility_proxy(analyses: &[PeriodAnalysis], config: &LevelConfig) -> f64 {
    let trend = if analyses.is_empty() {
        0.0
    } else {
        analyses.iter().map(|a| a.trend_strength).sum::<f64>() / analyses.len() as f64 / 100.0
    };
    let trend = if trend.is_finite() { trend } else { 0.0 };

    let ranges: Vec<f64> = analyses
        .iter()
        .filter(|a| a.price > 0.0)
        .filter_map(|a| {
            let c = a.last_candle.as_ref()?;
            let r = (c.high - c.low) / a.price;
            (r.is_finite() && r > 0.0).then_some(r)
        })
        .collect();
    let range = if ranges.is_empty() {
        config.default_range_ratio
    } else {
        ranges.iter().sum::<f64>() / ranges.len() as f64
    };

    config
        .min_volatility
        .max(trend)
        .max(range * config.range_factor)
        .max(config.volatility_floor)
}

fn floor_level(value: f64, floor: f64) -> f64 {
    if value.is_finite() {
        value.max(floor)
    } else {
        floor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalyzerConfig;
    use crate::domain::{Candle, Period};
    use crate::indicators::assert_approx;
    use chrono::{TimeZone, Utc};

    fn analysis(trend_strength: f64, price: f64, high: f64, low: f64) -> PeriodAnalysis {
        let mut a = PeriodAnalysis::neutral(Period::H1, &AnalyzerConfig::default());
        a.trend_strength = trend_strength;
        a.price = price;
        a.last_candle = Some(Candle {
            time: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
            open: price,
            high,
            low,
            close: price,
            volume: 1000.0,
        });
        a
    }

    #[test]
    fn buy_levels_use_trend_volatility() {
        // trend 30 → 0.30 dominates range 0.02 × 2
        let a = vec![analysis(30.0, 1000.0, 1010.0, 990.0)];
        let l = plan_levels(1000.0, &a, Signal::Buy, &LevelConfig::default());
        assert_approx(l.volatility, 0.30, 1e-12);
        assert_approx(l.supports[0], 700.0, 1e-9);
        assert_approx(l.supports[1], 550.0, 1e-9);
        assert_approx(l.resistances[2], 1600.0, 1e-9);
        assert_approx(l.stop_loss, 550.0, 1e-9);
        assert_eq!(l.targets, [l.resistances[0], l.resistances[1]]);
    }

    #[test]
    fn sell_levels_mirror() {
        let a = vec![analysis(1.0, 1000.0, 1020.0, 980.0)];
        let l = plan_levels(1000.0, &a, Signal::Sell, &LevelConfig::default());
        // range 0.04 × 2 = 0.08
        assert_approx(l.volatility, 0.08, 1e-12);
        assert_approx(l.stop_loss, 1120.0, 1e-9);
        assert_eq!(l.targets, [l.supports[0], l.supports[1]]);
    }

    #[test]
    fn hold_stop_is_price() {
        let a = vec![analysis(25.0, 50.0, 51.0, 49.0)];
        let l = plan_levels(50.0, &a, Signal::Hold, &LevelConfig::default());
        assert_eq!(l.stop_loss, 50.0);
        assert_eq!(l.targets, [50.0, 50.0]);
    }

    #[test]
    fn low_price_levels_are_floored() {
        let a = vec![analysis(90.0, 1.5, 1.6, 1.4)];
        let l = plan_levels(1.5, &a, Signal::Buy, &LevelConfig::default());
        assert!(l.supports.iter().all(|s| *s >= 1.0));
        assert!(l.stop_loss >= 1.0);
    }

    #[test]
    fn unknown_price_degenerates() {
        let l = plan_levels(0.0, &[], Signal::Buy, &LevelConfig::default());
        assert_eq!(l.volatility, 0.0);
        assert!(l.supports.iter().chain(l.resistances.iter()).all(|v| *v >= 1.0));
        assert_eq!(l.entry, 1.0);
    }

    #[test]
    fn missing_candle_uses_default_range() {
        let mut a = analysis(0.0, 100.0, 100.0, 100.0);
        a.last_candle = None;
        // default range 0.01 × 2 = 0.02
        assert_approx(volatility_proxy(&[a], &LevelConfig::default()), 0.02, 1e-12);
    }

    #[test]
    fn stop_distance_percentage() {
        let a = vec![analysis(30.0, 1000.0, 1010.0, 990.0)];
        let l = plan_levels(1000.0, &a, Signal::Buy, &LevelConfig::default());
        assert_approx(l.stop_distance_pct(1000.0), 45.0, 1e-9);
    }
}
