//! Force aggregator: weighted directional strength over non-HOLD periods.

use super::hierarchy::Hierarchy;
use crate::domain::Signal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ForceWinner {
    Buy,
    Sell,
    #[default]
    Tie,
}

impl ForceWinner {
    pub fn signal(&self) -> Signal {
        match self {
            ForceWinner::Buy => Signal::Buy,
            ForceWinner::Sell => Signal::Sell,
            ForceWinner::Tie => Signal::Hold,
        }
    }
}

impl fmt::Display for ForceWinner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ForceWinner::Buy => "BUY",
            ForceWinner::Sell => "SELL",
            ForceWinner::Tie => "TIE",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ForceScore {
    pub buy: f64,
    pub sell: f64,
    pub winner: ForceWinner,
    pub margin: f64,
}

/// Aggregate directional force.
///
/// Each side accumulates strength × weight over its periods and is divided by
/// the total weight of contributing (non-HOLD) periods. The two sides are then
/// expressed as shares of their sum, scaled to [0,100].
pub fn aggregate_force(hierarchy: &Hierarchy) -> ForceScore {
    let mut buy = 0.0;
    let mut sell = 0.0;
    let mut weight = 0.0;

    for e in hierarchy.entries() {
        match e.signal {
            Signal::Buy => buy += e.strength * e.weight,
            Signal::Sell => sell += e.strength * e.weight,
            Signal::Hold => continue,
        }
        weight += e.weight;
    }

    if weight <= 0.0 {
        return ForceScore::default();
    }
    buy /= weight;
    sell /= weight;

    let total = buy + sell;
    let (buy, sell) = if total > 0.0 && total.is_finite() {
        (buy / total * 100.0, sell / total * 100.0)
    } else {
        (0.0, 0.0)
    };

    let winner = if buy > sell {
        ForceWinner::Buy
    } else if sell > buy {
        ForceWinner::Sell
    } else {
        ForceWinner::Tie
    };

    ForceScore {
        buy,
        sell,
        winner,
        margin: (buy - sell).abs(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::hierarchy::entry;
    use crate::domain::Period;
    use crate::indicators::assert_approx;

    #[test]
    fn all_hold_is_tie() {
        let h = Hierarchy::from_entries(
            Period::ALL.iter().map(|p| entry(*p, Signal::Hold, 40.0, 30.0)).collect(),
        );
        let f = aggregate_force(&h);
        assert_eq!(f.winner, ForceWinner::Tie);
        assert_eq!(f.margin, 0.0);
    }

    #[test]
    fn unanimous_buy_is_full_force() {
        let strengths = [10.0, 20.0, 30.0, 40.0, 50.0, 60.0];
        let h = Hierarchy::from_entries(
            Period::ALL
                .iter()
                .zip(strengths)
                .map(|(p, s)| entry(*p, Signal::Buy, s, 30.0))
                .collect(),
        );
        let f = aggregate_force(&h);
        assert_approx(f.buy, 100.0, 1e-9);
        assert_eq!(f.sell, 0.0);
        assert_eq!(f.winner, ForceWinner::Buy);
        assert_approx(f.margin, 100.0, 1e-9);
    }

    #[test]
    fn weighted_split() {
        // buy: 60 * 0.35 = 21, sell: 60 * 0.25 = 15 → shares 58.33 / 41.67
        let h = Hierarchy::from_entries(vec![
            entry(Period::D1, Signal::Buy, 60.0, 30.0),
            entry(Period::H4, Signal::Sell, 60.0, 30.0),
            entry(Period::H1, Signal::Hold, 90.0, 30.0),
        ]);
        let f = aggregate_force(&h);
        assert_approx(f.buy, 21.0 / 36.0 * 100.0, 1e-9);
        assert_approx(f.sell, 15.0 / 36.0 * 100.0, 1e-9);
        assert_eq!(f.winner, ForceWinner::Buy);
    }

    #[test]
    fn zero_strength_directional_is_tie() {
        let h = Hierarchy::from_entries(vec![entry(Period::H1, Signal::Buy, 0.0, 30.0)]);
        assert_eq!(aggregate_force(&h).winner, ForceWinner::Tie);
    }
}
