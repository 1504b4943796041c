//! Deterministic synthetic market data.
//!
//! A master seed expands into one sub-seed per period via BLAKE3, so the
//! candles generated for a period never depend on which other periods were
//! generated first.

use crate::domain::{Candle, MarketSnapshot, Period, PeriodSnapshot};
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// 2024-06-03 00:00:00 UTC, close of the last generated candle by default.
pub const DEFAULT_ANCHOR_SECS: i64 = 1_717_372_800;

/// Shape of the random walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkParams {
    pub start_price: f64,
    /// Mean return per 5-minute step, scaled by period length.
    pub drift: f64,
    /// Return dispersion per 5-minute step, scaled by the square root of
    /// period length.
    pub volatility: f64,
    pub candles: usize,
    /// Open time of the last candle in every period, epoch seconds.
    pub anchor_secs: i64,
}

impl Default for WalkParams {
    fn default() -> Self {
        Self {
            start_price: 1000.0,
            drift: 0.0,
            volatility: 0.002,
            candles: 120,
            anchor_secs: DEFAULT_ANCHOR_SECS,
        }
    }
}

impl WalkParams {
    pub fn trending(drift: f64) -> Self {
        Self {
            drift,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyntheticMarket {
    master_seed: u64,
}

impl SyntheticMarket {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    pub fn sub_seed(&self, period: Period) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master_seed.to_le_bytes());
        hasher.update(period.label().as_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(bytes)
    }

    pub fn rng_for(&self, period: Period) -> StdRng {
        StdRng::seed_from_u64(self.sub_seed(period))
    }

    /// Random-walk candles for one period, oldest first.
    pub fn candles(&self, period: Period, params: &WalkParams) -> Vec<Candle> {
        let mut rng = self.rng_for(period);
        let steps = period.seconds() as f64 / Period::M5.seconds() as f64;
        let drift = params.drift * steps;
        let sigma = params.volatility * steps.sqrt();
        let anchor = DateTime::<Utc>::from_timestamp(params.anchor_secs, 0).unwrap_or_default();
        let n = params.candles;

        let mut prev = params.start_price.max(f64::MIN_POSITIVE);
        let mut out = Vec::with_capacity(n);
        for i in 0..n {
            // Sum of three uniforms: cheap, bounded, roughly bell-shaped.
            let shock: f64 = (0..3).map(|_| rng.gen::<f64>()).sum::<f64>() - 1.5;
            let ret = drift + sigma * shock * 2.0;
            let open = prev;
            let close = (open * (1.0 + ret)).max(open * 0.5);
            let wick_up = rng.gen::<f64>() * sigma * 0.5;
            let wick_down = rng.gen::<f64>() * sigma * 0.5;
            let back = (n - 1 - i) as i64 * period.seconds();
            out.push(Candle {
                time: anchor - Duration::seconds(back),
                open,
                high: open.max(close) * (1.0 + wick_up),
                low: open.min(close) * (1.0 - wick_down),
                close,
                volume: 1000.0 + rng.gen_range(0.0..500.0),
            });
            prev = close;
        }
        out
    }

    /// Snapshot covering `periods`, each priced at its last close.
    pub fn snapshot_for(&self, periods: &[Period], params: &WalkParams) -> MarketSnapshot {
        periods
            .iter()
            .map(|&p| (p, PeriodSnapshot::from_candles(self.candles(p, params))))
            .collect()
    }

    /// Snapshot covering all six canonical periods.
    pub fn snapshot(&self, params: &WalkParams) -> MarketSnapshot {
        self.snapshot_for(&Period::ALL, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_is_deterministic() {
        let a = SyntheticMarket::new(7).snapshot(&WalkParams::default());
        let b = SyntheticMarket::new(7).snapshot(&WalkParams::default());
        assert_eq!(a, b);
        let c = SyntheticMarket::new(8).snapshot(&WalkParams::default());
        assert_ne!(a, c);
    }

    #[test]
    fn period_order_does_not_matter() {
        let market = SyntheticMarket::new(42);
        let params = WalkParams::default();
        let forward = market.snapshot_for(&[Period::H1, Period::M5], &params);
        let reverse = market.snapshot_for(&[Period::M5, Period::H1], &params);
        assert_eq!(forward.get(Period::H1), reverse.get(Period::H1));
        assert_ne!(market.sub_seed(Period::H1), market.sub_seed(Period::M5));
    }

    #[test]
    fn candles_are_sane_and_aligned() {
        let params = WalkParams::default();
        let candles = SyntheticMarket::new(1).candles(Period::H4, &params);
        assert_eq!(candles.len(), params.candles);
        assert!(candles.iter().all(Candle::is_sane));
        assert!(candles.windows(2).all(|w| (w[1].time - w[0].time).num_seconds() == 14_400));
        assert_eq!(candles.last().unwrap().time.timestamp(), DEFAULT_ANCHOR_SECS);
        for w in candles.windows(2) {
            assert_eq!(w[1].open, w[0].close);
        }
    }

    #[test]
    fn drift_moves_price() {
        let market = SyntheticMarket::new(3);
        let up = market.candles(Period::H1, &WalkParams::trending(0.002));
        let down = market.candles(Period::H1, &WalkParams::trending(-0.002));
        assert!(up.last().unwrap().close > 1000.0);
        assert!(down.last().unwrap().close < 1000.0);
    }
}
