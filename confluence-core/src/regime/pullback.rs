//! Pullback zone calculator: where to re-enter a trend after a counter move.

use crate::config::PullbackConfig;
use crate::domain::{Candle, Signal};
use crate::history::BoundedLog;
use crate::indicators::dynamic_atr;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullbackZone {
    pub low: f64,
    pub high: f64,
    /// Percent, 40..=80 with the default step and cap.
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
    pub direction: Signal,
}

impl PullbackZone {
    pub fn contains(&self, price: f64) -> bool {
        price >= self.low && price <= self.high
    }
}

#[derive(Debug, Clone)]
pub struct PullbackZoneCalculator {
    config: PullbackConfig,
    zones: BoundedLog<PullbackZone>,
}

impl PullbackZoneCalculator {
    pub fn new(config: PullbackConfig, log_capacity: usize) -> Self {
        Self {
            config,
            zones: BoundedLog::new(log_capacity),
        }
    }

    pub fn config(&self) -> &PullbackConfig {
        &self.config
    }

    /// Mean true range over the configured ATR window.
    pub fn atr(&self, candles: &[Candle]) -> f64 {
        dynamic_atr(candles, self.config.atr_period)
    }

    /// Find a zone and record it.
    pub fn calculate(
        &mut self,
        candles: &[Candle],
        direction: Signal,
        atr: f64,
        now: DateTime<Utc>,
    ) -> Option<PullbackZone> {
        let zone = self.find_zone(candles, direction, atr, now)?;
        self.zones.push(zone.clone());
        Some(zone)
    }

    /// BUY needs enough bearish candles in the window and the latest close
    /// above the prior one; the zone sits on the window low. SELL mirrors it
    /// on the window high.
    pub fn find_zone(
        &self,
        candles: &[Candle],
        direction: Signal,
        atr: f64,
        now: DateTime<Utc>,
    ) -> Option<PullbackZone> {
        let n = self.config.window;
        if n < 2 || candles.len() < n {
            return None;
        }
        let window = &candles[candles.len() - n..];
        let last = window[n - 1].close;
        let prev = window[n - 2].close;
        let width = atr * self.config.atr_multiplier;

        let (counter, turned) = match direction {
            Signal::Buy => (window.iter().filter(|c| c.is_bearish()).count(), last > prev),
            Signal::Sell => (window.iter().filter(|c| c.is_bullish()).count(), last < prev),
            Signal::Hold => return None,
        };
        if counter < self.config.min_counter_candles || !turned {
            return None;
        }

        let (low, high) = if direction == Signal::Buy {
            let low = window.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
            (low, low + width)
        } else {
            let high = window.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
            (high - width, high)
        };
        if !(low.is_finite() && high.is_finite()) {
            return None;
        }

        Some(PullbackZone {
            low,
            high,
            confidence: (counter as f64 * self.config.confidence_step).min(self.config.confidence_cap),
            created_at: now,
            direction,
        })
    }

    /// Zones younger than the configured max age.
    pub fn active_zones(&self, now: DateTime<Utc>) -> Vec<&PullbackZone> {
        let cutoff = now - Duration::seconds(self.config.max_age_secs);
        self.zones.iter().filter(|z| z.created_at > cutoff).collect()
    }

    /// Drop zones older than the configured max age.
    pub fn prune(&mut self, now: DateTime<Utc>) {
        let cutoff = now - Duration::seconds(self.config.max_age_secs);
        self.zones.retain(|z| z.created_at > cutoff);
    }

    pub fn zones(&self) -> &BoundedLog<PullbackZone> {
        &self.zones
    }
}
