//! Volume confirmation: is participation backing the latest move?
//!
//! Zero or missing volumes are ignored. The latest valid volume is compared
//! against the mean of the last five valid volumes.

use crate::domain::{Candle, Signal};
use serde::{Deserialize, Serialize};

const WINDOW: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VolumeStrength {
    Strong,
    Medium,
    Weak,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeConfirmation {
    pub confirmed: bool,
    pub strength: Option<VolumeStrength>,
    pub reason: String,
    /// Direction of the last five closes (majority of up moves).
    pub tendency: Option<Signal>,
}

impl VolumeConfirmation {
    fn unconfirmed(reason: &str) -> Self {
        Self {
            confirmed: false,
            strength: None,
            reason: reason.to_string(),
            tendency: None,
        }
    }
}

impl Default for VolumeConfirmation {
    fn default() -> Self {
        Self::unconfirmed("insufficient data")
    }
}

pub fn confirm_volume(candles: &[Candle]) -> VolumeConfirmation {
    if candles.len() < WINDOW {
        return VolumeConfirmation::default();
    }

    let volumes: Vec<f64> = candles
        .iter()
        .map(Candle::clean_volume)
        .filter(|v| *v > 0.0)
        .collect();
    if volumes.len() < WINDOW {
        return VolumeConfirmation::unconfirmed("zero volumes");
    }

    let recent = &volumes[volumes.len() - WINDOW..];
    let mean = recent.iter().sum::<f64>() / WINDOW as f64;
    let current = recent[WINDOW - 1];
    let rising = recent[WINDOW - 1] > recent[WINDOW - 2] && recent[WINDOW - 2] > recent[WINDOW - 3];

    let closes = &candles[candles.len() - WINDOW..];
    let ups = closes.windows(2).filter(|w| w[1].close > w[0].close).count();
    let downs = (WINDOW - 1) - ups;
    let tendency = Some(if ups > downs { Signal::Buy } else { Signal::Sell });

    let (strength, reason) = if current > mean * 1.5 && rising {
        (Some(VolumeStrength::Strong), "rising volume well above average")
    } else if current > mean * 1.2 {
        (Some(VolumeStrength::Medium), "volume above average")
    } else if current > mean {
        (Some(VolumeStrength::Weak), "volume slightly above average")
    } else {
        (None, "volume below average")
    };

    VolumeConfirmation {
        confirmed: strength.is_some(),
        strength,
        reason: reason.to_string(),
        tendency,
    }
}
