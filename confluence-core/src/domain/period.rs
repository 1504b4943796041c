//! Period: a fixed candle-aggregation interval treated as one evidence source.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Canonical candle periods, ordered coarse → fine.
///
/// The derived `Ord` follows declaration order, so sorting a set of periods
/// yields the canonical coarse → fine sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "24h")]
    D1,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "30m")]
    M30,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "5m")]
    M5,
}

impl Period {
    /// All periods in canonical coarse → fine order.
    pub const ALL: [Period; 6] = [
        Period::D1,
        Period::H4,
        Period::H1,
        Period::M30,
        Period::M15,
        Period::M5,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Period::D1 => "24h",
            Period::H4 => "4h",
            Period::H1 => "1h",
            Period::M30 => "30m",
            Period::M15 => "15m",
            Period::M5 => "5m",
        }
    }

    /// Candle length in seconds.
    pub fn seconds(&self) -> i64 {
        match self {
            Period::D1 => 86_400,
            Period::H4 => 14_400,
            Period::H1 => 3_600,
            Period::M30 => 1_800,
            Period::M15 => 900,
            Period::M5 => 300,
        }
    }

    /// Position in the canonical order (0 = coarsest).
    pub fn rank(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown period '{0}' (expected one of 24h, 4h, 1h, 30m, 15m, 5m)")]
pub struct ParsePeriodError(pub String);

impl FromStr for Period {
    type Err = ParsePeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "24h" | "1d" | "d1" => Ok(Period::D1),
            "4h" | "h4" => Ok(Period::H4),
            "1h" | "h1" => Ok(Period::H1),
            "30m" | "m30" => Ok(Period::M30),
            "15m" | "m15" => Ok(Period::M15),
            "5m" | "m5" => Ok(Period::M5),
            other => Err(ParsePeriodError(other.to_string())),
        }
    }
}
