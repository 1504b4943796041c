//! Input fingerprinting: a stable content hash of a market snapshot.
//!
//! The snapshot map is a `BTreeMap`, so serde_json emits periods in canonical
//! order and identical inputs always hash identically.

use crate::domain::MarketSnapshot;
use serde::{Deserialize, Serialize};
use std::fmt;

/// BLAKE3 hex digest of the canonical snapshot JSON.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotHash(pub String);

impl SnapshotHash {
    pub fn of(snapshot: &MarketSnapshot) -> Result<Self, serde_json::Error> {
        let json = serde_json::to_vec(snapshot)?;
        Ok(Self::from_bytes(&json))
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes).to_hex().to_string())
    }

    /// First 12 hex characters, for logs.
    pub fn short(&self) -> &str {
        self.0.get(..12).unwrap_or(&self.0)
    }
}

impl fmt::Display for SnapshotHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
