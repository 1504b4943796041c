//! Confluence Core: multi-period signal fusion, regime gate, quick assessment.
//!
//! This crate contains the whole decision path:
//! - Domain types (candles, periods, signal vocabulary, market snapshots)
//! - Indicator suite (EMA, Wilder smoothing, RSI, ADX, MACD, volume)
//! - Per-period analysis fused into one decision through a priority cascade
//! - Regime classifier with exhaustion and pullback detectors
//! - Single-period quick assessment with its probability adjustment cascade
//!
//! Everything is synchronous and pure apart from config loading. Engines own
//! their bounded logs, so callers share nothing between instances.

pub mod analysis;
pub mod config;
pub mod domain;
pub mod fingerprint;
pub mod history;
pub mod indicators;
pub mod refine;
pub mod regime;
pub mod synthetic;

pub use analysis::{Decision, DecisionEngine};
pub use config::{ConfigError, EngineConfig};
pub use domain::{Candle, MarketSnapshot, Period, PeriodSnapshot, Signal};
pub use refine::{QuickAnalyzer, QuickAssessment, RefineError};
pub use regime::{RegimeAnalysis, RegimeAnalyzer, RegimeContext};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: engines and their outputs are Send + Sync, so a
    /// caller can move an engine onto a worker thread.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::Candle>();
        require_sync::<domain::Candle>();
        require_send::<domain::MarketSnapshot>();
        require_sync::<domain::MarketSnapshot>();

        // Decision path
        require_send::<analysis::DecisionEngine>();
        require_sync::<analysis::DecisionEngine>();
        require_send::<analysis::Decision>();
        require_sync::<analysis::Decision>();

        // Regime gate
        require_send::<regime::RegimeAnalyzer>();
        require_sync::<regime::RegimeAnalyzer>();
        require_send::<regime::RegimeAnalysis>();
        require_sync::<regime::RegimeAnalysis>();

        // Quick assessment
        require_send::<refine::QuickAnalyzer>();
        require_sync::<refine::QuickAnalyzer>();

        // Config and fingerprint
        require_send::<config::EngineConfig>();
        require_sync::<config::EngineConfig>();
        require_send::<fingerprint::SnapshotHash>();
        require_sync::<fingerprint::SnapshotHash>();
        require_send::<synthetic::SyntheticMarket>();
        require_sync::<synthetic::SyntheticMarket>();
    }

    /// Architecture contract: the decision cycle reads the snapshot through a
    /// shared reference and never mutates it.
    #[test]
    fn evaluation_borrows_snapshot_immutably() {
        fn _check(engine: &analysis::DecisionEngine, snapshot: &MarketSnapshot) -> Decision {
            engine.evaluate(snapshot)
        }
    }
}
