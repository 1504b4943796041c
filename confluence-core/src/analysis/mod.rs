//! Decision path: per-period analysis, the hierarchy and its three views,
//! the priority cascade, probability, levels and the final `Decision`.
//!
//! ```text
//! MarketSnapshot → PeriodAnalyzer → Hierarchy → {divergences, sequences, force}
//!                → priority cascade → probability → levels → Decision
//! ```

pub mod analyzer;
pub mod cascade;
pub mod decision;
pub mod divergence;
pub mod engine;
pub mod force;
pub mod hierarchy;
pub mod levels;
pub mod probability;
pub mod sequence;

pub use analyzer::{PeriodAnalysis, PeriodAnalyzer};
pub use cascade::{resolve_priority, PriorityOutcome, PriorityRule};
pub use decision::{resolve_final_signal, Alert, CycleError, Decision};
pub use divergence::{detect_divergences, Divergence, DivergenceLabel, Severity};
pub use engine::{current_price, DecisionEngine, SignalRecord};
pub use force::{aggregate_force, ForceScore, ForceWinner};
pub use hierarchy::{Hierarchy, HierarchyEntry};
pub use levels::{plan_levels, volatility_proxy, Levels};
pub use probability::{action_text, estimate_probability, ConfidenceLabel};
pub use sequence::{detect_sequences, AlignedSequence};
