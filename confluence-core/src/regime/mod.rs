//! Regime gate: classifies the market from structural vs. momentum bias and
//! decides whether trading is permitted at all.

pub mod analyzer;
pub mod classifier;
pub mod confidence;
pub mod exhaustion;
pub mod pullback;
pub mod structure;

pub use analyzer::{RegimeAnalysis, RegimeAnalyzer, RegimeContext, RegimeSummary};
pub use classifier::{
    classify, BlockReason, DailyContext, FineConfirmation, MarketState, RegimeInputs, RegimeResult,
    SignalType,
};
pub use confidence::{confidence_score, IndicatorWeights};
pub use exhaustion::{ExhaustionDetector, ExhaustionEvent, ExhaustionReport, ExhaustionSign};
pub use pullback::{PullbackZone, PullbackZoneCalculator};
pub use structure::MacdStructure;
