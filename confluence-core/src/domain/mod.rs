//! Domain types: candles, periods, signal vocabulary, market snapshots.

pub mod candle;
pub mod period;
pub mod signal;
pub mod snapshot;

pub use candle::Candle;
pub use period::{ParsePeriodError, Period};
pub use signal::{Bias, MomentumLabel, Signal, TrendLabel};
pub use snapshot::{MarketSnapshot, PeriodSnapshot};
