//! Decision engine: one full cycle from a market snapshot to a `Decision`.
//!
//! `evaluate` is pure. `run` evaluates and appends to the engine's bounded
//! signal log, so two engines never share state.

use super::analyzer::{PeriodAnalysis, PeriodAnalyzer};
use super::cascade::resolve_priority;
use super::decision::{build_alerts, build_rationale, resolve_final_signal, CycleError, Decision, Evidence};
use super::divergence::detect_divergences;
use super::force::aggregate_force;
use super::hierarchy::Hierarchy;
use super::levels::{plan_levels, Levels};
use super::probability::{action_text, estimate_probability, ConfidenceLabel};
use super::sequence::detect_sequences;
use crate::config::EngineConfig;
use crate::domain::{MarketSnapshot, Period, Signal};
use crate::fingerprint::SnapshotHash;
use crate::history::BoundedLog;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Periods consulted, in order, for the current price.
pub const PRICE_PERIODS: [Period; 2] = [Period::H1, Period::H4];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    pub timestamp: Option<DateTime<Utc>>,
    pub signal: Signal,
    pub probability: f64,
    pub price: f64,
}

#[derive(Debug, Clone)]
pub struct DecisionEngine {
    config: EngineConfig,
    analyzer: PeriodAnalyzer,
    signal_log: BoundedLog<SignalRecord>,
}

impl DecisionEngine {
    pub fn new(config: EngineConfig) -> Self {
        let analyzer = PeriodAnalyzer::new(config.analyzer.clone());
        let signal_log = BoundedLog::new(config.history.signal_log);
        Self {
            config,
            analyzer,
            signal_log,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn signal_log(&self) -> &BoundedLog<SignalRecord> {
        &self.signal_log
    }

    /// Evaluate and record the outcome in the signal log.
    pub fn run(&mut self, snapshot: &MarketSnapshot) -> Decision {
        let decision = self.evaluate(snapshot);
        self.signal_log.push(SignalRecord {
            timestamp: decision.timestamp,
            signal: decision.final_signal,
            probability: decision.probability,
            price: decision.current_price,
        });
        decision
    }

    pub fn evaluate(&self, snapshot: &MarketSnapshot) -> Decision {
        let fingerprint = SnapshotHash::of(snapshot).ok();
        let timestamp = snapshot.latest_time();
        let current_price = current_price(snapshot);

        if snapshot.is_empty() {
            warn!(periods = snapshot.len(), "empty snapshot, emitting neutral decision");
            return self.neutral_decision(current_price, timestamp, fingerprint, CycleError::EmptyInput);
        }

        let analyses: Vec<PeriodAnalysis> = snapshot
            .iter()
            .map(|(period, snap)| self.analyzer.analyze(period, snap))
            .collect();

        let hierarchy = Hierarchy::build(&analyses, &self.config.weights);
        let dominant_period = hierarchy.dominant_period();
        let divergences = detect_divergences(&hierarchy, self.config.cascade.divergence_escalation);
        let sequences = detect_sequences(&hierarchy);
        let force = aggregate_force(&hierarchy);
        debug!(
            divergences = divergences.len(),
            sequences = sequences.len(),
            buy = force.buy,
            sell = force.sell,
            "hierarchy views computed"
        );

        let priority = resolve_priority(&hierarchy, &sequences, &self.config.cascade);
        let probability = estimate_probability(
            &force,
            &sequences,
            priority.as_ref(),
            &divergences,
            &self.config.probability,
        );
        let final_signal = resolve_final_signal(
            priority.as_ref(),
            &force,
            &sequences,
            self.config.probability.final_signal_margin,
        );

        let error = if current_price > 0.0 {
            None
        } else {
            warn!("no usable price in snapshot");
            Some(CycleError::NoPrice)
        };
        let levels = plan_levels(current_price, &analyses, final_signal, &self.config.levels);

        let evidence = Evidence {
            final_signal,
            probability,
            current_price,
            analyses: &analyses,
            hierarchy: &hierarchy,
            divergences: &divergences,
            sequences: &sequences,
            force: &force,
            priority: priority.as_ref(),
            levels: &levels,
            dominant_period,
        };
        let alerts = build_alerts(&evidence);
        let rationale = build_rationale(&evidence);
        let confidence = ConfidenceLabel::from_probability(probability);

        info!(
            signal = %final_signal,
            probability,
            confidence = %confidence,
            price = current_price,
            alerts = alerts.len(),
            "decision cycle complete"
        );

        Decision {
            final_signal,
            probability,
            confidence,
            action: action_text(final_signal, probability).to_string(),
            levels,
            alerts,
            rationale,
            dominant_period,
            current_price,
            analyses,
            hierarchy,
            divergences,
            sequences,
            force,
            priority,
            timestamp,
            fingerprint,
            error,
        }
    }

    fn neutral_decision(
        &self,
        current_price: f64,
        timestamp: Option<DateTime<Utc>>,
        fingerprint: Option<SnapshotHash>,
        error: CycleError,
    ) -> Decision {
        let p = &self.config.probability;
        let probability = p.base.clamp(p.min, p.max);
        Decision {
            final_signal: Signal::Hold,
            probability,
            confidence: ConfidenceLabel::from_probability(probability),
            action: action_text(Signal::Hold, probability).to_string(),
            levels: Levels::fallback(current_price, &self.config.levels),
            alerts: Vec::new(),
            rationale: vec![format!("Cycle skipped: {error}")],
            dominant_period: None,
            current_price,
            analyses: Vec::new(),
            hierarchy: Hierarchy::default(),
            divergences: Vec::new(),
            sequences: Vec::new(),
            force: Default::default(),
            priority: None,
            timestamp,
            fingerprint,
            error: Some(error),
        }
    }
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

/// 1h price, else 4h, else the first period with a price, else 0.
pub fn current_price(snapshot: &MarketSnapshot) -> f64 {
    PRICE_PERIODS
        .iter()
        .filter_map(|p| snapshot.get(*p))
        .map(|s| s.effective_price())
        .find(|p| *p > 0.0)
        .or_else(|| {
            snapshot
                .iter()
                .map(|(_, s)| s.effective_price())
                .find(|p| *p > 0.0)
        })
        .unwrap_or(0.0)
}
