//! Debate reconciler
//!
//! Weighs the three analyst signals against each other in a single
//! deterministic pass and summarises the arguments on each side.

use concord_core::{Direction, NO_SUPPORTING_EVIDENCE, Signal, SignalSource, Stance};
use serde::{Deserialize, Serialize};

use crate::config::DebateConfig;

/// Exactly one signal per analyst
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSet {
    pub technical: Signal,
    pub fundamental: Signal,
    pub sentiment: Signal,
}

impl SignalSet {
    pub fn new(technical: Signal, fundamental: Signal, sentiment: Signal) -> Self {
        Self {
            technical,
            fundamental,
            sentiment,
        }
    }

    /// All three sources without data
    pub fn degraded() -> Self {
        Self::new(
            Signal::insufficient_data(SignalSource::Technical),
            Signal::insufficient_data(SignalSource::Fundamental),
            Signal::insufficient_data(SignalSource::Sentiment),
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = &Signal> {
        [&self.technical, &self.fundamental, &self.sentiment].into_iter()
    }
}

/// Turns a [`SignalSet`] into a [`Stance`]
#[derive(Debug, Clone)]
pub struct DebateReconciler {
    config: DebateConfig,
}

impl DebateReconciler {
    pub fn new(config: DebateConfig) -> Self {
        Self { config }
    }

    /// Configured weight of the slot a signal sits in
    fn weighted(&self, signals: &SignalSet) -> [(f64, Signal); 3] {
        let w = &self.config.weights;
        [
            (w.technical, signals.technical.clone()),
            (w.fundamental, signals.fundamental.clone()),
            (w.sentiment, signals.sentiment.clone()),
        ]
    }

    /// Evidence of all signals in one direction, strongest first
    fn case(weighted: &[(f64, Signal)], direction: Direction) -> String {
        let mut side: Vec<&Signal> = weighted
            .iter()
            .map(|(_, s)| s)
            .filter(|s| s.direction == direction)
            .collect();
        side.sort_by(|a, b| b.strength.total_cmp(&a.strength));
        let claims: Vec<String> = side
            .iter()
            .flat_map(|s| s.evidence.iter().map(move |e| format!("[{}] {e}", s.source)))
            .collect();
        if claims.is_empty() {
            NO_SUPPORTING_EVIDENCE.to_string()
        } else {
            claims.join("; ")
        }
    }

    pub fn reconcile(&self, signals: &SignalSet) -> Stance {
        let weighted = self.weighted(signals);
        let net_score: f64 = weighted.iter().map(|(w, s)| w * s.vote()).sum();
        let total = self.config.weights.total();
        let tau = self.config.neutral_zone;

        // Landing exactly on the boundary stays neutral
        let direction = if net_score > tau {
            Direction::Bullish
        } else if net_score < -tau {
            Direction::Bearish
        } else {
            Direction::Neutral
        };
        let confidence = if total > 0.0 {
            (net_score.abs() / total).clamp(0.0, 1.0)
        } else {
            0.0
        };

        tracing::debug!(net_score, confidence, %direction, "signals reconciled");

        Stance {
            direction,
            confidence,
            net_score,
            bull_case: Self::case(&weighted, Direction::Bullish),
            bear_case: Self::case(&weighted, Direction::Bearish),
            neutral_case: Self::case(&weighted, Direction::Neutral),
        }
    }
}
