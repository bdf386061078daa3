//! Sentiment analysis agent
//!
//! Item weights decay exponentially with age, measured against the newest
//! item in the feed so that the result only depends on the snapshot.

use concord_core::{
    Analyst, Diagnosis, Direction, SentimentItem, SentimentSnapshot, Signal, SignalSource,
};
use std::sync::Arc;

use crate::config::{PipelineConfig, SentimentConfig};

/// Agent turning a news feed into a sentiment signal
pub struct SentimentAnalyst {
    config: Arc<PipelineConfig>,
}

impl SentimentAnalyst {
    pub fn new(config: Arc<PipelineConfig>) -> Self {
        Self { config }
    }

    fn settings(&self) -> &SentimentConfig {
        &self.config.sentiment
    }

    /// Decay weight of every item, in feed order
    fn weights(&self, items: &[SentimentItem]) -> Vec<f64> {
        let Some(newest) = items.iter().map(|i| i.timestamp).max() else {
            return Vec::new();
        };
        let half_life = self.settings().half_life_hours;
        items
            .iter()
            .map(|item| {
                let age_hours = (newest - item.timestamp).num_seconds().max(0) as f64 / 3600.0;
                0.5_f64.powf(age_hours / half_life)
            })
            .collect()
    }

    /// Up to `max_evidence` items with the largest weighted polarity
    fn representative<'a>(
        &self,
        items: &'a [SentimentItem],
        weights: &[f64],
    ) -> Vec<&'a SentimentItem> {
        let mut ranked: Vec<(f64, &SentimentItem)> = items
            .iter()
            .zip(weights)
            .map(|(item, w)| (item.polarity.abs() * w, item))
            .collect();
        ranked.sort_by(|a, b| b.0.total_cmp(&a.0));
        ranked
            .into_iter()
            .take(self.settings().max_evidence)
            .map(|(_, item)| item)
            .collect()
    }
}

impl Analyst for SentimentAnalyst {
    type Snapshot = SentimentSnapshot;

    fn source(&self) -> SignalSource {
        SignalSource::Sentiment
    }

    fn produce(&self, snapshot: &SentimentSnapshot, _diagnosis: Option<&Diagnosis>) -> Signal {
        let items = snapshot.items();
        let weights = self.weights(items);
        let total: f64 = weights.iter().sum();
        if items.is_empty() || total <= 0.0 {
            return self.degraded();
        }

        let cfg = self.settings();
        let polarity = items
            .iter()
            .zip(&weights)
            .map(|(item, w)| item.polarity * w)
            .sum::<f64>()
            / total;

        let direction = if polarity > cfg.polarity_threshold {
            Direction::Bullish
        } else if polarity < -cfg.polarity_threshold {
            Direction::Bearish
        } else {
            Direction::Neutral
        };

        let count = items.len();
        let volume_factor = (count as f64 / cfg.full_strength_items.max(1) as f64).min(1.0);
        let mut strength = polarity.abs() * volume_factor;
        if count < cfg.min_items {
            strength = strength.min(cfg.low_volume_cap);
        }

        let mut evidence = vec![format!(
            "decayed polarity {polarity:+.2} over {count} items"
        )];
        evidence.extend(
            self.representative(items, &weights)
                .into_iter()
                .map(|item| {
                    format!(
                        "\"{}\" ({}, {:+.2})",
                        item.headline, item.source, item.polarity
                    )
                }),
        );

        Signal::new(self.source(), direction, strength, evidence)
    }
}
