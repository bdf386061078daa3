//! Decision synthesizer
//!
//! The only place where risk parameters are applied: a reconciled stance
//! and the current price become an action with entry, target and stop.

use concord_core::{Action, Decision, Direction, Price, Stance};

use crate::config::DecisionConfig;

pub const PRICE_UNAVAILABLE: &str = "current price unavailable";

/// Maps a [`Stance`] to a [`Decision`]
#[derive(Debug, Clone)]
pub struct DecisionSynthesizer {
    config: DecisionConfig,
}

impl DecisionSynthesizer {
    pub fn new(config: DecisionConfig) -> Self {
        Self { config }
    }

    fn summary(&self, stance: &Stance) -> String {
        match stance.direction {
            Direction::Neutral => format!(
                "no side dominated (net score {:+.2}, confidence {:.2})",
                stance.net_score, stance.confidence
            ),
            direction if stance.confidence < self.config.min_confidence => format!(
                "{direction} side led by net score {:+.2} but confidence {:.2} is below {:.2}",
                stance.net_score, stance.confidence, self.config.min_confidence
            ),
            direction => format!(
                "{direction} side dominated by net score {:+.2} (confidence {:.2})",
                stance.net_score, stance.confidence
            ),
        }
    }

    fn hold(&self, stance: &Stance, mut rationale: Vec<String>) -> Decision {
        rationale.push(format!("bull case: {}", stance.bull_case));
        rationale.push(format!("bear case: {}", stance.bear_case));
        rationale.push(format!("neutral case: {}", stance.neutral_case));
        Decision {
            action: Action::Hold,
            buy_price: None,
            target_price: None,
            stop_loss_price: None,
            confidence: stance.confidence,
            rationale,
        }
    }

    pub fn decide(&self, stance: &Stance, current_price: Option<Price>) -> Decision {
        let mut rationale = vec![self.summary(stance)];
        let actionable = stance.confidence >= self.config.min_confidence;

        match (stance.direction, actionable) {
            (Direction::Bullish, true) => {
                let Some(price) = current_price else {
                    rationale.push(PRICE_UNAVAILABLE.to_string());
                    return self.hold(stance, rationale);
                };
                let entry = price.value();
                let target = entry * (1.0 + self.config.take_profit);
                let stop = entry * (1.0 - self.config.stop_loss);
                rationale.push(format!("bull case: {}", stance.bull_case));
                rationale.push(format!("bear case: {}", stance.bear_case));
                rationale.push(format!(
                    "entry {entry:.2}, target {target:.2} (+{:.1}%), stop {stop:.2} (-{:.1}%)",
                    self.config.take_profit * 100.0,
                    self.config.stop_loss * 100.0
                ));
                Decision {
                    action: Action::Buy,
                    buy_price: Some(entry),
                    target_price: Some(target),
                    stop_loss_price: Some(stop),
                    confidence: stance.confidence,
                    rationale,
                }
            }
            (Direction::Bearish, true) => {
                rationale.push(format!("bear case: {}", stance.bear_case));
                Decision {
                    action: Action::Sell,
                    buy_price: None,
                    target_price: None,
                    stop_loss_price: None,
                    confidence: stance.confidence,
                    rationale,
                }
            }
            _ => self.hold(stance, rationale),
        }
    }
}
