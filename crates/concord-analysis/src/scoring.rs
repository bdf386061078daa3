//! Scoring engine
//!
//! Turns indicator values and pattern labels into one [`CompositeScore`] per
//! axis. Every contributor is first mapped to a bullishness in [0, 1]. Missing
//! contributors drop out and the remaining weights are renormalised, so an
//! absent indicator never counts as a zero.

use concord_core::{CompositeScore, PatternFamily, PatternLabel, Score, ScoreAxis};
use serde::{Deserialize, Serialize};

use crate::config::{IndicatorWeights, PatternWeights, ScoringWeights, VolumePriceWeights};
use crate::indicators::IndicatorSet;

/// The three axis scores of one snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisScores {
    pub pattern: CompositeScore,
    pub volume_price: CompositeScore,
    pub indicator: CompositeScore,
}

impl AxisScores {
    pub fn iter(&self) -> impl Iterator<Item = &CompositeScore> {
        [&self.pattern, &self.volume_price, &self.indicator].into_iter()
    }
}

/// Weighted mean over the present contributors
fn combine(axis: ScoreAxis, contributors: &[(&str, Option<f64>, f64)]) -> CompositeScore {
    let configured: f64 = contributors.iter().map(|(_, _, w)| *w).sum();
    let present: Vec<(&str, f64, f64)> = contributors
        .iter()
        .filter_map(|&(name, value, weight)| {
            value
                .filter(|v| v.is_finite())
                .map(|v| (name, v.clamp(0.0, 1.0), weight))
        })
        .collect();
    let present_weight: f64 = present.iter().map(|(_, _, w)| *w).sum();
    if present_weight <= 0.0 || configured <= 0.0 {
        return CompositeScore::empty(axis);
    }

    let components: Vec<Score> = present
        .iter()
        .map(|&(name, value, weight)| Score {
            name: name.to_string(),
            value,
            weight: weight / present_weight,
        })
        .collect();
    let value = components.iter().map(|s| s.value * s.weight).sum::<f64>();

    CompositeScore {
        axis,
        value: value.clamp(0.0, 1.0),
        coverage: (present_weight / configured).clamp(0.0, 1.0),
        components,
    }
}

/// Mean bullishness of the labels in one family
fn family_score(labels: &[PatternLabel], family: PatternFamily) -> Option<f64> {
    let scores: Vec<f64> = labels
        .iter()
        .filter(|l| l.kind.family() == family)
        .map(|l| 0.5 + l.kind.bias().sign() * l.quality / 2.0)
        .collect();
    (!scores.is_empty()).then(|| scores.iter().sum::<f64>() / scores.len() as f64)
}

pub fn score_patterns(labels: &[PatternLabel], weights: &PatternWeights) -> CompositeScore {
    combine(
        ScoreAxis::Pattern,
        &[
            (
                "candlestick",
                family_score(labels, PatternFamily::Candlestick),
                weights.candlestick,
            ),
            (
                "moving-average",
                family_score(labels, PatternFamily::MovingAverage),
                weights.moving_average,
            ),
            (
                "structure",
                family_score(labels, PatternFamily::Structure),
                weights.structure,
            ),
        ],
    )
}

pub fn score_volume_price(
    indicators: &IndicatorSet,
    weights: &VolumePriceWeights,
) -> CompositeScore {
    combine(
        ScoreAxis::VolumePrice,
        &[
            (
                "relation",
                indicators.volume_price.map(|r| r.score()),
                weights.relation,
            ),
            (
                "money-flow",
                indicators.money_flow.map(|m| m / 100.0),
                weights.money_flow,
            ),
        ],
    )
}

/// Overbought readings count against the bullish case, oversold ones for it
fn contrarian(oscillator: Option<f64>) -> Option<f64> {
    oscillator.map(|v| 1.0 - v / 100.0)
}

pub fn score_indicators(indicators: &IndicatorSet, weights: &IndicatorWeights) -> CompositeScore {
    combine(
        ScoreAxis::Indicator,
        &[
            ("rsi", contrarian(indicators.rsi), weights.rsi),
            ("macd", indicators.macd.map(|m| m / 100.0), weights.macd),
            ("percent-b", contrarian(indicators.percent_b), weights.percent_b),
            (
                "stochastic",
                contrarian(indicators.stochastic_k),
                weights.stochastic,
            ),
        ],
    )
}

/// Score all three axes
pub fn score_all(
    labels: &[PatternLabel],
    indicators: &IndicatorSet,
    weights: &ScoringWeights,
) -> AxisScores {
    let scores = AxisScores {
        pattern: score_patterns(labels, &weights.pattern),
        volume_price: score_volume_price(indicators, &weights.volume_price),
        indicator: score_indicators(indicators, &weights.indicator),
    };
    tracing::debug!(
        pattern = scores.pattern.value,
        volume_price = scores.volume_price.value,
        indicator = scores.indicator.value,
        "axis scores"
    );
    scores
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::VolumePriceRelation;
    use concord_core::PatternKind;

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-9, "{actual} != {expected}");
    }

    #[test]
    fn test_missing_contributors_renormalise() {
        let indicators = IndicatorSet {
            rsi: Some(20.0),
            macd: Some(70.0),
            ..Default::default()
        };
        let score = score_indicators(&indicators, &IndicatorWeights::default());
        // rsi 0.8 and macd 0.7 at equal weight, half of the vector present
        assert_close(score.value, 0.75);
        assert_close(score.coverage, 0.6);
        assert_eq!(score.components.len(), 2);
        assert_close(score.components.iter().map(|c| c.weight).sum(), 1.0);
    }

    #[test]
    fn test_no_contributors_is_uncovered_neutral() {
        let score = score_indicators(&IndicatorSet::default(), &IndicatorWeights::default());
        assert_eq!(score, CompositeScore::empty(ScoreAxis::Indicator));

        let score = score_patterns(&[], &PatternWeights::default());
        assert!(!score.is_covered());
    }

    #[test]
    fn test_scores_stay_in_unit_interval() {
        let extremes = [None, Some(0.0), Some(100.0), Some(250.0), Some(-40.0), Some(f64::NAN)];
        for rsi in extremes {
            for macd in extremes {
                for money_flow in extremes {
                    let indicators = IndicatorSet {
                        rsi,
                        macd,
                        percent_b: macd,
                        stochastic_k: rsi,
                        money_flow,
                        volume_price: Some(VolumePriceRelation::HeavyVolumeDecline),
                        ..Default::default()
                    };
                    let scores = score_all(&[], &indicators, &ScoringWeights::default());
                    for score in scores.iter() {
                        assert!(score.value.is_finite());
                        assert!((0.0..=1.0).contains(&score.value));
                        assert!((0.0..=1.0).contains(&score.coverage));
                    }
                }
            }
        }
    }

    #[test]
    fn test_pattern_axis_family_weights() {
        let labels = [
            PatternLabel::new(PatternKind::BullishEngulfing, 0.8),
            PatternLabel::new(PatternKind::UptrendContinuation, 0.6),
        ];
        let score = score_patterns(&labels, &PatternWeights::default());
        // candlestick 0.9 at 0.2, moving-average 0.8 at 0.4
        assert_close(score.value, (0.2 * 0.9 + 0.4 * 0.8) / 0.6);
        assert_close(score.coverage, 0.6);
    }

    #[test]
    fn test_bearish_patterns_score_below_neutral() {
        let labels = [PatternLabel::new(PatternKind::HeadAndShouldersTop, 0.85)];
        let score = score_patterns(&labels, &PatternWeights::default());
        assert_close(score.value, 0.5 - 0.85 / 2.0);
    }

    #[test]
    fn test_volume_price_axis() {
        let indicators = IndicatorSet {
            volume_price: Some(VolumePriceRelation::HeavyVolumeRally),
            money_flow: Some(80.0),
            ..Default::default()
        };
        let score = score_volume_price(&indicators, &VolumePriceWeights::default());
        assert_close(score.value, 0.6 * 0.9 + 0.4 * 0.8);
        assert_close(score.coverage, 1.0);
    }
}
