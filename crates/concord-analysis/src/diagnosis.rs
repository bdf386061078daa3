//! Diagnosis engine
//!
//! Condenses price history, axis scores and pattern labels into a
//! [`Diagnosis`]: trend per horizon, position in the recent range, dominant
//! pattern and overall signal strength.

use concord_core::{Diagnosis, Direction, PatternLabel, PriceBar, PriceSnapshot, Trend};

use crate::config::DiagnosisConfig;
use crate::scoring::AxisScores;

/// Least-squares slope of `values` against their index
fn slope(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    if values.len() < 2 {
        return 0.0;
    }
    let mean_x = (n - 1.0) / 2.0;
    let mean_y = values.iter().sum::<f64>() / n;
    let (num, den) = values
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(num, den), (i, &y)| {
            let dx = i as f64 - mean_x;
            (num + dx * (y - mean_y), den + dx * dx)
        });
    if den == 0.0 { 0.0 } else { num / den }
}

/// Trend over the last `window` closes
///
/// Up when the net change exceeds `min_move` and the slope is positive, down
/// under the mirrored condition, flat otherwise (including short history).
pub fn trend(closes: &[f64], window: usize, min_move: f64) -> Trend {
    if window < 2 || closes.len() < window {
        return Trend::Flat;
    }
    let recent = &closes[closes.len() - window..];
    let (first, last) = (recent[0], recent[window - 1]);
    let net = (last - first) / first;
    let slope = slope(recent);
    if !net.is_finite() || !slope.is_finite() {
        return Trend::Flat;
    }
    if net > min_move && slope > 0.0 {
        Trend::Up
    } else if net < -min_move && slope < 0.0 {
        Trend::Down
    } else {
        Trend::Flat
    }
}

/// Last close within the high/low envelope of the last `window` sessions
pub fn range_position(bars: &[PriceBar], window: usize) -> f64 {
    let recent = &bars[bars.len().saturating_sub(window)..];
    let Some(last) = recent.last() else {
        return 0.5;
    };
    let high = recent.iter().map(|b| b.high).fold(f64::MIN, f64::max);
    let low = recent.iter().map(|b| b.low).fold(f64::MAX, f64::min);
    let span = high - low;
    if span <= f64::EPSILON {
        return 0.5;
    }
    ((last.close - low) / span).clamp(0.0, 1.0)
}

/// Highest-quality label at or above the floor; the earliest wins ties
pub fn dominant_pattern(labels: &[PatternLabel], floor: f64) -> Option<PatternLabel> {
    labels
        .iter()
        .filter(|l| l.quality >= floor)
        .fold(None, |best: Option<PatternLabel>, l| match best {
            Some(b) if b.quality >= l.quality => Some(b),
            _ => Some(*l),
        })
}

/// 1 when all horizons agree, 0.5 when two do, 0 otherwise
fn agreement(trends: [Trend; 3]) -> f64 {
    let [a, b, c] = trends;
    if a == b && b == c {
        1.0
    } else if a == b || b == c || a == c {
        0.5
    } else {
        0.0
    }
}

/// Directional vote of the short and medium trends plus the dominant pattern bias
pub fn trend_vote(diagnosis: &Diagnosis) -> i32 {
    vote(
        diagnosis.trend_short,
        diagnosis.trend_medium,
        diagnosis.dominant_pattern,
    )
}

fn vote(short: Trend, medium: Trend, dominant: Option<PatternLabel>) -> i32 {
    let pattern = match dominant.map(|p| p.kind.bias()) {
        Some(Direction::Bullish) => 1,
        Some(Direction::Bearish) => -1,
        _ => 0,
    };
    short.sign() + medium.sign() + pattern
}

/// Lean of the mean covered score toward `vote`, scaled by trend agreement
///
/// Scores pointing against a non-zero vote give no strength. Without a vote
/// the distance from neutral counts either way.
pub fn signal_strength(scores: &AxisScores, trends: [Trend; 3], vote: i32) -> f64 {
    let covered: Vec<f64> = scores
        .iter()
        .filter(|s| s.is_covered())
        .map(|s| s.value)
        .collect();
    if covered.is_empty() {
        return 0.0;
    }
    let avg = covered.iter().sum::<f64>() / covered.len() as f64;
    let lean = 2.0 * avg - 1.0;
    let lean = match vote.signum() {
        0 => lean.abs(),
        sign => (f64::from(sign) * lean).max(0.0),
    };
    let strength = lean * (0.5 + 0.5 * agreement(trends));
    if strength.is_finite() {
        strength.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Build the diagnosis of one price snapshot
pub fn diagnose(
    snapshot: &PriceSnapshot,
    scores: &AxisScores,
    labels: &[PatternLabel],
    config: &DiagnosisConfig,
) -> Diagnosis {
    let closes = snapshot.closes();
    let trend_short = trend(&closes, config.short_window, config.short_min_move);
    let trend_medium = trend(&closes, config.medium_window, config.medium_min_move);
    let trend_long = trend(&closes, config.long_window, config.long_min_move);
    let trends = [trend_short, trend_medium, trend_long];
    let dominant = dominant_pattern(labels, config.pattern_quality_floor);
    let votes = vote(trend_short, trend_medium, dominant);

    let diagnosis = Diagnosis {
        trend_short,
        trend_medium,
        trend_long,
        range_position: range_position(snapshot.bars(), config.long_window),
        dominant_pattern: dominant,
        signal_strength: signal_strength(scores, trends, votes),
    };
    tracing::debug!(
        short = %trend_short,
        medium = %trend_medium,
        long = %trend_long,
        strength = diagnosis.signal_strength,
        "diagnosis"
    );
    diagnosis
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{IndicatorConfig, ScoringWeights};
    use crate::test_support::{
        downtrend_snapshot, snapshot_from_closes, trending_closes, uptrend_snapshot,
    };
    use crate::{indicators, patterns, scoring};
    use concord_core::{CompositeScore, PatternKind, ScoreAxis};

    fn scores(values: [Option<f64>; 3]) -> AxisScores {
        let make = |axis, value: Option<f64>| match value {
            Some(v) => CompositeScore {
                axis,
                value: v,
                coverage: 1.0,
                components: Vec::new(),
            },
            None => CompositeScore::empty(axis),
        };
        AxisScores {
            pattern: make(ScoreAxis::Pattern, values[0]),
            volume_price: make(ScoreAxis::VolumePrice, values[1]),
            indicator: make(ScoreAxis::Indicator, values[2]),
        }
    }

    fn full_diagnosis(snapshot: &PriceSnapshot) -> Diagnosis {
        let config = IndicatorConfig::default();
        let set = indicators::compute(snapshot, &config);
        let labels = patterns::detect(snapshot, &set, &config);
        let axis = scoring::score_all(&labels, &set, &ScoringWeights::default());
        diagnose(snapshot, &axis, &labels, &DiagnosisConfig::default())
    }

    #[test]
    fn test_trend_rules() {
        let up: Vec<f64> = (0..10_i32).map(|i| 100.0 + f64::from(i)).collect();
        assert_eq!(trend(&up, 5, 0.015), Trend::Up);
        let down: Vec<f64> = up.iter().rev().copied().collect();
        assert_eq!(trend(&down, 5, 0.015), Trend::Down);
        // Net move below the threshold
        assert_eq!(trend(&up, 5, 0.10), Trend::Flat);
        // Not enough history for the window
        assert_eq!(trend(&up, 20, 0.01), Trend::Flat);
        // Net up but slope down: spike at the start, recovery at the end
        let mixed = [100.0, 130.0, 95.0, 94.0, 102.0];
        assert_eq!(trend(&mixed, 5, 0.015), Trend::Flat);
    }

    #[test]
    fn test_range_position_bounds() {
        let snapshot = snapshot_from_closes(&trending_closes(80, 40.0, 0.01));
        let top = range_position(snapshot.bars(), 60);
        assert!(top > 0.8 && top <= 1.0);

        let snapshot = snapshot_from_closes(&trending_closes(80, 40.0, -0.01));
        let bottom = range_position(snapshot.bars(), 60);
        assert!((0.0..0.2).contains(&bottom));

        assert!((range_position(&[], 60) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_dominant_pattern_floor_and_ties() {
        let labels = [
            PatternLabel::new(PatternKind::GoldenCross, 0.45),
            PatternLabel::new(PatternKind::DoubleBottom, 0.8),
            PatternLabel::new(PatternKind::DoubleTop, 0.8),
        ];
        let dominant = dominant_pattern(&labels, 0.5).unwrap();
        assert_eq!(dominant.kind, PatternKind::DoubleBottom);
        assert!(dominant_pattern(&labels[..1], 0.5).is_none());
    }

    #[test]
    fn test_signal_strength_agreement_scaling() {
        let axis = scores([Some(0.9), Some(0.9), None]);
        let full = signal_strength(&axis, [Trend::Up; 3], 2);
        assert!((full - 0.8).abs() < 1e-9);
        let split = signal_strength(&axis, [Trend::Up, Trend::Down, Trend::Flat], 0);
        assert!((split - 0.4).abs() < 1e-9);
        let two = signal_strength(&axis, [Trend::Up, Trend::Up, Trend::Flat], 2);
        assert!((two - 0.6).abs() < 1e-9);

        let none = scores([None, None, None]);
        assert!(signal_strength(&none, [Trend::Up; 3], 2).abs() < 1e-12);
    }

    #[test]
    fn test_scores_against_the_vote_give_no_strength() {
        let bearish = scores([Some(0.1), Some(0.1), Some(0.1)]);
        assert!(signal_strength(&bearish, [Trend::Up; 3], 2).abs() < 1e-12);
        assert!((signal_strength(&bearish, [Trend::Down; 3], -2) - 0.8).abs() < 1e-9);
        // No vote: distance from neutral either way
        assert!((signal_strength(&bearish, [Trend::Flat; 3], 0) - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_trend_vote_counts_pattern_bias() {
        let mut diagnosis = Diagnosis {
            trend_short: Trend::Up,
            trend_medium: Trend::Up,
            trend_long: Trend::Down,
            range_position: 0.5,
            dominant_pattern: None,
            signal_strength: 0.0,
        };
        assert_eq!(trend_vote(&diagnosis), 2);
        diagnosis.dominant_pattern = Some(PatternLabel::new(PatternKind::DoubleTop, 0.8));
        assert_eq!(trend_vote(&diagnosis), 1);
        diagnosis.trend_short = Trend::Down;
        assert_eq!(trend_vote(&diagnosis), -1);
    }

    #[test]
    fn test_diagnosis_invariants_hold_for_varied_histories() {
        for drift in [-0.02, -0.004, 0.0, 0.004, 0.02] {
            for len in [0, 3, 25, 70, 120] {
                let snapshot = snapshot_from_closes(&trending_closes(len, 30.0, drift));
                let diagnosis = full_diagnosis(&snapshot);
                assert!((0.0..=1.0).contains(&diagnosis.range_position));
                assert!((0.0..=1.0).contains(&diagnosis.signal_strength));
            }
        }
    }

    #[test]
    fn test_uptrend_fixture_diagnosis() {
        let diagnosis = full_diagnosis(&uptrend_snapshot());
        assert_eq!(diagnosis.trends(), [Trend::Up; 3]);
        assert_eq!(
            diagnosis.dominant_pattern.map(|p| p.kind),
            Some(PatternKind::BullishEngulfing)
        );
        assert!(diagnosis.range_position > 0.9);
        assert!(diagnosis.signal_strength > 0.2);
    }

    #[test]
    fn test_downtrend_fixture_diagnosis() {
        let diagnosis = full_diagnosis(&downtrend_snapshot());
        assert_eq!(diagnosis.trends(), [Trend::Down; 3]);
        assert_eq!(
            diagnosis.dominant_pattern.map(|p| p.kind),
            Some(PatternKind::BearishEngulfing)
        );
        assert!(diagnosis.range_position < 0.1);
    }
}
