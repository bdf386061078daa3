//! Technical analysis agent

use concord_core::{
    Analyst, Diagnosis, Direction, PatternLabel, PriceSnapshot, Signal, SignalSource,
};
use serde::Serialize;
use std::sync::Arc;

use crate::config::PipelineConfig;
use crate::indicators::{self, IndicatorSet};
use crate::scoring::{self, AxisScores};
use crate::{diagnosis, patterns};

/// Everything the technical chain derived from one price snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TechnicalView {
    pub indicators: IndicatorSet,
    pub patterns: Vec<PatternLabel>,
    pub scores: AxisScores,
    pub diagnosis: Diagnosis,
}

/// Agent turning a price history into a technical signal
pub struct TechnicalAnalyst {
    config: Arc<PipelineConfig>,
}

impl TechnicalAnalyst {
    pub fn new(config: Arc<PipelineConfig>) -> Self {
        Self { config }
    }

    fn has_history(&self, snapshot: &PriceSnapshot) -> bool {
        snapshot.len() >= self.config.technical.min_history
    }

    /// Run indicators, patterns, scoring and diagnosis over the snapshot
    ///
    /// Returns `None` when the history is too short to diagnose.
    pub fn diagnose(&self, snapshot: &PriceSnapshot) -> Option<TechnicalView> {
        if !self.has_history(snapshot) {
            return None;
        }
        let config = &self.config;
        let indicators = indicators::compute(snapshot, &config.indicators);
        let patterns = patterns::detect(snapshot, &indicators, &config.indicators);
        let scores = scoring::score_all(&patterns, &indicators, &config.scoring);
        let diagnosis = diagnosis::diagnose(snapshot, &scores, &patterns, &config.diagnosis);
        Some(TechnicalView {
            indicators,
            patterns,
            scores,
            diagnosis,
        })
    }

    fn direction(&self, diagnosis: &Diagnosis) -> Direction {
        let vote = diagnosis::trend_vote(diagnosis);
        let threshold = self.config.technical.direction_threshold;
        if vote >= threshold {
            Direction::Bullish
        } else if vote <= -threshold {
            Direction::Bearish
        } else {
            Direction::Neutral
        }
    }

    fn evidence(&self, diagnosis: &Diagnosis) -> Vec<String> {
        let mut evidence = vec![format!(
            "trend short {}, medium {}, long {}",
            diagnosis.trend_short, diagnosis.trend_medium, diagnosis.trend_long
        )];
        evidence.push(match diagnosis.dominant_pattern {
            Some(pattern) => format!(
                "dominant pattern {} (quality {:.2})",
                pattern.kind, pattern.quality
            ),
            None => format!(
                "no pattern above quality {:.2}",
                self.config.diagnosis.pattern_quality_floor
            ),
        });
        evidence.push(format!(
            "close at {:.0}% of the {}-session range",
            diagnosis.range_position * 100.0,
            self.config.diagnosis.long_window
        ));
        evidence.push(format!("signal strength {:.2}", diagnosis.signal_strength));
        evidence
    }
}

impl Analyst for TechnicalAnalyst {
    type Snapshot = PriceSnapshot;

    fn source(&self) -> SignalSource {
        SignalSource::Technical
    }

    fn produce(&self, snapshot: &PriceSnapshot, diagnosis: Option<&Diagnosis>) -> Signal {
        if !self.has_history(snapshot) {
            tracing::debug!(
                symbol = snapshot.symbol(),
                sessions = snapshot.len(),
                "price history too short for a technical view"
            );
            return self.degraded();
        }

        let computed;
        let diagnosis = match diagnosis {
            Some(d) => d,
            None => match self.diagnose(snapshot) {
                Some(view) => {
                    computed = view.diagnosis;
                    &computed
                }
                None => return self.degraded(),
            },
        };

        let direction = self.direction(diagnosis);
        Signal::new(
            self.source(),
            direction,
            diagnosis.signal_strength,
            self.evidence(diagnosis),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        downtrend_snapshot, snapshot_from_closes, trending_closes, uptrend_snapshot,
    };
    use concord_core::{INSUFFICIENT_DATA, PatternKind, Trend};

    fn analyst() -> TechnicalAnalyst {
        TechnicalAnalyst::new(Arc::new(PipelineConfig::default()))
    }

    fn diagnosis(short: Trend, medium: Trend, pattern: Option<PatternKind>) -> Diagnosis {
        Diagnosis {
            trend_short: short,
            trend_medium: medium,
            trend_long: Trend::Flat,
            range_position: 0.5,
            dominant_pattern: pattern.map(|kind| PatternLabel::new(kind, 0.8)),
            signal_strength: 0.4,
        }
    }

    #[test]
    fn test_uptrend_is_bullish() {
        let signal = analyst().produce(&uptrend_snapshot(), None);
        assert_eq!(signal.source, SignalSource::Technical);
        assert_eq!(signal.direction, Direction::Bullish);
        assert!(signal.strength > 0.0);
        assert!(signal.evidence[0].contains("trend short up"));
        assert!(signal.evidence[1].contains("bullish engulfing"));
    }

    #[test]
    fn test_downtrend_is_bearish() {
        let signal = analyst().produce(&downtrend_snapshot(), None);
        assert_eq!(signal.direction, Direction::Bearish);
        assert!(signal.evidence[1].contains("bearish engulfing"));
    }

    #[test]
    fn test_short_history_degrades() {
        let snapshot = snapshot_from_closes(&trending_closes(12, 20.0, 0.01));
        let analyst = analyst();
        assert!(analyst.diagnose(&snapshot).is_none());
        let signal = analyst.produce(&snapshot, None);
        assert!(signal.is_degraded());
        assert_eq!(signal.evidence, vec![INSUFFICIENT_DATA.to_string()]);

        let signal = analyst.produce(&PriceSnapshot::empty("TEST"), None);
        assert!(signal.is_degraded());
    }

    #[test]
    fn test_supplied_diagnosis_drives_direction() {
        let analyst = analyst();
        let snapshot = uptrend_snapshot();

        let bearish = diagnosis(Trend::Down, Trend::Flat, Some(PatternKind::DoubleTop));
        let signal = analyst.produce(&snapshot, Some(&bearish));
        assert_eq!(signal.direction, Direction::Bearish);
        assert!((signal.strength - 0.4).abs() < 1e-12);

        // Trend and pattern cancel out
        let mixed = diagnosis(Trend::Up, Trend::Flat, Some(PatternKind::DoubleTop));
        assert_eq!(
            analyst.produce(&snapshot, Some(&mixed)).direction,
            Direction::Neutral
        );

        let quiet = diagnosis(Trend::Flat, Trend::Flat, None);
        let signal = analyst.produce(&snapshot, Some(&quiet));
        assert_eq!(signal.direction, Direction::Neutral);
        assert!(signal.evidence[1].starts_with("no pattern above"));
    }

    #[test]
    fn test_scores_against_the_trend_weaken_the_call() {
        let analyst = analyst();
        let snapshot = uptrend_snapshot();
        let mut view = analyst.diagnose(&snapshot).unwrap();
        for score in [
            &mut view.scores.pattern,
            &mut view.scores.volume_price,
            &mut view.scores.indicator,
        ] {
            score.value = 0.1;
        }
        let diagnosis = diagnosis::diagnose(
            &snapshot,
            &view.scores,
            &view.patterns,
            &analyst.config.diagnosis,
        );
        let signal = analyst.produce(&snapshot, Some(&diagnosis));
        assert_eq!(signal.direction, Direction::Bullish);
        assert!(signal.strength.abs() < 1e-12);
    }

    #[test]
    fn test_view_matches_produced_signal() {
        let analyst = analyst();
        let snapshot = uptrend_snapshot();
        let view = analyst.diagnose(&snapshot).unwrap();
        assert!(!view.patterns.is_empty());
        assert_eq!(
            analyst.produce(&snapshot, Some(&view.diagnosis)),
            analyst.produce(&snapshot, None)
        );
    }
}
