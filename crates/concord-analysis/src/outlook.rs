//! Risk and opportunity outlook
//!
//! Grades the downside and upside of a position from the diagnosis, the
//! fundamental deviations and the sentiment signal. Trend, range position and
//! valuation count two points each; financial health and news sentiment one.

use concord_core::{Action, Diagnosis, Direction, Signal, Trend};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::agents::FundamentalView;
use crate::config::OutlookConfig;

const MAJOR: u32 = 2;
const MINOR: u32 = 1;

/// Grade of the downside factors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl RiskLevel {
    fn from_score(score: u32) -> Self {
        match score {
            0 => Self::VeryLow,
            1..=2 => Self::Low,
            3 => Self::Medium,
            4 => Self::High,
            _ => Self::VeryHigh,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::VeryLow => "very low",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::VeryHigh => "very high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Grade of the upside factors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpportunityLevel {
    VeryPoor,
    Poor,
    Moderate,
    Good,
    Excellent,
}

impl OpportunityLevel {
    fn from_score(score: u32) -> Self {
        match score {
            0 => Self::VeryPoor,
            1..=2 => Self::Poor,
            3 => Self::Moderate,
            4 => Self::Good,
            _ => Self::Excellent,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::VeryPoor => "very poor",
            Self::Poor => "poor",
            Self::Moderate => "moderate",
            Self::Good => "good",
            Self::Excellent => "excellent",
        }
    }
}

impl fmt::Display for OpportunityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Graded level with the factors that raised it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment<L> {
    pub level: L,
    pub score: u32,
    /// Empty when nothing notable was found
    pub factors: Vec<String>,
}

/// Risk and opportunity of one invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outlook {
    pub risk: Assessment<RiskLevel>,
    pub opportunity: Assessment<OpportunityLevel>,
}

/// Accumulates points and the factor behind each
#[derive(Default)]
struct Tally {
    score: u32,
    factors: Vec<String>,
}

impl Tally {
    fn add(&mut self, points: u32, factor: String) {
        self.score += points;
        self.factors.push(factor);
    }
}

/// Grade risk and opportunity from whatever inputs are available
///
/// A missing diagnosis or fundamental view contributes no factor.
pub fn assess(
    diagnosis: Option<&Diagnosis>,
    fundamentals: Option<&FundamentalView>,
    sentiment: &Signal,
    valuation_margin: f64,
    config: &OutlookConfig,
) -> Outlook {
    let mut risk = Tally::default();
    let mut opportunity = Tally::default();

    if let Some(diagnosis) = diagnosis {
        match diagnosis.trend_medium {
            Trend::Down => risk.add(MAJOR, "medium-term trend down".to_string()),
            Trend::Up => opportunity.add(MAJOR, "medium-term trend up".to_string()),
            Trend::Flat => {}
        }
        let position = diagnosis.range_position;
        if position >= config.high_range {
            risk.add(
                MAJOR,
                format!("close near the top of the range ({:.0}%)", position * 100.0),
            );
        } else if position <= config.low_range {
            opportunity.add(
                MAJOR,
                format!("close near the bottom of the range ({:.0}%)", position * 100.0),
            );
        }
    }

    if let Some(view) = fundamentals {
        if let Some(valuation) = view.valuation {
            if valuation < -valuation_margin {
                risk.add(MAJOR, format!("valuation above baseline ({valuation:+.2})"));
            } else if valuation > valuation_margin {
                opportunity.add(MAJOR, format!("valuation below baseline ({valuation:+.2})"));
            }
        }
        if let Some(quality) = view.quality {
            if quality >= config.strong_quality {
                opportunity.add(
                    MINOR,
                    format!("strong financial health (quality {quality:+.2})"),
                );
            } else if quality < config.weak_quality {
                risk.add(MINOR, format!("weak financial health (quality {quality:+.2})"));
            }
        }
    }

    match sentiment.direction {
        Direction::Bearish => risk.add(MINOR, "negative news sentiment".to_string()),
        Direction::Bullish => opportunity.add(MINOR, "positive news sentiment".to_string()),
        Direction::Neutral => {}
    }

    let outlook = Outlook {
        risk: Assessment {
            level: RiskLevel::from_score(risk.score),
            score: risk.score,
            factors: risk.factors,
        },
        opportunity: Assessment {
            level: OpportunityLevel::from_score(opportunity.score),
            score: opportunity.score,
            factors: opportunity.factors,
        },
    };
    tracing::debug!(
        risk = %outlook.risk.level,
        opportunity = %outlook.opportunity.level,
        "outlook"
    );
    outlook
}

fn line<L: fmt::Display>(kind: &str, assessment: &Assessment<L>) -> String {
    if assessment.factors.is_empty() {
        format!("{kind} {}: no notable {kind} factors", assessment.level)
    } else {
        format!(
            "{kind} {}: {}",
            assessment.level,
            assessment.factors.join("; ")
        )
    }
}

impl Outlook {
    /// Rationale lines for a decision; a sell states the downside only
    pub fn rationale(&self, action: Action) -> Vec<String> {
        let mut lines = vec![line("risk", &self.risk)];
        if action != Action::Sell {
            lines.push(line("opportunity", &self.opportunity));
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concord_core::SignalSource;

    fn diagnosis(trend_medium: Trend, range_position: f64) -> Diagnosis {
        Diagnosis {
            trend_short: trend_medium,
            trend_medium,
            trend_long: Trend::Flat,
            range_position,
            dominant_pattern: None,
            signal_strength: 0.5,
        }
    }

    fn sentiment(direction: Direction) -> Signal {
        Signal::new(SignalSource::Sentiment, direction, 0.5, vec![])
    }

    fn view(valuation: f64, quality: f64) -> FundamentalView {
        FundamentalView {
            valuation: Some(valuation),
            growth: Some(0.0),
            quality: Some(quality),
        }
    }

    #[test]
    fn test_every_risk_factor_gives_very_high_risk() {
        let outlook = assess(
            Some(&diagnosis(Trend::Down, 0.9)),
            Some(&view(-0.6, -0.4)),
            &sentiment(Direction::Bearish),
            0.05,
            &OutlookConfig::default(),
        );
        assert_eq!(outlook.risk.score, 8);
        assert_eq!(outlook.risk.level, RiskLevel::VeryHigh);
        assert_eq!(outlook.risk.factors.len(), 5);
        assert_eq!(outlook.risk.factors[0], "medium-term trend down");
        assert_eq!(outlook.opportunity.level, OpportunityLevel::VeryPoor);
        assert!(outlook.opportunity.factors.is_empty());
    }

    #[test]
    fn test_every_opportunity_factor_gives_excellent() {
        let outlook = assess(
            Some(&diagnosis(Trend::Up, 0.1)),
            Some(&view(0.7, 0.9)),
            &sentiment(Direction::Bullish),
            0.05,
            &OutlookConfig::default(),
        );
        assert_eq!(outlook.opportunity.score, 8);
        assert_eq!(outlook.opportunity.level, OpportunityLevel::Excellent);
        assert!(
            outlook
                .opportunity
                .factors
                .contains(&"close near the bottom of the range (10%)".to_string())
        );
        assert_eq!(outlook.risk.level, RiskLevel::VeryLow);
    }

    #[test]
    fn test_level_thresholds() {
        let levels: Vec<_> = (0..=6).map(RiskLevel::from_score).collect();
        assert_eq!(
            levels,
            vec![
                RiskLevel::VeryLow,
                RiskLevel::Low,
                RiskLevel::Low,
                RiskLevel::Medium,
                RiskLevel::High,
                RiskLevel::VeryHigh,
                RiskLevel::VeryHigh,
            ]
        );
        assert_eq!(OpportunityLevel::from_score(3), OpportunityLevel::Moderate);
        assert_eq!(OpportunityLevel::from_score(4), OpportunityLevel::Good);
    }

    #[test]
    fn test_missing_inputs_contribute_nothing() {
        let outlook = assess(
            None,
            None,
            &Signal::insufficient_data(SignalSource::Sentiment),
            0.05,
            &OutlookConfig::default(),
        );
        assert_eq!(outlook.risk.score, 0);
        assert_eq!(outlook.opportunity.score, 0);
        assert_eq!(
            outlook.rationale(Action::Hold),
            vec![
                "risk very low: no notable risk factors".to_string(),
                "opportunity very poor: no notable opportunity factors".to_string(),
            ]
        );
    }

    #[test]
    fn test_mid_range_and_fair_value_are_not_factors() {
        let outlook = assess(
            Some(&diagnosis(Trend::Flat, 0.5)),
            Some(&view(0.03, 0.2)),
            &sentiment(Direction::Neutral),
            0.05,
            &OutlookConfig::default(),
        );
        assert!(outlook.risk.factors.is_empty());
        assert!(outlook.opportunity.factors.is_empty());
    }

    #[test]
    fn test_sell_rationale_states_risk_only() {
        let outlook = assess(
            Some(&diagnosis(Trend::Down, 0.5)),
            None,
            &sentiment(Direction::Bullish),
            0.05,
            &OutlookConfig::default(),
        );
        let lines = outlook.rationale(Action::Sell);
        assert_eq!(lines, vec!["risk low: medium-term trend down".to_string()]);
        let lines = outlook.rationale(Action::Buy);
        assert_eq!(lines[1], "opportunity poor: positive news sentiment");
    }
}
