//! Signals, stances and decisions
//!
//! A [`Signal`] is one analyst's view, a [`Stance`] is the reconciled view over
//! all signals and a [`Decision`] is the terminal artifact of one invocation.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Evidence emitted by an analyst that could not evaluate its snapshot
pub const INSUFFICIENT_DATA: &str = "insufficient data";

/// Case text used when no signal supports a side
pub const NO_SUPPORTING_EVIDENCE: &str = "no supporting evidence";

/// Directional view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Bullish,
    Bearish,
    Neutral,
}

impl Direction {
    /// +1 for bullish, -1 for bearish, 0 for neutral
    pub fn sign(self) -> f64 {
        match self {
            Self::Bullish => 1.0,
            Self::Bearish => -1.0,
            Self::Neutral => 0.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bullish => "bullish",
            Self::Bearish => "bearish",
            Self::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Analyst that produced a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalSource {
    Technical,
    Fundamental,
    Sentiment,
}

impl SignalSource {
    /// All sources in reporting order
    pub const ALL: [Self; 3] = [Self::Technical, Self::Fundamental, Self::Sentiment];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Technical => "technical",
            Self::Fundamental => "fundamental",
            Self::Sentiment => "sentiment",
        }
    }
}

impl fmt::Display for SignalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One analyst's directional call with supporting evidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub source: SignalSource,
    pub direction: Direction,
    /// Conviction in [0, 1]
    pub strength: f64,
    /// Short textual claims, most relevant first
    pub evidence: Vec<String>,
}

impl Signal {
    /// Build a signal, clamping strength into [0, 1]
    ///
    /// A non-finite strength is treated as zero.
    pub fn new(
        source: SignalSource,
        direction: Direction,
        strength: f64,
        evidence: Vec<String>,
    ) -> Self {
        let strength = if strength.is_finite() {
            strength.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            source,
            direction,
            strength,
            evidence,
        }
    }

    /// Degraded neutral signal for a source whose data was missing or unusable
    pub fn insufficient_data(source: SignalSource) -> Self {
        Self::new(
            source,
            Direction::Neutral,
            0.0,
            vec![INSUFFICIENT_DATA.to_string()],
        )
    }

    /// Signed contribution before source weighting
    pub fn vote(&self) -> f64 {
        self.direction.sign() * self.strength
    }

    pub fn is_degraded(&self) -> bool {
        self.direction == Direction::Neutral
            && self.strength <= 0.0
            && self.evidence.iter().any(|e| e == INSUFFICIENT_DATA)
    }
}

/// Reconciled view over the full signal set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stance {
    pub direction: Direction,
    /// |net_score| over the total source weight, in [0, 1]
    pub confidence: f64,
    /// Weighted vote, in [-W, W] where W is the total source weight
    pub net_score: f64,
    pub bull_case: String,
    pub bear_case: String,
    pub neutral_case: String,
}

/// Recommended action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
            Self::Hold => "hold",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal artifact of one invocation
///
/// Price fields are present only when `action` is [`Action::Buy`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub action: Action,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buy_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_loss_price: Option<f64>,
    pub confidence: f64,
    pub rationale: Vec<String>,
}

/// Positive, finite price
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Price(f64);

impl Price {
    pub fn new(value: f64) -> Result<Self> {
        if value.is_finite() && value > 0.0 {
            Ok(Self(value))
        } else {
            Err(Error::InvalidPrice(value))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        Self::new(value).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}
