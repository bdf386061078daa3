//! Pattern labels, scores and the technical diagnosis

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::signal::Direction;

/// Trend direction over one horizon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl Trend {
    /// +1 for up, -1 for down, 0 for flat
    pub fn sign(self) -> i32 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
            Self::Flat => 0,
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Flat => "flat",
        };
        f.write_str(name)
    }
}

/// Group a pattern belongs to, used for pattern-axis weighting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternFamily {
    Candlestick,
    MovingAverage,
    Structure,
}

/// Recognised price-action pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    BaseBuilding,
    UptrendContinuation,
    DowntrendContinuation,
    GoldenCross,
    DeathCross,
    BullishEngulfing,
    BearishEngulfing,
    HeadAndShouldersTop,
    HeadAndShouldersBottom,
    DoubleTop,
    DoubleBottom,
    AscendingTriangle,
    DescendingTriangle,
    SymmetricTriangle,
    BullFlag,
    BearFlag,
    RisingWedge,
    FallingWedge,
}

impl PatternKind {
    /// Direction the pattern argues for
    pub fn bias(self) -> Direction {
        match self {
            Self::UptrendContinuation
            | Self::GoldenCross
            | Self::BullishEngulfing
            | Self::HeadAndShouldersBottom
            | Self::DoubleBottom
            | Self::AscendingTriangle
            | Self::BullFlag
            | Self::FallingWedge => Direction::Bullish,
            Self::DowntrendContinuation
            | Self::DeathCross
            | Self::BearishEngulfing
            | Self::HeadAndShouldersTop
            | Self::DoubleTop
            | Self::DescendingTriangle
            | Self::BearFlag
            | Self::RisingWedge => Direction::Bearish,
            Self::BaseBuilding | Self::SymmetricTriangle => Direction::Neutral,
        }
    }

    pub fn family(self) -> PatternFamily {
        match self {
            Self::BullishEngulfing | Self::BearishEngulfing => PatternFamily::Candlestick,
            Self::UptrendContinuation
            | Self::DowntrendContinuation
            | Self::GoldenCross
            | Self::DeathCross => PatternFamily::MovingAverage,
            _ => PatternFamily::Structure,
        }
    }

    /// Human-readable name used in evidence text
    pub fn label(self) -> &'static str {
        match self {
            Self::BaseBuilding => "base-building",
            Self::UptrendContinuation => "uptrend-continuation",
            Self::DowntrendContinuation => "downtrend-continuation",
            Self::GoldenCross => "golden-cross",
            Self::DeathCross => "death-cross",
            Self::BullishEngulfing => "bullish engulfing",
            Self::BearishEngulfing => "bearish engulfing",
            Self::HeadAndShouldersTop => "head-and-shoulders top",
            Self::HeadAndShouldersBottom => "head-and-shoulders bottom",
            Self::DoubleTop => "double top",
            Self::DoubleBottom => "double bottom",
            Self::AscendingTriangle => "ascending triangle",
            Self::DescendingTriangle => "descending triangle",
            Self::SymmetricTriangle => "symmetric triangle",
            Self::BullFlag => "bull flag",
            Self::BearFlag => "bear flag",
            Self::RisingWedge => "rising wedge",
            Self::FallingWedge => "falling wedge",
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A recognised pattern with its independently computed quality
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatternLabel {
    pub kind: PatternKind,
    /// Quality in [0, 1]
    pub quality: f64,
}

impl PatternLabel {
    /// Build a label, clamping quality into [0, 1] (non-finite becomes 0)
    pub fn new(kind: PatternKind, quality: f64) -> Self {
        let quality = if quality.is_finite() {
            quality.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self { kind, quality }
    }
}

/// Scoring axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreAxis {
    Pattern,
    VolumePrice,
    Indicator,
}

impl ScoreAxis {
    pub const ALL: [Self; 3] = [Self::Pattern, Self::VolumePrice, Self::Indicator];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pattern => "pattern",
            Self::VolumePrice => "volume-price",
            Self::Indicator => "indicator",
        }
    }
}

/// Named contributor to a composite score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub name: String,
    /// Normalised value in [0, 1]
    pub value: f64,
    /// Weight after renormalisation over present contributors
    pub weight: f64,
}

/// Weighted combination of scores along one axis
///
/// `value` is bullishness in [0, 1] with 0.5 as neutral. `coverage` is the
/// share of the configured weight vector whose contributors were present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeScore {
    pub axis: ScoreAxis,
    pub value: f64,
    pub coverage: f64,
    pub components: Vec<Score>,
}

impl CompositeScore {
    /// Axis with no contributor
    pub fn empty(axis: ScoreAxis) -> Self {
        Self {
            axis,
            value: 0.5,
            coverage: 0.0,
            components: Vec::new(),
        }
    }

    pub fn is_covered(&self) -> bool {
        self.coverage > 0.0
    }
}

/// Qualitative technical judgment over one price snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub trend_short: Trend,
    pub trend_medium: Trend,
    pub trend_long: Trend,
    /// Position of the last close in the long-horizon high/low envelope, in [0, 1]
    pub range_position: f64,
    pub dominant_pattern: Option<PatternLabel>,
    /// In [0, 1]
    pub signal_strength: f64,
}

impl Diagnosis {
    pub fn trends(&self) -> [Trend; 3] {
        [self.trend_short, self.trend_medium, self.trend_long]
    }
}
