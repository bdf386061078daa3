//! Point-in-time input snapshots
//!
//! Snapshots are handed over by the data-acquisition layer and are read-only
//! from then on. `validate` checks the structural invariants of each snapshot;
//! a snapshot that fails it is rejected and its analyst treats the data as
//! unavailable.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Error, Result, SnapshotKind};

/// One daily session of price history
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Ordered daily price history for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    symbol: String,
    bars: Vec<PriceBar>,
}

impl PriceSnapshot {
    /// Create a validated price snapshot
    pub fn new(symbol: impl Into<String>, bars: Vec<PriceBar>) -> Result<Self> {
        let snapshot = Self {
            symbol: symbol.into(),
            bars,
        };
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Snapshot with no sessions
    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            bars: Vec::new(),
        }
    }

    /// Check dates are strictly increasing and every bar is a well-formed candle
    pub fn validate(&self) -> Result<()> {
        for (i, bar) in self.bars.iter().enumerate() {
            let prices = [bar.open, bar.high, bar.low, bar.close];
            if prices.iter().any(|p| !p.is_finite() || *p <= 0.0) {
                return Err(Error::malformed(
                    SnapshotKind::Price,
                    format!("non-positive or non-finite price on {}", bar.date),
                ));
            }
            if bar.high < bar.open.max(bar.close) || bar.low > bar.open.min(bar.close) {
                return Err(Error::malformed(
                    SnapshotKind::Price,
                    format!("high/low envelope does not contain open/close on {}", bar.date),
                ));
            }
            if i > 0 && bar.date <= self.bars[i - 1].date {
                return Err(Error::malformed(
                    SnapshotKind::Price,
                    format!("non-monotonic date {} at index {i}", bar.date),
                ));
            }
        }
        Ok(())
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Most recent session
    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    /// Closing prices in session order
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }
}

/// Financial metric reported in a fundamental snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Price to earnings ratio (negative when the company is loss-making)
    PeRatio,
    /// Price to book ratio
    PbRatio,
    /// Return on equity, as a fraction
    ReturnOnEquity,
    /// Year-over-year revenue growth, as a fraction
    RevenueGrowth,
    /// Year-over-year net profit growth, as a fraction
    ProfitGrowth,
    /// Total liabilities over total assets
    DebtRatio,
    /// Peer or historical P/E used as valuation baseline
    PeerPeRatio,
    /// Peer or historical P/B used as valuation baseline
    PeerPbRatio,
}

/// Financial metrics for one symbol as of a reporting period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundamentalSnapshot {
    symbol: String,
    as_of: String,
    metrics: BTreeMap<Metric, f64>,
}

impl FundamentalSnapshot {
    /// Create a validated fundamental snapshot
    pub fn new(
        symbol: impl Into<String>,
        as_of: impl Into<String>,
        metrics: BTreeMap<Metric, f64>,
    ) -> Result<Self> {
        let snapshot = Self {
            symbol: symbol.into(),
            as_of: as_of.into(),
            metrics,
        };
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Snapshot with no metrics
    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            as_of: String::new(),
            metrics: BTreeMap::new(),
        }
    }

    /// Check all values are finite and ratios that cannot be negative are not
    pub fn validate(&self) -> Result<()> {
        for (metric, value) in &self.metrics {
            if !value.is_finite() {
                return Err(Error::malformed(
                    SnapshotKind::Fundamental,
                    format!("{metric:?} is not finite"),
                ));
            }
            let must_be_positive = matches!(metric, Metric::PeerPeRatio | Metric::PeerPbRatio);
            if (must_be_positive && *value <= 0.0) || (*metric == Metric::DebtRatio && *value < 0.0)
            {
                return Err(Error::malformed(
                    SnapshotKind::Fundamental,
                    format!("{metric:?} out of range: {value}"),
                ));
            }
        }
        Ok(())
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Reporting period the metrics refer to
    pub fn as_of(&self) -> &str {
        &self.as_of
    }

    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.metrics.get(&metric).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

/// One news or social item with a polarity in [-1, 1]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentItem {
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub polarity: f64,
    pub headline: String,
}

/// Chronologically ordered sentiment feed for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentSnapshot {
    symbol: String,
    items: Vec<SentimentItem>,
}

impl SentimentSnapshot {
    /// Create a validated sentiment snapshot
    pub fn new(symbol: impl Into<String>, items: Vec<SentimentItem>) -> Result<Self> {
        let snapshot = Self {
            symbol: symbol.into(),
            items,
        };
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Snapshot with no items
    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            items: Vec::new(),
        }
    }

    /// Check timestamps never go backwards and polarities stay in [-1, 1]
    pub fn validate(&self) -> Result<()> {
        for (i, item) in self.items.iter().enumerate() {
            if !item.polarity.is_finite() || !(-1.0..=1.0).contains(&item.polarity) {
                return Err(Error::malformed(
                    SnapshotKind::Sentiment,
                    format!("polarity {} out of range at index {i}", item.polarity),
                ));
            }
            if i > 0 && item.timestamp < self.items[i - 1].timestamp {
                return Err(Error::malformed(
                    SnapshotKind::Sentiment,
                    format!("timestamp goes backwards at index {i}"),
                ));
            }
        }
        Ok(())
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn items(&self) -> &[SentimentItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
