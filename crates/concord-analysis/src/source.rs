//! Market data interface consumed by the pipeline
//!
//! Implementations may be slow or fail; the pipeline calls each method at most
//! once per invocation, bounds it with a timeout and never retries.

use async_trait::async_trait;
use chrono::Duration as ChronoDuration;
use concord_core::{FundamentalSnapshot, PriceSnapshot, SentimentSnapshot};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{AnalysisError, Result};

/// Data-acquisition collaborator
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Daily price history covering at most `lookback` sessions
    async fn fetch_price_history(&self, symbol: &str, lookback: usize) -> Result<PriceSnapshot>;

    /// Latest financial metrics
    async fn fetch_fundamentals(&self, symbol: &str) -> Result<FundamentalSnapshot>;

    /// News and social items from the last `lookback_days`
    async fn fetch_sentiment(&self, symbol: &str, lookback_days: u32) -> Result<SentimentSnapshot>;

    /// Current trading price
    async fn current_price(&self, symbol: &str) -> Result<f64>;
}

/// Pre-recorded data for one symbol
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SymbolData {
    pub price: Option<PriceSnapshot>,
    pub fundamentals: Option<FundamentalSnapshot>,
    pub sentiment: Option<SentimentSnapshot>,
    pub current_price: Option<f64>,
}

/// In-memory source backed by recorded snapshots, keyed by symbol
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureSource {
    #[serde(default)]
    symbols: HashMap<String, SymbolData>,
}

impl FixtureSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>, data: SymbolData) -> Self {
        self.symbols.insert(symbol.into(), data);
        self
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.symbols.keys().map(String::as_str)
    }

    fn lookup(&self, symbol: &str) -> Result<&SymbolData> {
        self.symbols
            .get(symbol)
            .ok_or_else(|| AnalysisError::unavailable(symbol, "symbol not in fixture"))
    }
}

#[async_trait]
impl MarketDataSource for FixtureSource {
    async fn fetch_price_history(&self, symbol: &str, lookback: usize) -> Result<PriceSnapshot> {
        let snapshot = self
            .lookup(symbol)?
            .price
            .as_ref()
            .ok_or_else(|| AnalysisError::unavailable(symbol, "no price history"))?;
        let bars = snapshot.bars();
        let recent = &bars[bars.len().saturating_sub(lookback)..];
        Ok(PriceSnapshot::new(snapshot.symbol(), recent.to_vec())?)
    }

    async fn fetch_fundamentals(&self, symbol: &str) -> Result<FundamentalSnapshot> {
        self.lookup(symbol)?
            .fundamentals
            .clone()
            .ok_or_else(|| AnalysisError::unavailable(symbol, "no fundamentals"))
    }

    async fn fetch_sentiment(&self, symbol: &str, lookback_days: u32) -> Result<SentimentSnapshot> {
        let snapshot = self
            .lookup(symbol)?
            .sentiment
            .as_ref()
            .ok_or_else(|| AnalysisError::unavailable(symbol, "no sentiment feed"))?;
        let items = snapshot.items();
        let Some(newest) = items.iter().map(|i| i.timestamp).max() else {
            return Ok(snapshot.clone());
        };
        let cutoff = newest - ChronoDuration::days(i64::from(lookback_days));
        let recent = items
            .iter()
            .filter(|i| i.timestamp >= cutoff)
            .cloned()
            .collect();
        Ok(SentimentSnapshot::new(snapshot.symbol(), recent)?)
    }

    async fn current_price(&self, symbol: &str) -> Result<f64> {
        self.lookup(symbol)?
            .current_price
            .ok_or_else(|| AnalysisError::unavailable(symbol, "no current price"))
    }
}
