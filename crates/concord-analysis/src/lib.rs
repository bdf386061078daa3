//! Multi-perspective trading analysis engine
//!
//! This crate turns point-in-time snapshots of one equity into a trading
//! decision. It includes:
//!
//! - Technical indicators and price-action patterns (RSI, MACD, Bollinger %B,
//!   stochastic, money flow, engulfing, head-and-shoulders, triangles, ...)
//! - Composite scoring along the pattern, volume-price and indicator axes
//! - A diagnosis of trend per horizon, range position and dominant pattern
//! - Technical, fundamental and sentiment analysts emitting one signal each
//! - A weighted-vote debate reconciler and a risk-bounded decision synthesizer
//! - A graded risk and opportunity outlook backing the decision rationale
//!
//! # Architecture
//!
//! `AnalysisPipeline` fetches the three snapshots concurrently through a
//! [`MarketDataSource`], bounds each request by a timeout and substitutes a
//! neutral "insufficient data" signal for any analyst whose data is missing,
//! malformed or late. The signals then go through the `DebateReconciler` and
//! the `DecisionSynthesizer`.
//!
//! # Example
//!
//! ```rust,ignore
//! use concord_analysis::{AnalysisPipeline, FixtureSource, PipelineConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let source = Arc::new(FixtureSource::new());
//!     let config = PipelineConfig::builder().source_weights(0.5, 0.25, 0.25).build()?;
//!     let pipeline = AnalysisPipeline::new(source, config)?;
//!
//!     let report = pipeline.analyze("ACME").await?;
//!     println!("{}", serde_json::to_string_pretty(&report.decision)?);
//!
//!     Ok(())
//! }
//! ```

pub mod agents;
pub mod config;
pub mod debate;
pub mod decision;
pub mod diagnosis;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod outlook;
pub mod patterns;
pub mod scoring;
pub mod source;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export main types for convenience
pub use agents::{
    FundamentalAnalyst, FundamentalView, SentimentAnalyst, TechnicalAnalyst, TechnicalView,
};
pub use config::{PipelineConfig, PipelineConfigBuilder};
pub use debate::{DebateReconciler, SignalSet};
pub use decision::DecisionSynthesizer;
pub use engine::{AnalysisPipeline, AnalysisReport, SnapshotBundle};
pub use error::{AnalysisError, Result};
pub use indicators::IndicatorSet;
pub use outlook::{OpportunityLevel, Outlook, RiskLevel};
pub use scoring::AxisScores;
pub use source::{FixtureSource, MarketDataSource, SymbolData};
