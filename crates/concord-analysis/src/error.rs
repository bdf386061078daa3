//! Error types for analysis operations

use concord_core::SignalSource;
use std::time::Duration;
use thiserror::Error;

/// Analysis specific errors
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// A snapshot could not be obtained from the data source
    #[error("Data not available for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    /// A snapshot violated its structural invariants
    #[error(transparent)]
    MalformedSnapshot(#[from] concord_core::Error),

    /// An analyst branch did not complete in time
    #[error("{analyst} analysis timed out after {after:?}")]
    Timeout {
        analyst: SignalSource,
        after: Duration,
    },

    /// Weight vectors or thresholds violate their invariants
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Invalid stock symbol provided
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),
}

impl AnalysisError {
    /// Shorthand for a data-unavailable error
    pub fn unavailable(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DataUnavailable {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;
