//! Error types for concord-core

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type alias for concord-core
pub type Result<T> = std::result::Result<T, Error>;

/// Which snapshot a validation failure refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotKind {
    Price,
    Fundamental,
    Sentiment,
}

impl fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Price => "price",
            Self::Fundamental => "fundamental",
            Self::Sentiment => "sentiment",
        };
        f.write_str(name)
    }
}

/// Error type for data-model invariants
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Snapshot violates a structural invariant
    #[error("Malformed {kind} snapshot: {reason}")]
    MalformedSnapshot { kind: SnapshotKind, reason: String },

    /// Price is not a positive finite number
    #[error("Invalid price: {0}")]
    InvalidPrice(f64),
}

impl Error {
    pub(crate) fn malformed(kind: SnapshotKind, reason: impl Into<String>) -> Self {
        Self::MalformedSnapshot {
            kind,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::malformed(SnapshotKind::Price, "negative close at index 3");
        assert_eq!(
            err.to_string(),
            "Malformed price snapshot: negative close at index 3"
        );

        let err = Error::InvalidPrice(-1.0);
        assert_eq!(err.to_string(), "Invalid price: -1");
    }
}
