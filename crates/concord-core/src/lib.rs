//! Core data model for concord
//!
//! This crate defines the types exchanged between the stages of the analysis
//! pipeline: immutable input snapshots, the technical diagnosis, per-analyst
//! signals, the reconciled stance and the final decision. It also defines the
//! [`Analyst`] capability shared by the technical, fundamental and sentiment
//! analysts.

pub mod analyst;
pub mod diagnosis;
pub mod error;
pub mod signal;
pub mod snapshot;

pub use analyst::Analyst;
pub use diagnosis::{
    CompositeScore, Diagnosis, PatternFamily, PatternKind, PatternLabel, Score, ScoreAxis, Trend,
};
pub use error::{Error, Result, SnapshotKind};
pub use signal::{
    Action, Decision, Direction, INSUFFICIENT_DATA, NO_SUPPORTING_EVIDENCE, Price, Signal,
    SignalSource, Stance,
};
pub use snapshot::{
    FundamentalSnapshot, Metric, PriceBar, PriceSnapshot, SentimentItem, SentimentSnapshot,
};
