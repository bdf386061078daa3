//! Analysis engine
//!
//! Coordination layer: fetches the three snapshots concurrently, runs the
//! analysts, reconciles their signals and synthesises the decision.

pub mod pipeline;
pub mod report;

pub use pipeline::{AnalysisPipeline, SnapshotBundle};
pub use report::AnalysisReport;
