//! Analyst agents
//!
//! Each analyst implements [`concord_core::Analyst`] over its own snapshot
//! type and emits exactly one signal per invocation.

pub mod fundamental;
pub mod sentiment;
pub mod technical;

pub use fundamental::{FundamentalAnalyst, FundamentalView};
pub use sentiment::SentimentAnalyst;
pub use technical::{TechnicalAnalyst, TechnicalView};
