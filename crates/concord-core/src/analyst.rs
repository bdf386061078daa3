//! The capability shared by all analysts

use crate::diagnosis::Diagnosis;
use crate::signal::{Signal, SignalSource};

/// Produces exactly one [`Signal`] from a snapshot
///
/// Implementations must be total: a sparse or empty snapshot degrades to a
/// neutral signal instead of failing.
pub trait Analyst: Send + Sync {
    /// Input the analyst consumes
    type Snapshot;

    /// Which source this analyst reports as
    fn source(&self) -> SignalSource;

    /// Turn a snapshot (and, for the technical analyst, its diagnosis) into a signal
    fn produce(&self, snapshot: &Self::Snapshot, diagnosis: Option<&Diagnosis>) -> Signal;

    /// Signal substituted when the snapshot could not be obtained
    fn degraded(&self) -> Signal {
        Signal::insufficient_data(self.source())
    }
}
