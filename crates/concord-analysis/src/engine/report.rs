//! Analysis report types

use concord_core::{Decision, Diagnosis, Stance};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::debate::SignalSet;
use crate::outlook::Outlook;

/// Everything one invocation produced, ending in the decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub symbol: String,
    pub request_id: Uuid,
    pub signals: SignalSet,
    /// Absent when the price history was unavailable or too short
    pub diagnosis: Option<Diagnosis>,
    pub stance: Stance,
    pub outlook: Outlook,
    pub decision: Decision,
}

impl AnalysisReport {
    /// Sources that fell back to the insufficient-data signal
    pub fn degraded_sources(&self) -> Vec<String> {
        self.signals
            .iter()
            .filter(|s| s.is_degraded())
            .map(|s| s.source.to_string())
            .collect()
    }
}
