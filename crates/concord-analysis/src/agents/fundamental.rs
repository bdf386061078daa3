//! Fundamental analysis agent
//!
//! Compares valuation ratios against peer (or configured) baselines, growth
//! against a flat-growth baseline, and profitability and leverage against
//! quality thresholds. Each part is a deviation in [-1, 1] where positive
//! favours the stock.

use concord_core::{
    Analyst, Diagnosis, Direction, FundamentalSnapshot, Metric, Signal, SignalSource,
};
use serde::Serialize;
use std::sync::Arc;

use crate::config::{FundamentalConfig, PipelineConfig};

/// Discount of a ratio to its baseline; non-positive ratios count as expensive
fn discount(value: f64, baseline: f64) -> f64 {
    if value <= 0.0 {
        return -1.0;
    }
    ((baseline - value) / baseline).clamp(-1.0, 1.0)
}

fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

/// Deviations from baseline, each in [-1, 1] and positive when favourable
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FundamentalView {
    /// Discount of P/E and P/B to their baselines
    pub valuation: Option<f64>,
    pub growth: Option<f64>,
    /// Profitability and leverage
    pub quality: Option<f64>,
}

#[derive(Debug, Default)]
struct Assessment {
    view: FundamentalView,
    evidence: Vec<String>,
}

/// Agent turning financial metrics into a fundamental signal
pub struct FundamentalAnalyst {
    config: Arc<PipelineConfig>,
}

impl FundamentalAnalyst {
    pub fn new(config: Arc<PipelineConfig>) -> Self {
        Self { config }
    }

    fn settings(&self) -> &FundamentalConfig {
        &self.config.fundamental
    }

    fn assess(&self, snapshot: &FundamentalSnapshot) -> Assessment {
        let cfg = self.settings();
        let mut assessment = Assessment::default();

        let mut valuation = Vec::new();
        for (metric, peer, default, name) in [
            (Metric::PeRatio, Metric::PeerPeRatio, cfg.baseline_pe, "P/E"),
            (Metric::PbRatio, Metric::PeerPbRatio, cfg.baseline_pb, "P/B"),
        ] {
            let Some(value) = snapshot.get(metric) else {
                continue;
            };
            let (baseline, basis) = match snapshot.get(peer) {
                Some(p) => (p, "peer"),
                None => (default, "baseline"),
            };
            let d = discount(value, baseline);
            valuation.push(d);
            assessment.evidence.push(format!(
                "{name} {value:.2} vs {basis} {baseline:.2} ({})",
                if d >= 0.0 { "cheaper" } else { "richer" }
            ));
        }
        assessment.view.valuation = mean(&valuation);

        let mut growth = Vec::new();
        for (metric, name) in [
            (Metric::RevenueGrowth, "revenue growth"),
            (Metric::ProfitGrowth, "profit growth"),
        ] {
            if let Some(value) = snapshot.get(metric) {
                growth.push(value);
                assessment
                    .evidence
                    .push(format!("{name} {:+.1}%", value * 100.0));
            }
        }
        assessment.view.growth = mean(&growth)
            .map(|g| ((g - cfg.baseline_growth) / cfg.growth_scale).clamp(-1.0, 1.0));

        let mut quality = Vec::new();
        if let Some(roe) = snapshot.get(Metric::ReturnOnEquity) {
            quality.push(((roe - cfg.baseline_roe) / cfg.baseline_roe).clamp(-1.0, 1.0));
            assessment
                .evidence
                .push(format!("return on equity {:.1}%", roe * 100.0));
        }
        if let Some(debt) = snapshot.get(Metric::DebtRatio) {
            quality.push(((cfg.max_debt_ratio - debt) / cfg.max_debt_ratio).clamp(-1.0, 1.0));
            assessment
                .evidence
                .push(format!("debt ratio {:.1}%", debt * 100.0));
        }
        assessment.view.quality = mean(&quality);

        assessment
    }

    /// Deviations behind the signal; `None` when neither valuation nor growth is known
    pub fn view(&self, snapshot: &FundamentalSnapshot) -> Option<FundamentalView> {
        let view = self.assess(snapshot).view;
        (view.valuation.is_some() || view.growth.is_some()).then_some(view)
    }

    /// Weighted mean of the available parts, renormalised over their weights
    fn composite(&self, view: &FundamentalView) -> f64 {
        let weights = &self.settings().weights;
        let parts = [
            (view.valuation, weights.valuation),
            (view.growth, weights.growth),
            (view.quality, weights.quality),
        ];
        let (sum, weight) = parts
            .iter()
            .filter_map(|&(value, weight)| value.map(|v| (v * weight, weight)))
            .fold((0.0, 0.0), |(s, w), (vs, vw)| (s + vs, w + vw));
        if weight > 0.0 { sum / weight } else { 0.0 }
    }
}

impl Analyst for FundamentalAnalyst {
    type Snapshot = FundamentalSnapshot;

    fn source(&self) -> SignalSource {
        SignalSource::Fundamental
    }

    fn produce(&self, snapshot: &FundamentalSnapshot, _diagnosis: Option<&Diagnosis>) -> Signal {
        let Assessment {
            view,
            mut evidence,
        } = self.assess(snapshot);
        if view.valuation.is_none() && view.growth.is_none() {
            tracing::debug!(
                symbol = snapshot.symbol(),
                "no valuation or growth metrics available"
            );
            return self.degraded();
        }

        let margin = self.settings().valuation_margin;
        let valuation = view.valuation.unwrap_or(0.0);
        let growth = view.growth.unwrap_or(0.0);
        let direction = if valuation > margin && growth > 0.0 {
            Direction::Bullish
        } else if valuation < -margin && growth < 0.0 {
            Direction::Bearish
        } else {
            Direction::Neutral
        };

        let composite = self.composite(&view);
        // A call only draws strength from the part of the composite agreeing with it
        let strength = match direction {
            Direction::Neutral => composite.abs(),
            called => (called.sign() * composite).max(0.0),
        };
        let mut summary = format!("valuation {valuation:+.2}, growth {growth:+.2}");
        if let Some(quality) = view.quality {
            summary.push_str(&format!(", quality {quality:+.2}"));
        }
        if !snapshot.as_of().is_empty() {
            summary.push_str(&format!(" as of {}", snapshot.as_of()));
        }
        evidence.insert(0, summary);

        Signal::new(
            self.source(),
            direction,
            strength,
            evidence,
        )
    }
}
