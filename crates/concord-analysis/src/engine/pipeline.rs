//! Concurrent analysis pipeline

use concord_core::{
    Analyst, Decision, Diagnosis, FundamentalSnapshot, Price, PriceSnapshot, SentimentSnapshot,
    Signal, SignalSource, Stance,
};
use std::future::Future;
use std::sync::Arc;
use uuid::Uuid;

use super::report::AnalysisReport;
use crate::agents::{FundamentalAnalyst, SentimentAnalyst, TechnicalAnalyst};
use crate::config::PipelineConfig;
use crate::debate::{DebateReconciler, SignalSet};
use crate::decision::DecisionSynthesizer;
use crate::error::{AnalysisError, Result};
use crate::outlook;
use crate::source::MarketDataSource;

/// Already-acquired snapshots for one symbol
#[derive(Debug, Clone, Default)]
pub struct SnapshotBundle {
    pub symbol: String,
    pub price: Option<PriceSnapshot>,
    pub fundamentals: Option<FundamentalSnapshot>,
    pub sentiment: Option<SentimentSnapshot>,
}

/// Multi-perspective analysis pipeline
///
/// Holds no per-request state; one instance can serve concurrent invocations.
pub struct AnalysisPipeline {
    source: Arc<dyn MarketDataSource>,
    config: Arc<PipelineConfig>,
    technical: TechnicalAnalyst,
    fundamental: FundamentalAnalyst,
    sentiment: SentimentAnalyst,
    debate: DebateReconciler,
    decision: DecisionSynthesizer,
}

impl AnalysisPipeline {
    /// Create a pipeline, rejecting an invalid configuration
    pub fn new(source: Arc<dyn MarketDataSource>, config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let config = Arc::new(config);
        Ok(Self {
            source,
            technical: TechnicalAnalyst::new(Arc::clone(&config)),
            fundamental: FundamentalAnalyst::new(Arc::clone(&config)),
            sentiment: SentimentAnalyst::new(Arc::clone(&config)),
            debate: DebateReconciler::new(config.debate.clone()),
            decision: DecisionSynthesizer::new(config.decision.clone()),
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Fetch, analyse and decide for one symbol
    ///
    /// Only an invalid symbol is an error; unavailable, malformed or late data
    /// degrades the affected analyst instead.
    #[tracing::instrument(skip(self), fields(request_id = tracing::field::Empty))]
    pub async fn analyze(&self, symbol: &str) -> Result<AnalysisReport> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(AnalysisError::InvalidSymbol(
                "symbol must not be empty".to_string(),
            ));
        }
        let request_id = Uuid::new_v4();
        tracing::Span::current().record("request_id", tracing::field::display(request_id));
        tracing::info!("Starting analysis");

        let config = &self.config;
        let (price, fundamentals, sentiment, current_price) = tokio::join!(
            self.fetch(
                SignalSource::Technical,
                self.source
                    .fetch_price_history(symbol, config.lookback_sessions),
            ),
            self.fetch(
                SignalSource::Fundamental,
                self.source.fetch_fundamentals(symbol),
            ),
            self.fetch(
                SignalSource::Sentiment,
                self.source
                    .fetch_sentiment(symbol, config.sentiment_lookback_days),
            ),
            self.fetch_current_price(symbol),
        );

        let price = Self::accept(
            SignalSource::Technical,
            price.and_then(|s| {
                s.validate()?;
                Ok(s)
            }),
        );
        let fundamentals = Self::accept(
            SignalSource::Fundamental,
            fundamentals.and_then(|s| {
                s.validate()?;
                Ok(s)
            }),
        );
        let sentiment = Self::accept(
            SignalSource::Sentiment,
            sentiment.and_then(|s| {
                s.validate()?;
                Ok(s)
            }),
        );

        let report = self.assemble(
            symbol,
            request_id,
            price.as_ref(),
            fundamentals.as_ref(),
            sentiment.as_ref(),
            current_price,
        );
        tracing::info!(
            action = %report.decision.action,
            confidence = report.decision.confidence,
            "Analysis complete"
        );
        Ok(report)
    }

    /// Analyse several symbols concurrently, one independent invocation each
    pub async fn analyze_batch(&self, symbols: &[String]) -> Vec<Result<AnalysisReport>> {
        let futures: Vec<_> = symbols.iter().map(|s| self.analyze(s)).collect();
        futures::future::join_all(futures).await
    }

    /// Analyse snapshots that were already acquired, without any I/O
    ///
    /// Invalid snapshots and prices are treated as unavailable.
    pub fn evaluate(&self, bundle: &SnapshotBundle, current_price: Option<f64>) -> AnalysisReport {
        let price = bundle.price.as_ref().filter(|s| {
            Self::accept(SignalSource::Technical, s.validate().map_err(Into::into)).is_some()
        });
        let fundamentals = bundle.fundamentals.as_ref().filter(|s| {
            Self::accept(SignalSource::Fundamental, s.validate().map_err(Into::into)).is_some()
        });
        let sentiment = bundle.sentiment.as_ref().filter(|s| {
            Self::accept(SignalSource::Sentiment, s.validate().map_err(Into::into)).is_some()
        });
        let current_price = current_price.and_then(|p| match Price::new(p) {
            Ok(price) => Some(price),
            Err(e) => {
                tracing::warn!(error = %e, "rejecting current price");
                None
            }
        });
        self.assemble(
            &bundle.symbol,
            Uuid::new_v4(),
            price,
            fundamentals,
            sentiment,
            current_price,
        )
    }

    /// Reconcile a full signal set and turn it into a decision
    pub fn conclude(
        &self,
        signals: &SignalSet,
        current_price: Option<Price>,
    ) -> (Stance, Decision) {
        let stance = self.debate.reconcile(signals);
        let decision = self.decision.decide(&stance, current_price);
        (stance, decision)
    }

    /// Bound one data request by the agent timeout
    async fn fetch<T>(
        &self,
        analyst: SignalSource,
        request: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        let after = self.config.agent_timeout;
        tokio::time::timeout(after, request)
            .await
            .map_err(|_| AnalysisError::Timeout { analyst, after })?
    }

    async fn fetch_current_price(&self, symbol: &str) -> Option<Price> {
        let after = self.config.agent_timeout;
        let result = match tokio::time::timeout(after, self.source.current_price(symbol)).await {
            Ok(price) => price.and_then(|p| Price::new(p).map_err(Into::into)),
            Err(_) => Err(AnalysisError::unavailable(
                symbol,
                format!("current price timed out after {after:?}"),
            )),
        };
        match result {
            Ok(price) => Some(price),
            Err(e) => {
                tracing::warn!(error = %e, "current price unavailable");
                None
            }
        }
    }

    /// Keep a snapshot, or log why its analyst will degrade
    fn accept<T>(analyst: SignalSource, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(%analyst, error = %e, "analyst degraded");
                None
            }
        }
    }

    fn technical_signal(&self, snapshot: Option<&PriceSnapshot>) -> (Signal, Option<Diagnosis>) {
        let Some(snapshot) = snapshot else {
            return (self.technical.degraded(), None);
        };
        match self.technical.diagnose(snapshot) {
            Some(view) => (
                self.technical.produce(snapshot, Some(&view.diagnosis)),
                Some(view.diagnosis),
            ),
            None => (self.technical.produce(snapshot, None), None),
        }
    }

    fn assemble(
        &self,
        symbol: &str,
        request_id: Uuid,
        price: Option<&PriceSnapshot>,
        fundamentals: Option<&FundamentalSnapshot>,
        sentiment: Option<&SentimentSnapshot>,
        current_price: Option<Price>,
    ) -> AnalysisReport {
        let (technical, diagnosis) = self.technical_signal(price);
        let fundamental = fundamentals.map_or_else(
            || self.fundamental.degraded(),
            |s| self.fundamental.produce(s, None),
        );
        let sentiment = sentiment.map_or_else(
            || self.sentiment.degraded(),
            |s| self.sentiment.produce(s, None),
        );
        let signals = SignalSet::new(technical, fundamental, sentiment);
        for signal in signals.iter() {
            tracing::debug!(
                source = %signal.source,
                direction = %signal.direction,
                strength = signal.strength,
                "signal produced"
            );
        }

        let (stance, mut decision) = self.conclude(&signals, current_price);
        let view = fundamentals.and_then(|s| self.fundamental.view(s));
        let outlook = outlook::assess(
            diagnosis.as_ref(),
            view.as_ref(),
            &signals.sentiment,
            self.config.fundamental.valuation_margin,
            &self.config.outlook,
        );
        decision.rationale.extend(outlook.rationale(decision.action));

        AnalysisReport {
            symbol: symbol.to_string(),
            request_id,
            signals,
            diagnosis,
            stance,
            outlook,
            decision,
        }
    }
}
