//! Configuration for the analysis pipeline
//!
//! Every weight vector, threshold and risk fraction used by the engine lives
//! here. A [`PipelineConfig`] is validated once when it is built and is then
//! shared read-only (typically behind an `Arc`) by every invocation.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{AnalysisError, Result};

const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Periods and thresholds of the indicator library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bollinger_period: usize,
    pub bollinger_multiplier: f64,
    pub atr_period: usize,
    pub stochastic_period: usize,
    pub stochastic_smoothing: usize,
    pub money_flow_period: usize,
    /// Fast moving average used for crossovers
    pub fast_ma: usize,
    /// Slow moving average used for crossovers
    pub slow_ma: usize,
    /// Third moving average for the trend-alignment patterns
    pub trend_ma: usize,
    /// Sessions used for the volume ratio, including the last one
    pub volume_window: usize,
    /// Volume ratio at or above which a session counts as heavy
    pub heavy_volume_ratio: f64,
    /// Volume ratio at or below which a session counts as light
    pub light_volume_ratio: f64,
    /// Absolute session move (fraction) that counts as a rally or decline
    pub price_move_threshold: f64,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            bollinger_period: 20,
            bollinger_multiplier: 2.0,
            atr_period: 14,
            stochastic_period: 14,
            stochastic_smoothing: 3,
            money_flow_period: 14,
            fast_ma: 5,
            slow_ma: 10,
            trend_ma: 20,
            volume_window: 10,
            heavy_volume_ratio: 1.5,
            light_volume_ratio: 0.8,
            price_move_threshold: 0.02,
        }
    }
}

/// Pattern-axis weights per pattern family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternWeights {
    pub candlestick: f64,
    pub moving_average: f64,
    pub structure: f64,
}

impl Default for PatternWeights {
    fn default() -> Self {
        Self {
            candlestick: 0.2,
            moving_average: 0.4,
            structure: 0.4,
        }
    }
}

/// Volume-price axis weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumePriceWeights {
    pub relation: f64,
    pub money_flow: f64,
}

impl Default for VolumePriceWeights {
    fn default() -> Self {
        Self {
            relation: 0.6,
            money_flow: 0.4,
        }
    }
}

/// Indicator axis weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorWeights {
    pub rsi: f64,
    pub macd: f64,
    pub percent_b: f64,
    pub stochastic: f64,
}

impl Default for IndicatorWeights {
    fn default() -> Self {
        Self {
            rsi: 0.3,
            macd: 0.3,
            percent_b: 0.2,
            stochastic: 0.2,
        }
    }
}

/// Weight vectors of the three scoring axes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub pattern: PatternWeights,
    pub volume_price: VolumePriceWeights,
    pub indicator: IndicatorWeights,
}

/// Trend windows and pattern floor of the diagnosis engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosisConfig {
    pub short_window: usize,
    pub medium_window: usize,
    pub long_window: usize,
    /// Minimum net move (fraction) for a short-horizon trend
    pub short_min_move: f64,
    pub medium_min_move: f64,
    pub long_min_move: f64,
    /// Labels below this quality never become the dominant pattern
    pub pattern_quality_floor: f64,
}

impl Default for DiagnosisConfig {
    fn default() -> Self {
        Self {
            short_window: 5,
            medium_window: 20,
            long_window: 60,
            short_min_move: 0.015,
            medium_min_move: 0.03,
            long_min_move: 0.05,
            pattern_quality_floor: 0.5,
        }
    }
}

/// Technical analyst settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TechnicalConfig {
    /// Sessions required before the analyst commits to a view
    pub min_history: usize,
    /// Net vote of short trend, medium trend and pattern bias needed for a direction
    pub direction_threshold: i32,
}

impl Default for TechnicalConfig {
    fn default() -> Self {
        Self {
            min_history: 30,
            direction_threshold: 2,
        }
    }
}

/// Fundamental composite weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FundamentalWeights {
    pub valuation: f64,
    pub growth: f64,
    pub quality: f64,
}

impl Default for FundamentalWeights {
    fn default() -> Self {
        Self {
            valuation: 0.4,
            growth: 0.4,
            quality: 0.2,
        }
    }
}

/// Fundamental analyst baselines, used when no peer ratios are supplied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FundamentalConfig {
    pub baseline_pe: f64,
    pub baseline_pb: f64,
    /// Growth rate considered flat
    pub baseline_growth: f64,
    /// Growth deviation that maps to full strength
    pub growth_scale: f64,
    pub baseline_roe: f64,
    pub max_debt_ratio: f64,
    pub weights: FundamentalWeights,
    /// Valuation deviation needed to call a stock under- or overvalued
    pub valuation_margin: f64,
}

impl Default for FundamentalConfig {
    fn default() -> Self {
        Self {
            baseline_pe: 20.0,
            baseline_pb: 3.0,
            baseline_growth: 0.05,
            growth_scale: 0.2,
            baseline_roe: 0.10,
            max_debt_ratio: 0.6,
            weights: FundamentalWeights::default(),
            valuation_margin: 0.05,
        }
    }
}

/// Sentiment analyst settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentConfig {
    /// Age after which an item's weight halves
    pub half_life_hours: f64,
    /// Decayed polarity needed for a direction
    pub polarity_threshold: f64,
    /// Item count at which volume no longer limits strength
    pub full_strength_items: usize,
    /// Below this item count strength is capped
    pub min_items: usize,
    pub low_volume_cap: f64,
    /// Headlines quoted as evidence
    pub max_evidence: usize,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            half_life_hours: 72.0,
            polarity_threshold: 0.1,
            full_strength_items: 5,
            min_items: 3,
            low_volume_cap: 0.3,
            max_evidence: 3,
        }
    }
}

/// Per-source vote weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceWeights {
    pub technical: f64,
    pub fundamental: f64,
    pub sentiment: f64,
}

impl SourceWeights {
    pub fn total(&self) -> f64 {
        self.technical + self.fundamental + self.sentiment
    }
}

impl Default for SourceWeights {
    fn default() -> Self {
        Self {
            technical: 0.4,
            fundamental: 0.3,
            sentiment: 0.3,
        }
    }
}

/// Debate reconciler settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebateConfig {
    pub weights: SourceWeights,
    /// Half-width of the neutral zone around a zero net score
    pub neutral_zone: f64,
}

impl Default for DebateConfig {
    fn default() -> Self {
        Self {
            weights: SourceWeights::default(),
            neutral_zone: 0.10,
        }
    }
}

/// Thresholds of the risk and opportunity outlook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlookConfig {
    /// Range position at or above which the close counts as high
    pub high_range: f64,
    /// Range position at or below which the close counts as low
    pub low_range: f64,
    /// Quality deviation at or above which financial health is strong
    pub strong_quality: f64,
    /// Quality deviation below which financial health is weak
    pub weak_quality: f64,
}

impl Default for OutlookConfig {
    fn default() -> Self {
        Self {
            high_range: 0.8,
            low_range: 0.2,
            strong_quality: 0.5,
            weak_quality: 0.0,
        }
    }
}

/// Risk parameters of the decision synthesizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionConfig {
    pub take_profit: f64,
    pub stop_loss: f64,
    /// Stance confidence required to act
    pub min_confidence: f64,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            take_profit: 0.05,
            stop_loss: 0.03,
            min_confidence: 0.20,
        }
    }
}

/// Configuration for the analysis pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Sessions of price history requested per invocation
    pub lookback_sessions: usize,
    /// Days of sentiment items requested per invocation
    pub sentiment_lookback_days: u32,
    /// Deadline for each analyst branch and the price lookup
    pub agent_timeout: Duration,
    pub indicators: IndicatorConfig,
    pub scoring: ScoringWeights,
    pub diagnosis: DiagnosisConfig,
    pub technical: TechnicalConfig,
    pub fundamental: FundamentalConfig,
    pub sentiment: SentimentConfig,
    pub debate: DebateConfig,
    pub decision: DecisionConfig,
    pub outlook: OutlookConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            lookback_sessions: 120,
            sentiment_lookback_days: 30,
            agent_timeout: Duration::from_secs(10),
            indicators: IndicatorConfig::default(),
            scoring: ScoringWeights::default(),
            diagnosis: DiagnosisConfig::default(),
            technical: TechnicalConfig::default(),
            fundamental: FundamentalConfig::default(),
            sentiment: SentimentConfig::default(),
            debate: DebateConfig::default(),
            decision: DecisionConfig::default(),
            outlook: OutlookConfig::default(),
        }
    }
}

fn config_error(message: impl Into<String>) -> AnalysisError {
    AnalysisError::ConfigError(message.into())
}

fn check_weights(name: &str, weights: &[f64]) -> Result<()> {
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(config_error(format!("{name} weights must be non-negative")));
    }
    let sum: f64 = weights.iter().sum();
    if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
        return Err(config_error(format!(
            "{name} weights must sum to 1.0, got {sum}"
        )));
    }
    Ok(())
}

fn check_fraction(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(config_error(format!("{name} must be within [0, 1], got {value}")));
    }
    Ok(())
}

fn check_positive(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(config_error(format!("{name} must be positive, got {value}")));
    }
    Ok(())
}

fn check_period(name: &str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(config_error(format!("{name} must be greater than 0")));
    }
    Ok(())
}

impl PipelineConfig {
    /// Create a new configuration builder
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        check_period("lookback_sessions", self.lookback_sessions)?;
        if self.agent_timeout.is_zero() {
            return Err(config_error("agent_timeout must be greater than 0"));
        }

        let ind = &self.indicators;
        for (name, period) in [
            ("rsi_period", ind.rsi_period),
            ("macd_fast", ind.macd_fast),
            ("macd_slow", ind.macd_slow),
            ("macd_signal", ind.macd_signal),
            ("bollinger_period", ind.bollinger_period),
            ("atr_period", ind.atr_period),
            ("stochastic_period", ind.stochastic_period),
            ("stochastic_smoothing", ind.stochastic_smoothing),
            ("money_flow_period", ind.money_flow_period),
            ("fast_ma", ind.fast_ma),
            ("slow_ma", ind.slow_ma),
            ("trend_ma", ind.trend_ma),
        ] {
            check_period(name, period)?;
        }
        if ind.macd_fast >= ind.macd_slow {
            return Err(config_error("macd_fast must be shorter than macd_slow"));
        }
        if !(ind.fast_ma < ind.slow_ma && ind.slow_ma < ind.trend_ma) {
            return Err(config_error("moving averages must satisfy fast < slow < trend"));
        }
        if ind.volume_window < 2 {
            return Err(config_error("volume_window must be at least 2"));
        }
        check_positive("bollinger_multiplier", ind.bollinger_multiplier)?;
        check_positive("heavy_volume_ratio", ind.heavy_volume_ratio)?;
        check_positive("light_volume_ratio", ind.light_volume_ratio)?;
        if ind.light_volume_ratio >= ind.heavy_volume_ratio {
            return Err(config_error(
                "light_volume_ratio must be below heavy_volume_ratio",
            ));
        }
        check_fraction("price_move_threshold", ind.price_move_threshold)?;

        let scoring = &self.scoring;
        check_weights(
            "pattern",
            &[
                scoring.pattern.candlestick,
                scoring.pattern.moving_average,
                scoring.pattern.structure,
            ],
        )?;
        check_weights(
            "volume-price",
            &[
                scoring.volume_price.relation,
                scoring.volume_price.money_flow,
            ],
        )?;
        check_weights(
            "indicator",
            &[
                scoring.indicator.rsi,
                scoring.indicator.macd,
                scoring.indicator.percent_b,
                scoring.indicator.stochastic,
            ],
        )?;

        let diag = &self.diagnosis;
        check_period("short_window", diag.short_window)?;
        if !(diag.short_window <= diag.medium_window && diag.medium_window <= diag.long_window) {
            return Err(config_error(
                "trend windows must satisfy short <= medium <= long",
            ));
        }
        if diag.short_window < 2 {
            return Err(config_error("short_window must be at least 2"));
        }
        check_fraction("short_min_move", diag.short_min_move)?;
        check_fraction("medium_min_move", diag.medium_min_move)?;
        check_fraction("long_min_move", diag.long_min_move)?;
        check_fraction("pattern_quality_floor", diag.pattern_quality_floor)?;

        if self.technical.direction_threshold <= 0 || self.technical.direction_threshold > 3 {
            return Err(config_error("direction_threshold must be within 1..=3"));
        }

        let fund = &self.fundamental;
        check_positive("baseline_pe", fund.baseline_pe)?;
        check_positive("baseline_pb", fund.baseline_pb)?;
        check_positive("growth_scale", fund.growth_scale)?;
        check_positive("baseline_roe", fund.baseline_roe)?;
        check_fraction("max_debt_ratio", fund.max_debt_ratio)?;
        check_positive("max_debt_ratio", fund.max_debt_ratio)?;
        check_fraction("valuation_margin", fund.valuation_margin)?;
        if !fund.baseline_growth.is_finite() {
            return Err(config_error("baseline_growth must be finite"));
        }
        check_weights(
            "fundamental",
            &[fund.weights.valuation, fund.weights.growth, fund.weights.quality],
        )?;

        let sent = &self.sentiment;
        check_positive("half_life_hours", sent.half_life_hours)?;
        check_fraction("polarity_threshold", sent.polarity_threshold)?;
        check_fraction("low_volume_cap", sent.low_volume_cap)?;
        check_period("full_strength_items", sent.full_strength_items)?;

        let debate = &self.debate;
        check_weights(
            "source",
            &[
                debate.weights.technical,
                debate.weights.fundamental,
                debate.weights.sentiment,
            ],
        )?;
        if !(0.0..debate.weights.total()).contains(&debate.neutral_zone) {
            return Err(config_error(format!(
                "neutral_zone must be within [0, {}), got {}",
                debate.weights.total(),
                debate.neutral_zone
            )));
        }

        let decision = &self.decision;
        check_positive("take_profit", decision.take_profit)?;
        if !(decision.stop_loss > 0.0 && decision.stop_loss < 1.0) {
            return Err(config_error(format!(
                "stop_loss must be within (0, 1), got {}",
                decision.stop_loss
            )));
        }
        check_fraction("min_confidence", decision.min_confidence)?;

        let outlook = &self.outlook;
        check_fraction("high_range", outlook.high_range)?;
        check_fraction("low_range", outlook.low_range)?;
        if outlook.low_range >= outlook.high_range {
            return Err(config_error("low_range must be below high_range"));
        }
        if !(-1.0..=1.0).contains(&outlook.weak_quality)
            || !(-1.0..=1.0).contains(&outlook.strong_quality)
            || outlook.weak_quality > outlook.strong_quality
        {
            return Err(config_error(
                "quality thresholds must satisfy -1 <= weak <= strong <= 1",
            ));
        }

        Ok(())
    }
}

/// Builder for PipelineConfig
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    lookback_sessions: Option<usize>,
    sentiment_lookback_days: Option<u32>,
    agent_timeout: Option<Duration>,
    indicators: Option<IndicatorConfig>,
    scoring: Option<ScoringWeights>,
    diagnosis: Option<DiagnosisConfig>,
    technical: Option<TechnicalConfig>,
    fundamental: Option<FundamentalConfig>,
    sentiment: Option<SentimentConfig>,
    outlook: Option<OutlookConfig>,
    source_weights: Option<SourceWeights>,
    neutral_zone: Option<f64>,
    take_profit: Option<f64>,
    stop_loss: Option<f64>,
    min_confidence: Option<f64>,
}

impl PipelineConfigBuilder {
    /// Set the number of price sessions requested
    pub fn lookback_sessions(mut self, sessions: usize) -> Self {
        self.lookback_sessions = Some(sessions);
        self
    }

    /// Set the sentiment lookback in days
    pub fn sentiment_lookback_days(mut self, days: u32) -> Self {
        self.sentiment_lookback_days = Some(days);
        self
    }

    /// Set the per-branch timeout
    pub fn agent_timeout(mut self, timeout: Duration) -> Self {
        self.agent_timeout = Some(timeout);
        self
    }

    pub fn indicators(mut self, indicators: IndicatorConfig) -> Self {
        self.indicators = Some(indicators);
        self
    }

    pub fn scoring(mut self, scoring: ScoringWeights) -> Self {
        self.scoring = Some(scoring);
        self
    }

    pub fn diagnosis(mut self, diagnosis: DiagnosisConfig) -> Self {
        self.diagnosis = Some(diagnosis);
        self
    }

    pub fn technical(mut self, technical: TechnicalConfig) -> Self {
        self.technical = Some(technical);
        self
    }

    pub fn fundamental(mut self, fundamental: FundamentalConfig) -> Self {
        self.fundamental = Some(fundamental);
        self
    }

    pub fn sentiment(mut self, sentiment: SentimentConfig) -> Self {
        self.sentiment = Some(sentiment);
        self
    }

    pub fn outlook(mut self, outlook: OutlookConfig) -> Self {
        self.outlook = Some(outlook);
        self
    }

    /// Set the per-source vote weights
    pub fn source_weights(mut self, technical: f64, fundamental: f64, sentiment: f64) -> Self {
        self.source_weights = Some(SourceWeights {
            technical,
            fundamental,
            sentiment,
        });
        self
    }

    /// Set the neutral-zone threshold of the debate
    pub fn neutral_zone(mut self, tau: f64) -> Self {
        self.neutral_zone = Some(tau);
        self
    }

    /// Set the take-profit fraction
    pub fn take_profit(mut self, fraction: f64) -> Self {
        self.take_profit = Some(fraction);
        self
    }

    /// Set the stop-loss fraction
    pub fn stop_loss(mut self, fraction: f64) -> Self {
        self.stop_loss = Some(fraction);
        self
    }

    /// Set the confidence required to act
    pub fn min_confidence(mut self, confidence: f64) -> Self {
        self.min_confidence = Some(confidence);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<PipelineConfig> {
        let defaults = PipelineConfig::default();

        let config = PipelineConfig {
            lookback_sessions: self.lookback_sessions.unwrap_or(defaults.lookback_sessions),
            sentiment_lookback_days: self
                .sentiment_lookback_days
                .unwrap_or(defaults.sentiment_lookback_days),
            agent_timeout: self.agent_timeout.unwrap_or(defaults.agent_timeout),
            indicators: self.indicators.unwrap_or(defaults.indicators),
            scoring: self.scoring.unwrap_or(defaults.scoring),
            diagnosis: self.diagnosis.unwrap_or(defaults.diagnosis),
            technical: self.technical.unwrap_or(defaults.technical),
            fundamental: self.fundamental.unwrap_or(defaults.fundamental),
            sentiment: self.sentiment.unwrap_or(defaults.sentiment),
            debate: DebateConfig {
                weights: self.source_weights.unwrap_or(defaults.debate.weights),
                neutral_zone: self.neutral_zone.unwrap_or(defaults.debate.neutral_zone),
            },
            decision: DecisionConfig {
                take_profit: self.take_profit.unwrap_or(defaults.decision.take_profit),
                stop_loss: self.stop_loss.unwrap_or(defaults.decision.stop_loss),
                min_confidence: self
                    .min_confidence
                    .unwrap_or(defaults.decision.min_confidence),
            },
            outlook: self.outlook.unwrap_or(defaults.outlook),
        };

        config.validate()?;
        Ok(config)
    }
}
