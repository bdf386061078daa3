//! Technical indicator calculations over a price snapshot
//!
//! All oscillators are reported on a 0-100 scale. An indicator whose minimum
//! lookback is not met, or whose value is not finite, is left as `None`.

use concord_core::{PriceBar, PriceSnapshot};
use serde::{Deserialize, Serialize};
use ta::{
    DataItem, Next,
    indicators::{
        AverageTrueRange, BollingerBands, MoneyFlowIndex, MovingAverageConvergenceDivergence,
        RelativeStrengthIndex, SimpleMovingAverage, SlowStochastic,
    },
};

use crate::config::IndicatorConfig;

/// State of the fast moving average relative to the slow one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaCrossover {
    /// Fast crossed above slow on the last session
    GoldenCross,
    /// Fast crossed below slow on the last session
    DeathCross,
    FastAbove,
    FastBelow,
}

/// Relation between the last session's move and its volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumePriceRelation {
    HeavyVolumeRally,
    HeavyVolumeDecline,
    LightVolumeRally,
    LightVolumePullback,
    Normal,
}

impl VolumePriceRelation {
    /// Classify a session from its change (percent) and volume ratio
    pub fn classify(change_pct: f64, volume_ratio: f64, config: &IndicatorConfig) -> Self {
        let threshold = config.price_move_threshold * 100.0;
        let heavy = volume_ratio >= config.heavy_volume_ratio;
        let light = volume_ratio <= config.light_volume_ratio;
        match (change_pct >= threshold, change_pct <= -threshold) {
            (true, _) if heavy => Self::HeavyVolumeRally,
            (true, _) if light => Self::LightVolumeRally,
            (_, true) if heavy => Self::HeavyVolumeDecline,
            (_, true) if light => Self::LightVolumePullback,
            _ => Self::Normal,
        }
    }

    /// Bullishness of the relation in [0, 1]
    pub fn score(self) -> f64 {
        match self {
            Self::HeavyVolumeRally => 0.90,
            Self::LightVolumePullback => 0.80,
            Self::LightVolumeRally => 0.60,
            Self::Normal => 0.50,
            Self::HeavyVolumeDecline => 0.15,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::HeavyVolumeRally => "heavy-volume rally",
            Self::HeavyVolumeDecline => "heavy-volume decline",
            Self::LightVolumeRally => "light-volume rally",
            Self::LightVolumePullback => "light-volume pullback",
            Self::Normal => "normal volume-price action",
        }
    }
}

/// Scalar indicator values for the last session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSet {
    /// Relative strength index, 0-100
    pub rsi: Option<f64>,
    /// MACD line as an oscillator, 0-100 (50 = no divergence)
    pub macd: Option<f64>,
    /// Bollinger %B, 0-100
    pub percent_b: Option<f64>,
    /// Slow stochastic %K, 0-100
    pub stochastic_k: Option<f64>,
    /// Money flow index, 0-100
    pub money_flow: Option<f64>,
    pub ma_crossover: Option<MaCrossover>,
    /// Average true range as a percentage of the close
    pub volatility_pct: Option<f64>,
    /// Last volume over the mean of the preceding sessions
    pub volume_ratio: Option<f64>,
    /// Last session change in percent
    pub change_pct: Option<f64>,
    pub volume_price: Option<VolumePriceRelation>,
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

fn to_items(bars: &[PriceBar]) -> Option<Vec<DataItem>> {
    bars.iter()
        .map(|b| {
            DataItem::builder()
                .open(b.open)
                .high(b.high)
                .low(b.low)
                .close(b.close)
                .volume(b.volume as f64)
                .build()
                .ok()
        })
        .collect()
}

/// Simple moving average series aligned with `closes`
///
/// Entries before the first full window are `None`.
pub fn sma_series(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let Ok(mut sma) = SimpleMovingAverage::new(period) else {
        return vec![None; closes.len()];
    };
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            let value = sma.next(c);
            if i + 1 >= period { finite(value) } else { None }
        })
        .collect()
}

fn last_of<I: Next<f64, Output = f64>>(mut indicator: I, closes: &[f64]) -> f64 {
    closes.iter().fold(f64::NAN, |_, &c| indicator.next(c))
}

fn rsi(closes: &[f64], config: &IndicatorConfig) -> Option<f64> {
    if closes.len() <= config.rsi_period {
        return None;
    }
    let indicator = RelativeStrengthIndex::new(config.rsi_period).ok()?;
    finite(last_of(indicator, closes)).map(|v| v.clamp(0.0, 100.0))
}

fn macd(closes: &[f64], config: &IndicatorConfig) -> Option<f64> {
    if closes.len() < config.macd_slow + config.macd_signal {
        return None;
    }
    let mut indicator = MovingAverageConvergenceDivergence::new(
        config.macd_fast,
        config.macd_slow,
        config.macd_signal,
    )
    .ok()?;
    let mut line = f64::NAN;
    for &c in closes {
        line = indicator.next(c).macd;
    }
    let close = *closes.last()?;
    let pct = line / close * 100.0;
    finite(50.0 + 50.0 * (pct / 2.0).tanh())
}

fn percent_b(closes: &[f64], config: &IndicatorConfig) -> Option<f64> {
    if closes.len() < config.bollinger_period {
        return None;
    }
    let mut bands = BollingerBands::new(config.bollinger_period, config.bollinger_multiplier).ok()?;
    let mut last = None;
    for &c in closes {
        last = Some(bands.next(c));
    }
    let out = last?;
    let width = out.upper - out.lower;
    if width <= f64::EPSILON {
        return None;
    }
    let close = *closes.last()?;
    finite((close - out.lower) / width * 100.0).map(|v| v.clamp(0.0, 100.0))
}

fn stochastic(items: &[DataItem], config: &IndicatorConfig) -> Option<f64> {
    if items.len() < config.stochastic_period + config.stochastic_smoothing - 1 {
        return None;
    }
    let mut indicator =
        SlowStochastic::new(config.stochastic_period, config.stochastic_smoothing).ok()?;
    let value = items.iter().fold(f64::NAN, |_, item| indicator.next(item));
    finite(value).map(|v| v.clamp(0.0, 100.0))
}

fn money_flow(items: &[DataItem], config: &IndicatorConfig) -> Option<f64> {
    if items.len() <= config.money_flow_period {
        return None;
    }
    let mut indicator = MoneyFlowIndex::new(config.money_flow_period).ok()?;
    let value = items.iter().fold(f64::NAN, |_, item| indicator.next(item));
    finite(value).map(|v| v.clamp(0.0, 100.0))
}

fn volatility_pct(items: &[DataItem], closes: &[f64], config: &IndicatorConfig) -> Option<f64> {
    if items.len() <= config.atr_period {
        return None;
    }
    let mut indicator = AverageTrueRange::new(config.atr_period).ok()?;
    let atr = items.iter().fold(f64::NAN, |_, item| indicator.next(item));
    let close = *closes.last()?;
    finite(atr / close * 100.0).map(|v| v.max(0.0))
}

fn ma_crossover(closes: &[f64], config: &IndicatorConfig) -> Option<MaCrossover> {
    if closes.len() <= config.slow_ma {
        return None;
    }
    let fast = sma_series(closes, config.fast_ma);
    let slow = sma_series(closes, config.slow_ma);
    let n = closes.len();
    let (fast_now, slow_now) = (fast[n - 1]?, slow[n - 1]?);
    let (fast_prev, slow_prev) = (fast[n - 2]?, slow[n - 2]?);
    let state = if fast_prev <= slow_prev && fast_now > slow_now {
        MaCrossover::GoldenCross
    } else if fast_prev >= slow_prev && fast_now < slow_now {
        MaCrossover::DeathCross
    } else if fast_now > slow_now {
        MaCrossover::FastAbove
    } else {
        MaCrossover::FastBelow
    };
    Some(state)
}

fn volume_ratio(bars: &[PriceBar], config: &IndicatorConfig) -> Option<f64> {
    if bars.len() < config.volume_window {
        return None;
    }
    let (last, window) = bars[bars.len() - config.volume_window..].split_last()?;
    let mean = window.iter().map(|b| b.volume as f64).sum::<f64>() / window.len() as f64;
    if mean <= 0.0 {
        return None;
    }
    finite(last.volume as f64 / mean)
}

fn change_pct(closes: &[f64]) -> Option<f64> {
    match closes {
        [.., prev, last] => finite((last - prev) / prev * 100.0),
        _ => None,
    }
}

/// Compute every indicator the snapshot is long enough for
pub fn compute(snapshot: &PriceSnapshot, config: &IndicatorConfig) -> IndicatorSet {
    let bars = snapshot.bars();
    let closes = snapshot.closes();
    let items = to_items(bars).unwrap_or_default();

    let volume_ratio = volume_ratio(bars, config);
    let change_pct = change_pct(&closes);
    let volume_price = volume_ratio
        .zip(change_pct)
        .map(|(ratio, change)| VolumePriceRelation::classify(change, ratio, config));

    IndicatorSet {
        rsi: rsi(&closes, config),
        macd: macd(&closes, config),
        percent_b: percent_b(&closes, config),
        stochastic_k: stochastic(&items, config),
        money_flow: money_flow(&items, config),
        ma_crossover: ma_crossover(&closes, config),
        volatility_pct: volatility_pct(&items, &closes, config),
        volume_ratio,
        change_pct,
        volume_price,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{snapshot_from_closes, trending_closes, with_last_volume};

    fn in_range(value: Option<f64>) -> bool {
        value.is_some_and(|v| (0.0..=100.0).contains(&v))
    }

    #[test]
    fn test_oscillators_within_range() {
        let config = IndicatorConfig::default();
        for drift in [-0.01, -0.002, 0.0, 0.002, 0.01] {
            let snapshot = snapshot_from_closes(&trending_closes(120, 100.0, drift));
            let set = compute(&snapshot, &config);
            assert!(in_range(set.rsi), "rsi {:?}", set.rsi);
            assert!(in_range(set.macd), "macd {:?}", set.macd);
            assert!(in_range(set.stochastic_k), "stoch {:?}", set.stochastic_k);
            assert!(in_range(set.money_flow), "mfi {:?}", set.money_flow);
            assert!(set.volatility_pct.is_some_and(|v| v >= 0.0));
            assert!(set.ma_crossover.is_some());
            if let Some(b) = set.percent_b {
                assert!((0.0..=100.0).contains(&b));
            }
        }
    }

    #[test]
    fn test_short_history_omits_indicators() {
        let config = IndicatorConfig::default();
        let snapshot = snapshot_from_closes(&trending_closes(8, 50.0, 0.01));
        let set = compute(&snapshot, &config);
        assert!(set.rsi.is_none());
        assert!(set.macd.is_none());
        assert!(set.percent_b.is_none());
        assert!(set.money_flow.is_none());
        assert!(set.ma_crossover.is_none());
        assert!(set.volume_ratio.is_none());
        assert!(set.change_pct.is_some());
    }

    #[test]
    fn test_empty_snapshot_yields_nothing() {
        let snapshot = snapshot_from_closes(&[]);
        let set = compute(&snapshot, &IndicatorConfig::default());
        assert_eq!(set, IndicatorSet::default());
    }

    #[test]
    fn test_uptrend_reads_bullish_momentum() {
        let config = IndicatorConfig::default();
        let snapshot = snapshot_from_closes(&trending_closes(120, 100.0, 0.01));
        let set = compute(&snapshot, &config);
        assert!(set.macd.unwrap() > 50.0);
        assert!(set.rsi.unwrap() > 50.0);
        assert_eq!(set.ma_crossover, Some(MaCrossover::FastAbove));
    }

    #[test]
    fn test_golden_cross_detected_on_reversal() {
        let mut closes = trending_closes(40, 100.0, -0.01);
        let mut last = *closes.last().unwrap();
        for _ in 0..6 {
            last *= 1.03;
            closes.push(last);
        }
        let config = IndicatorConfig::default();
        let fast = sma_series(&closes, config.fast_ma);
        let slow = sma_series(&closes, config.slow_ma);
        let crossed_at = (1..closes.len())
            .find(|&i| {
                matches!((fast[i - 1], slow[i - 1], fast[i], slow[i]),
                    (Some(fp), Some(sp), Some(f), Some(s)) if fp <= sp && f > s)
            })
            .unwrap();

        let snapshot = snapshot_from_closes(&closes[..=crossed_at]);
        let set = compute(&snapshot, &config);
        assert_eq!(set.ma_crossover, Some(MaCrossover::GoldenCross));
    }

    #[test]
    fn test_volume_price_classification() {
        let config = IndicatorConfig::default();
        assert_eq!(
            VolumePriceRelation::classify(3.0, 2.0, &config),
            VolumePriceRelation::HeavyVolumeRally
        );
        assert_eq!(
            VolumePriceRelation::classify(-3.0, 2.0, &config),
            VolumePriceRelation::HeavyVolumeDecline
        );
        assert_eq!(
            VolumePriceRelation::classify(2.5, 0.5, &config),
            VolumePriceRelation::LightVolumeRally
        );
        assert_eq!(
            VolumePriceRelation::classify(-2.5, 0.5, &config),
            VolumePriceRelation::LightVolumePullback
        );
        assert_eq!(
            VolumePriceRelation::classify(0.5, 3.0, &config),
            VolumePriceRelation::Normal
        );
    }

    #[test]
    fn test_volume_ratio_uses_preceding_sessions() {
        let closes = trending_closes(30, 20.0, 0.0);
        let snapshot = with_last_volume(snapshot_from_closes(&closes), 3_000_000);
        let set = compute(&snapshot, &IndicatorConfig::default());
        assert!((set.volume_ratio.unwrap() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_sma_series_alignment() {
        let series = sma_series(&[1.0, 2.0, 3.0, 4.0], 2);
        assert_eq!(series, vec![None, Some(1.5), Some(2.5), Some(3.5)]);
    }
}
