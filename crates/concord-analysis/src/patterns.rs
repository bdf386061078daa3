//! Candlestick and price-action pattern recognition
//!
//! Each detector looks at the tail of the snapshot and emits zero or one
//! label. Quality starts from a per-kind base value and is adjusted by how
//! convincing the particular instance is.

use concord_core::{PatternKind, PatternLabel, PriceBar, PriceSnapshot};

use crate::config::IndicatorConfig;
use crate::indicators::{IndicatorSet, MaCrossover, sma_series};

/// Sessions required before any pattern is reported
pub const MIN_BARS: usize = 20;

const HEAD_AND_SHOULDERS_MIN_BARS: usize = 30;
const PATTERN_WINDOW: usize = 20;
const TREND_MOVE: f64 = 0.05;
const FLAT_MOVE: f64 = 0.02;
const WEDGE_MOVE: f64 = 0.03;
const WEDGE_CONVERGENCE: f64 = 1.5;
const SHOULDER_TOLERANCE: f64 = 0.05;
const DOUBLE_TOLERANCE: f64 = 0.03;
const DOUBLE_RETRACE: f64 = 0.05;
const BASE_RANGE: f64 = 0.05;
const FLAG_RANGE: f64 = 0.05;
const HEAVY_VOLUME_BOOST: f64 = 0.15;

/// Quality assigned to a pattern before instance-specific adjustment
pub fn base_quality(kind: PatternKind) -> f64 {
    match kind {
        PatternKind::HeadAndShouldersTop | PatternKind::HeadAndShouldersBottom => 0.85,
        PatternKind::DoubleTop | PatternKind::DoubleBottom => 0.80,
        PatternKind::AscendingTriangle
        | PatternKind::DescendingTriangle
        | PatternKind::BullFlag
        | PatternKind::BearFlag => 0.75,
        PatternKind::SymmetricTriangle | PatternKind::BaseBuilding => 0.70,
        PatternKind::BullishEngulfing
        | PatternKind::BearishEngulfing
        | PatternKind::RisingWedge
        | PatternKind::FallingWedge => 0.65,
        PatternKind::UptrendContinuation | PatternKind::DowntrendContinuation => 0.60,
        PatternKind::GoldenCross | PatternKind::DeathCross => 0.55,
    }
}

fn label(kind: PatternKind) -> PatternLabel {
    PatternLabel::new(kind, base_quality(kind))
}

#[derive(Debug, Clone, Copy)]
struct Pivot {
    index: usize,
    price: f64,
}

/// Strict local extremes that dominate `span` sessions on each side
fn pivots(values: &[f64], span: usize, margin: usize, highs: bool) -> Vec<Pivot> {
    if values.len() < 2 * margin + 1 {
        return Vec::new();
    }
    (margin..values.len() - margin)
        .filter(|&i| {
            (1..=span).all(|k| {
                let (left, right) = (values[i - k], values[i + k]);
                if highs {
                    values[i] > left && values[i] > right
                } else {
                    values[i] < left && values[i] < right
                }
            })
        })
        .map(|index| Pivot {
            index,
            price: values[index],
        })
        .collect()
}

fn relative_change(first: f64, last: f64) -> f64 {
    (last - first) / first
}

fn base_building(bars: &[PriceBar]) -> Option<PatternLabel> {
    let recent = &bars[bars.len().saturating_sub(10)..];
    let lows: Vec<f64> = recent.iter().map(|b| b.low).collect();
    let max = lows.iter().copied().fold(f64::MIN, f64::max);
    let min = lows.iter().copied().fold(f64::MAX, f64::min);
    let avg = lows.iter().sum::<f64>() / lows.len() as f64;
    let tightness = (max - min) / (BASE_RANGE * avg);
    (tightness < 1.0).then(|| {
        PatternLabel::new(
            PatternKind::BaseBuilding,
            base_quality(PatternKind::BaseBuilding) + 0.2 * (1.0 - tightness),
        )
    })
}

fn moving_average_alignment(closes: &[f64], config: &IndicatorConfig) -> Option<PatternLabel> {
    let last = |period| sma_series(closes, period).last().copied().flatten();
    let (fast, slow, trend) = (
        last(config.fast_ma)?,
        last(config.slow_ma)?,
        last(config.trend_ma)?,
    );
    if fast > slow && slow > trend {
        Some(label(PatternKind::UptrendContinuation))
    } else if fast < slow && slow < trend {
        Some(label(PatternKind::DowntrendContinuation))
    } else {
        None
    }
}

fn engulfing(
    bars: &[PriceBar],
    indicators: &IndicatorSet,
    config: &IndicatorConfig,
) -> Option<PatternLabel> {
    let [.., prev, last] = bars else {
        return None;
    };
    let kind = if last.close > prev.open
        && last.open < prev.close
        && last.close > prev.close
        && last.open < prev.open
    {
        PatternKind::BullishEngulfing
    } else if last.close < prev.open
        && last.open > prev.close
        && last.close < prev.close
        && last.open > prev.open
    {
        PatternKind::BearishEngulfing
    } else {
        return None;
    };
    let heavy = indicators
        .volume_ratio
        .is_some_and(|r| r >= config.heavy_volume_ratio);
    let boost = if heavy { HEAVY_VOLUME_BOOST } else { 0.0 };
    Some(PatternLabel::new(kind, base_quality(kind) + boost))
}

fn crossover(indicators: &IndicatorSet) -> Option<PatternLabel> {
    match indicators.ma_crossover? {
        MaCrossover::GoldenCross => Some(label(PatternKind::GoldenCross)),
        MaCrossover::DeathCross => Some(label(PatternKind::DeathCross)),
        MaCrossover::FastAbove | MaCrossover::FastBelow => None,
    }
}

fn head_and_shoulders(bars: &[PriceBar]) -> Vec<PatternLabel> {
    let mut found = Vec::new();
    if bars.len() < HEAD_AND_SHOULDERS_MIN_BARS {
        return found;
    }
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();

    if let [.., left, head, right] = pivots(&highs, 2, 2, true)[..] {
        if left.price < head.price
            && head.price > right.price
            && (left.price - right.price).abs() / left.price < SHOULDER_TOLERANCE
        {
            found.push(label(PatternKind::HeadAndShouldersTop));
        }
    }
    if let [.., left, head, right] = pivots(&lows, 2, 2, false)[..] {
        if left.price > head.price
            && head.price < right.price
            && (left.price - right.price).abs() / left.price < SHOULDER_TOLERANCE
        {
            found.push(label(PatternKind::HeadAndShouldersBottom));
        }
    }
    found
}

fn double_top_bottom(bars: &[PriceBar]) -> Vec<PatternLabel> {
    let mut found = Vec::new();
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();

    if let [.., first, second] = pivots(&highs, 2, 5, true)[..] {
        let trough = bars[first.index..second.index]
            .iter()
            .map(|b| b.low)
            .fold(f64::MAX, f64::min);
        if (first.price - second.price).abs() / first.price < DOUBLE_TOLERANCE
            && trough < first.price * (1.0 - DOUBLE_RETRACE)
        {
            found.push(label(PatternKind::DoubleTop));
        }
    }
    if let [.., first, second] = pivots(&lows, 2, 5, false)[..] {
        let peak = bars[first.index..second.index]
            .iter()
            .map(|b| b.high)
            .fold(f64::MIN, f64::max);
        if (first.price - second.price).abs() / first.price < DOUBLE_TOLERANCE
            && peak > first.price * (1.0 + DOUBLE_RETRACE)
        {
            found.push(label(PatternKind::DoubleBottom));
        }
    }
    found
}

/// Relative change of the highs and lows across the pattern window
fn envelope_trends(window: &[PriceBar]) -> Option<(f64, f64)> {
    let (first, last) = (window.first()?, window.last()?);
    Some((
        relative_change(first.high, last.high),
        relative_change(first.low, last.low),
    ))
}

fn triangle(window: &[PriceBar]) -> Option<PatternLabel> {
    let (high_trend, low_trend) = envelope_trends(window)?;
    if low_trend > TREND_MOVE && high_trend.abs() < FLAT_MOVE {
        Some(label(PatternKind::AscendingTriangle))
    } else if high_trend < -TREND_MOVE && low_trend.abs() < FLAT_MOVE {
        Some(label(PatternKind::DescendingTriangle))
    } else if high_trend < -TREND_MOVE && low_trend > TREND_MOVE {
        Some(label(PatternKind::SymmetricTriangle))
    } else {
        None
    }
}

fn flag(window: &[PriceBar]) -> Option<PatternLabel> {
    let (pole, flag) = window.split_at(window.len() / 2);
    let (pole_start, pole_end) = (pole.first()?.close, pole.last()?.close);
    let pole_trend = relative_change(pole_start, pole_end);
    let high = flag.iter().map(|b| b.high).fold(f64::MIN, f64::max);
    let low = flag.iter().map(|b| b.low).fold(f64::MAX, f64::min);
    let tight = high - low < pole_end * FLAG_RANGE;
    let flag_close = flag.last()?.close;

    if pole_trend > TREND_MOVE && flag_close < pole_end && tight {
        Some(label(PatternKind::BullFlag))
    } else if pole_trend < -TREND_MOVE && flag_close > pole_end && tight {
        Some(label(PatternKind::BearFlag))
    } else {
        None
    }
}

/// Converging channels sloping the same way
///
/// A rising wedge has lows climbing faster than highs; a falling wedge has
/// highs dropping faster than lows.
fn wedge(window: &[PriceBar]) -> Option<PatternLabel> {
    let (high_trend, low_trend) = envelope_trends(window)?;
    if high_trend > WEDGE_MOVE && low_trend > WEDGE_CONVERGENCE * high_trend {
        Some(label(PatternKind::RisingWedge))
    } else if low_trend < -WEDGE_MOVE && high_trend < WEDGE_CONVERGENCE * low_trend {
        Some(label(PatternKind::FallingWedge))
    } else {
        None
    }
}

/// Detect every pattern present at the end of the snapshot
pub fn detect(
    snapshot: &PriceSnapshot,
    indicators: &IndicatorSet,
    config: &IndicatorConfig,
) -> Vec<PatternLabel> {
    let bars = snapshot.bars();
    if bars.len() < MIN_BARS.max(config.trend_ma) {
        return Vec::new();
    }
    let closes = snapshot.closes();
    let window = &bars[bars.len() - PATTERN_WINDOW..];

    let mut labels: Vec<PatternLabel> = [
        base_building(bars),
        moving_average_alignment(&closes, config),
        engulfing(bars, indicators, config),
        crossover(indicators),
    ]
    .into_iter()
    .flatten()
    .collect();
    labels.extend(head_and_shoulders(bars));
    labels.extend(double_top_bottom(bars));
    labels.extend([triangle(window), flag(window), wedge(window)].into_iter().flatten());

    tracing::debug!(count = labels.len(), "patterns detected");
    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators;
    use crate::test_support::{
        SYMBOL, bar, downtrend_snapshot, snapshot_from_closes, trending_closes, uptrend_snapshot,
    };

    fn kinds(snapshot: &PriceSnapshot) -> Vec<PatternKind> {
        let config = IndicatorConfig::default();
        let set = indicators::compute(snapshot, &config);
        detect(snapshot, &set, &config)
            .into_iter()
            .map(|l| l.kind)
            .collect()
    }

    fn snapshot_from_bars(bars: Vec<PriceBar>) -> PriceSnapshot {
        PriceSnapshot::new(SYMBOL, bars).unwrap()
    }

    #[test]
    fn test_short_snapshot_has_no_patterns() {
        let snapshot = snapshot_from_closes(&trending_closes(12, 10.0, 0.01));
        assert!(kinds(&snapshot).is_empty());
    }

    #[test]
    fn test_uptrend_fixture_patterns() {
        let snapshot = uptrend_snapshot();
        let config = IndicatorConfig::default();
        let set = indicators::compute(&snapshot, &config);
        let labels = detect(&snapshot, &set, &config);
        let found: Vec<_> = labels.iter().map(|l| l.kind).collect();

        assert!(found.contains(&PatternKind::BullishEngulfing));
        assert!(found.contains(&PatternKind::UptrendContinuation));
        assert!(found.iter().all(|k| k.bias() != concord_core::Direction::Bearish));

        let engulfing = labels
            .iter()
            .find(|l| l.kind == PatternKind::BullishEngulfing)
            .unwrap();
        assert!((engulfing.quality - 0.80).abs() < 1e-9);
    }

    #[test]
    fn test_downtrend_fixture_patterns() {
        let found = kinds(&downtrend_snapshot());
        assert!(found.contains(&PatternKind::BearishEngulfing));
        assert!(found.contains(&PatternKind::DowntrendContinuation));
    }

    #[test]
    fn test_quality_within_unit_interval() {
        for snapshot in [uptrend_snapshot(), downtrend_snapshot()] {
            let config = IndicatorConfig::default();
            let set = indicators::compute(&snapshot, &config);
            for label in detect(&snapshot, &set, &config) {
                assert!((0.0..=1.0).contains(&label.quality));
            }
        }
    }

    #[test]
    fn test_base_building_on_tight_range() {
        let closes: Vec<f64> = (0..40).map(|i| 50.0 + 0.2 * f64::from(i % 3)).collect();
        let found = kinds(&snapshot_from_closes(&closes));
        assert!(found.contains(&PatternKind::BaseBuilding));
    }

    #[test]
    fn test_double_bottom() {
        // Decline into 80, bounce to 90, retest 80, recover
        let mut closes = Vec::new();
        closes.extend((0..10).map(|i| 100.0 - 2.0 * f64::from(i)));
        closes.extend((0..6).map(|i| 80.0 + 2.0 * f64::from(i)));
        closes.extend((0..5).map(|i| 88.0 - 2.0 * f64::from(i)));
        closes.extend((0..10).map(|i| 82.0 + 1.5 * f64::from(i)));
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let mut b = bar(i, c, c, 1_000_000);
                b.high = c * 1.01;
                b.low = c * 0.99;
                b
            })
            .collect();
        let found = kinds(&snapshot_from_bars(bars));
        assert!(found.contains(&PatternKind::DoubleBottom), "{found:?}");
        assert!(!found.contains(&PatternKind::DoubleTop));
    }

    #[test]
    fn test_rising_wedge_is_bearish() {
        // Lows climb about 20% while highs climb about 6% over the window
        let bars: Vec<PriceBar> = (0..30)
            .map(|i| {
                let t = f64::from(i as u32);
                let high = 100.0 * (1.0 + 0.002 * t);
                let low = 80.0 * (1.0 + 0.007 * t);
                let mid = (high + low) / 2.0;
                let mut b = bar(i, mid, mid, 1_000_000);
                b.high = high;
                b.low = low;
                b
            })
            .collect();
        let found = kinds(&snapshot_from_bars(bars));
        assert!(found.contains(&PatternKind::RisingWedge), "{found:?}");
        assert_eq!(
            PatternKind::RisingWedge.bias(),
            concord_core::Direction::Bearish
        );
    }

    #[test]
    fn test_pivots_are_strict() {
        let values = [1.0, 2.0, 3.0, 2.0, 1.0, 3.0, 3.0, 1.0, 0.5];
        let highs = pivots(&values, 2, 2, true);
        assert_eq!(highs.len(), 1);
        assert_eq!(highs[0].index, 2);
    }
}
