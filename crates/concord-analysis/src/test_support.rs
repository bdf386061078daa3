//! Deterministic snapshot fixtures shared by the unit tests

use chrono::{Days, NaiveDate, TimeZone, Utc};
use concord_core::{
    FundamentalSnapshot, Metric, PriceBar, PriceSnapshot, SentimentItem, SentimentSnapshot,
};
use std::collections::BTreeMap;

pub(crate) const SYMBOL: &str = "TEST";

fn date(offset: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Days::new(offset as u64)
}

pub(crate) fn bar(offset: usize, open: f64, close: f64, volume: u64) -> PriceBar {
    PriceBar {
        date: date(offset),
        open,
        high: open.max(close) * 1.004,
        low: open.min(close) * 0.996,
        close,
        volume,
    }
}

/// Geometric drift with a small deterministic wiggle
pub(crate) fn trending_closes(n: usize, start: f64, drift: f64) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let i = i as f64;
            start * (1.0 + drift).powf(i) * (1.0 + 0.005 * (i * 1.3).sin())
        })
        .collect()
}

/// Bars opening at the previous close with a constant volume
pub(crate) fn bars_from_closes(closes: &[f64]) -> Vec<PriceBar> {
    let mut prev = closes.first().copied().unwrap_or(1.0);
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let b = bar(i, prev, close, 1_000_000);
            prev = close;
            b
        })
        .collect()
}

pub(crate) fn snapshot_from_closes(closes: &[f64]) -> PriceSnapshot {
    PriceSnapshot::new(SYMBOL, bars_from_closes(closes)).unwrap()
}

pub(crate) fn with_last_volume(snapshot: PriceSnapshot, volume: u64) -> PriceSnapshot {
    let mut bars = snapshot.bars().to_vec();
    if let Some(last) = bars.last_mut() {
        last.volume = volume;
    }
    PriceSnapshot::new(snapshot.symbol(), bars).unwrap()
}

/// Step-cycle trend of 118 sessions followed by an engulfing pair
///
/// With `up` the cycle is +2%, +2%, -1% and the last two sessions form a
/// bullish engulfing on heavy volume; otherwise everything is mirrored.
fn cycle_snapshot(up: bool) -> PriceSnapshot {
    let cycle = if up {
        [1.02, 1.02, 0.99]
    } else {
        [0.98, 0.98, 1.01]
    };
    let mut bars = Vec::with_capacity(120);
    let mut prev = 60.0;
    for (i, step) in cycle.iter().cycle().take(118).enumerate() {
        let close = prev * step;
        let volume = if (close > prev) == up { 1_200_000 } else { 800_000 };
        bars.push(bar(i, prev, close, volume));
        prev = close;
    }
    let p = prev;
    if up {
        bars.push(bar(118, p, 0.99 * p, 800_000));
        bars.push(bar(119, 0.985 * p, 1.02 * p, 2_500_000));
    } else {
        bars.push(bar(118, p, 1.01 * p, 800_000));
        bars.push(bar(119, 1.015 * p, 0.98 * p, 2_500_000));
    }
    PriceSnapshot::new(SYMBOL, bars).unwrap()
}

pub(crate) fn uptrend_snapshot() -> PriceSnapshot {
    cycle_snapshot(true)
}

pub(crate) fn downtrend_snapshot() -> PriceSnapshot {
    cycle_snapshot(false)
}

pub(crate) fn fundamentals(metrics: &[(Metric, f64)]) -> FundamentalSnapshot {
    FundamentalSnapshot::new(SYMBOL, "2024Q2", metrics.iter().copied().collect::<BTreeMap<_, _>>())
        .unwrap()
}

pub(crate) fn undervalued_fundamentals() -> FundamentalSnapshot {
    fundamentals(&[
        (Metric::PeRatio, 6.0),
        (Metric::PbRatio, 0.9),
        (Metric::ReturnOnEquity, 0.30),
        (Metric::RevenueGrowth, 0.25),
        (Metric::ProfitGrowth, 0.30),
        (Metric::DebtRatio, 0.10),
    ])
}

pub(crate) fn overvalued_fundamentals() -> FundamentalSnapshot {
    fundamentals(&[
        (Metric::PeRatio, 45.0),
        (Metric::PbRatio, 7.5),
        (Metric::ReturnOnEquity, 0.04),
        (Metric::RevenueGrowth, -0.12),
        (Metric::ProfitGrowth, -0.30),
        (Metric::DebtRatio, 0.75),
    ])
}

/// One item per hour ending at 2024-05-10 10:00 UTC
pub(crate) fn sentiment(polarities: &[f64]) -> SentimentSnapshot {
    let start = Utc.with_ymd_and_hms(2024, 5, 10, 10, 0, 0).unwrap();
    let n = polarities.len();
    let items = polarities
        .iter()
        .enumerate()
        .map(|(i, &polarity)| SentimentItem {
            timestamp: start - chrono::Duration::hours((n - 1 - i) as i64),
            source: "newswire".to_string(),
            polarity,
            headline: format!("headline {i}"),
        })
        .collect();
    SentimentSnapshot::new(SYMBOL, items).unwrap()
}

pub(crate) fn positive_sentiment() -> SentimentSnapshot {
    sentiment(&[0.95; 10])
}
