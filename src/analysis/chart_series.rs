//! Chart series derivation
//!
//! Turns raw technical indicator records into the series the charts draw,
//! plus the period-over-period change shown next to the latest close.
//! Rounding here is for display stability only; the source records are
//! never modified.

use crate::constants::{PRICE_DECIMALS, RSI_DECIMALS};
use crate::models::{ChartPoint, ChartSeries, TechnicalIndicatorRecord};

/// Round `value` to `decimals` places (half away from zero)
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

fn round_price(value: f64) -> f64 {
    round_to(value, PRICE_DECIMALS)
}

/// Map indicator records to chart points, one per record, order preserved
///
/// A `None` indicator stays `None` in the output. Empty input gives an empty
/// series.
pub fn to_chart_series(records: &[TechnicalIndicatorRecord]) -> ChartSeries {
    let points = records
        .iter()
        .map(|r| ChartPoint {
            date: r.date,
            close: round_price(r.close),
            sma20: r.sma_20.map(round_price),
            sma50: r.sma_50.map(round_price),
            rsi: r.rsi_14.map(|v| round_to(v, RSI_DECIMALS)),
            volume: r.volume,
        })
        .collect();

    ChartSeries { points }
}

/// Percent change of the last close against the one before it
///
/// Returns `None` when the series has fewer than two points, and also when
/// the previous close is zero so the result is always finite.
pub fn percent_change(series: &ChartSeries) -> Option<f64> {
    let n = series.points.len();
    if n < 2 {
        return None;
    }

    let prev = series.points[n - 2].close;
    let last = series.points[n - 1].close;

    if prev == 0.0 {
        return None;
    }

    Some((last - prev) / prev * 100.0)
}
