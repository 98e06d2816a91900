//! True-range volatility and trailing-stop distance.
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|).
//! The trailing distance is a plain mean of the true ranges over a short
//! lookback, scaled by a multiplier — no Wilder smoothing; the lifecycle
//! wants a quick, current read of the range, not a long-memory average.

use crate::domain::Candle;

/// True range of a candle given the previous close (None for the first bar,
/// where it degrades to high - low).
pub fn true_range(candle: &Candle, prev_close: Option<f64>) -> f64 {
    let hl = candle.high - candle.low;
    match prev_close {
        Some(pc) => hl
            .max((candle.high - pc).abs())
            .max((candle.low - pc).abs()),
        None => hl,
    }
}

/// Trailing-stop distance: mean true range over the last `lookback` candles,
/// times `multiplier`. None on an empty series.
pub fn trail_distance(candles: &[Candle], lookback: usize, multiplier: f64) -> Option<f64> {
    if candles.is_empty() || lookback == 0 {
        return None;
    }
    let start = candles.len().saturating_sub(lookback);
    let window = &candles[start..];

    let mut sum = 0.0;
    for (offset, c) in window.iter().enumerate() {
        let series_index = start + offset;
        let prev_close = if series_index == 0 {
            None
        } else {
            Some(candles[series_index - 1].close)
        };
        sum += true_range(c, prev_close);
    }
    Some(sum / window.len() as f64 * multiplier)
}
