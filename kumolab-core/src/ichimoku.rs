//! Ichimoku Kinko Hyo line computation.
//!
//! Windows: Tenkan 9, Kijun 26, Senkou B 52, displacement 26.
//! Tenkan/Kijun are dense series aligned to the candle index (None during
//! warmup). The leading spans and the chikou span are sparse: each entry is
//! keyed by the absolute bar index it is plotted at — spans forward-shifted
//! by the displacement, chikou backward-shifted. Lookups must go through the
//! keyed accessors, never positional alignment.
//!
//! No look-ahead in the dense lines or the spans: the value plotted at bar t
//! derives only from bars <= t - 26 (spans) or <= t (tenkan/kijun). The
//! chikou entry at key t intentionally holds the close from bar t + 26; it
//! exists to compare a *later* close against historical price.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::Candle;

pub const TENKAN_WINDOW: usize = 9;
pub const KIJUN_WINDOW: usize = 26;
pub const SENKOU_B_WINDOW: usize = 52;
/// Forward shift for the leading spans, backward shift for the chikou span.
pub const DISPLACEMENT: usize = 26;

/// Upper and lower boundary of the cloud at one bar index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CloudBounds {
    pub top: f64,
    pub bottom: f64,
}

impl CloudBounds {
    fn from_spans(span_a: f64, span_b: f64) -> Self {
        Self {
            top: span_a.max(span_b),
            bottom: span_a.min(span_b),
        }
    }

    /// True if a price sits inside the cloud (boundaries inclusive).
    pub fn contains(&self, price: f64) -> bool {
        self.bottom <= price && price <= self.top
    }
}

/// The five Ichimoku lines for one candle series.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IchimokuLines {
    /// Conversion line, defined for index >= 8.
    pub tenkan: Vec<Option<f64>>,
    /// Base line, defined for index >= 25.
    pub kijun: Vec<Option<f64>>,
    /// Leading span A, keyed by target bar index (source index + 26).
    pub senkou_a: BTreeMap<usize, f64>,
    /// Leading span B, keyed by target bar index (source index + 26).
    pub senkou_b: BTreeMap<usize, f64>,
    /// Lagging span: close of bar i stored at key i - 26.
    pub chikou: BTreeMap<usize, f64>,
}

impl IchimokuLines {
    /// Length of the candle series these lines were computed from.
    pub fn len(&self) -> usize {
        self.tenkan.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tenkan.is_empty()
    }

    /// Cloud boundaries at a bar index; None unless both spans reach it.
    pub fn cloud_at(&self, index: usize) -> Option<CloudBounds> {
        let a = *self.senkou_a.get(&index)?;
        let b = *self.senkou_b.get(&index)?;
        Some(CloudBounds::from_spans(a, b))
    }

    /// Cloud boundaries at the latest bar index where both spans are defined.
    pub fn latest_cloud(&self) -> Option<(usize, CloudBounds)> {
        // Span B starts later (52-bar warmup), so walk its keys backwards.
        for (&index, &b) in self.senkou_b.iter().rev() {
            if let Some(&a) = self.senkou_a.get(&index) {
                return Some((index, CloudBounds::from_spans(a, b)));
            }
        }
        None
    }

    /// Lagging-span value plotted at a bar index (the close 26 bars later).
    pub fn chikou_at(&self, index: usize) -> Option<f64> {
        self.chikou.get(&index).copied()
    }
}

/// Midpoint of the high/low range over the `window` bars ending at `index`.
fn window_midpoint(candles: &[Candle], index: usize, window: usize) -> f64 {
    let start = index + 1 - window;
    let mut high = f64::MIN;
    let mut low = f64::MAX;
    for c in &candles[start..=index] {
        high = high.max(c.high);
        low = low.min(c.low);
    }
    (high + low) / 2.0
}

/// Compute all five Ichimoku lines for an ordered candle series.
///
/// Pure and total: a short series simply yields fewer defined entries.
pub fn compute_ichimoku(candles: &[Candle]) -> IchimokuLines {
    let n = candles.len();
    let mut lines = IchimokuLines {
        tenkan: vec![None; n],
        kijun: vec![None; n],
        ..Default::default()
    };

    for i in 0..n {
        if i + 1 >= TENKAN_WINDOW {
            lines.tenkan[i] = Some(window_midpoint(candles, i, TENKAN_WINDOW));
        }
        if i + 1 >= KIJUN_WINDOW {
            lines.kijun[i] = Some(window_midpoint(candles, i, KIJUN_WINDOW));
        }
        if i >= DISPLACEMENT {
            lines.chikou.insert(i - DISPLACEMENT, candles[i].close);
        }
    }

    for i in 0..n {
        let target = i + DISPLACEMENT;
        if target >= n {
            // Forward-shifted entries beyond the series are dropped, never stored.
            continue;
        }
        if let (Some(t), Some(k)) = (lines.tenkan[i], lines.kijun[i]) {
            lines.senkou_a.insert(target, (t + k) / 2.0);
        }
        if i + 1 >= SENKOU_B_WINDOW {
            lines
                .senkou_b
                .insert(target, window_midpoint(candles, i, SENKOU_B_WINDOW));
        }
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{assert_approx, make_candles, make_ohlc_candles, DEFAULT_EPSILON};

    fn flat_series(price: f64, n: usize) -> Vec<Candle> {
        make_ohlc_candles(&vec![(price, price, price, price); n])
    }

    #[test]
    fn constant_series_collapses_to_price() {
        let candles = flat_series(1.25, 120);
        let lines = compute_ichimoku(&candles);

        for i in 8..120 {
            assert_approx(lines.tenkan[i].unwrap(), 1.25, DEFAULT_EPSILON);
        }
        for i in 25..120 {
            assert_approx(lines.kijun[i].unwrap(), 1.25, DEFAULT_EPSILON);
        }
        for (_, &v) in &lines.senkou_a {
            assert_approx(v, 1.25, DEFAULT_EPSILON);
        }
        for (_, &v) in &lines.senkou_b {
            assert_approx(v, 1.25, DEFAULT_EPSILON);
        }
        for (_, &v) in &lines.chikou {
            assert_approx(v, 1.25, DEFAULT_EPSILON);
        }
    }

    #[test]
    fn warmup_indices_undefined() {
        let candles = make_candles(&(0..60).map(|i| 1.0 + i as f64 * 0.001).collect::<Vec<_>>());
        let lines = compute_ichimoku(&candles);

        for i in 0..8 {
            assert!(lines.tenkan[i].is_none());
        }
        assert!(lines.tenkan[8].is_some());
        for i in 0..25 {
            assert!(lines.kijun[i].is_none());
        }
        assert!(lines.kijun[25].is_some());
    }

    #[test]
    fn span_targets_never_exceed_series_length() {
        let candles = make_candles(&(0..150).map(|i| 1.0 + (i % 7) as f64 * 0.002).collect::<Vec<_>>());
        let n = candles.len();
        let lines = compute_ichimoku(&candles);

        assert!(lines.senkou_a.keys().all(|&t| t < n));
        assert!(lines.senkou_b.keys().all(|&t| t < n));
    }

    #[test]
    fn span_a_first_target_is_51() {
        // Earliest source index with both tenkan and kijun defined is 25,
        // so the earliest plotted span-A entry lands at 25 + 26 = 51.
        let candles = make_candles(&vec![1.0; 120]);
        let lines = compute_ichimoku(&candles);
        assert_eq!(lines.senkou_a.keys().next(), Some(&51));
        // Span B needs 52 source bars: earliest target is 51 + 26 = 77.
        assert_eq!(lines.senkou_b.keys().next(), Some(&77));
    }

    #[test]
    fn chikou_maps_close_backward() {
        let closes: Vec<f64> = (0..80).map(|i| 1.0 + i as f64 * 0.01).collect();
        let candles = make_candles(&closes);
        let lines = compute_ichimoku(&candles);

        // chikou[i - 26] = close[i]
        for i in 26..80 {
            assert_approx(
                lines.chikou_at(i - 26).unwrap(),
                closes[i],
                DEFAULT_EPSILON,
            );
        }
        assert!(lines.chikou_at(80 - 26).is_none());
    }

    #[test]
    fn short_series_yields_sparse_lines() {
        let candles = make_candles(&vec![1.0; 10]);
        let lines = compute_ichimoku(&candles);
        assert_eq!(lines.len(), 10);
        assert!(lines.senkou_a.is_empty());
        assert!(lines.senkou_b.is_empty());
        assert!(lines.chikou.is_empty());
        assert!(lines.latest_cloud().is_none());
        assert!(lines.tenkan[9].is_some());
    }

    #[test]
    fn empty_series_is_empty() {
        let lines = compute_ichimoku(&[]);
        assert!(lines.is_empty());
        assert!(lines.cloud_at(0).is_none());
    }

    #[test]
    fn cloud_bounds_order_spans() {
        let mut lines = IchimokuLines {
            tenkan: vec![None; 100],
            kijun: vec![None; 100],
            ..Default::default()
        };
        lines.senkou_a.insert(90, 1.10);
        lines.senkou_b.insert(90, 1.12);

        let cloud = lines.cloud_at(90).unwrap();
        assert_eq!(cloud.top, 1.12);
        assert_eq!(cloud.bottom, 1.10);
        assert!(cloud.contains(1.11));
        assert!(!cloud.contains(1.13));
    }

    #[test]
    fn latest_cloud_uses_highest_common_index() {
        let candles = make_candles(&vec![1.0; 120]);
        let lines = compute_ichimoku(&candles);
        let (index, _) = lines.latest_cloud().unwrap();
        assert_eq!(index, 119);
    }

    #[test]
    fn no_lookahead_in_leading_lines() {
        let closes: Vec<f64> = (0..160).map(|i| 1.0 + (i as f64 * 0.37).sin() * 0.01).collect();
        let candles = make_candles(&closes);
        let full = compute_ichimoku(&candles);
        let prefix = compute_ichimoku(&candles[..100]);

        for i in 0..100 {
            assert_eq!(full.tenkan[i], prefix.tenkan[i]);
            assert_eq!(full.kijun[i], prefix.kijun[i]);
        }
        for (&t, &v) in &prefix.senkou_a {
            assert_approx(full.senkou_a[&t], v, DEFAULT_EPSILON);
        }
        for (&t, &v) in &prefix.senkou_b {
            assert_approx(full.senkou_b[&t], v, DEFAULT_EPSILON);
        }
    }
}
