//! Candle — the fundamental market data unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLC candle for a single instrument over one granularity period.
///
/// Candle sequences are always ordered by timestamp ascending, and sources
/// are expected to deliver only complete (closed) bars. The sanity invariant
/// (high >= max(open, close), low <= min(open, close)) is assumed by
/// consumers but not enforced on construction; `is_sane` exists for sources
/// that want to filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Candle {
    /// Basic OHLC sanity check.
    pub fn is_sane(&self) -> bool {
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
    }

    /// Candle body size: |close - open|.
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    /// Upper wick: high minus the top of the body.
    pub fn upper_wick(&self) -> f64 {
        self.high - self.close.max(self.open)
    }

    /// Lower wick: bottom of the body minus low.
    pub fn lower_wick(&self) -> f64 {
        self.close.min(self.open) - self.low
    }

    /// True if the candle closed above its open.
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// True if the candle closed below its open.
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }
}
