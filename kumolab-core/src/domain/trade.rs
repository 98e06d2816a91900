//! Open-trade state and the closed-trade ledger row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::mood::Mood;

/// Directional side of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Bullish,
    Bearish,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Bullish => "bullish",
            Direction::Bearish => "bearish",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a trade was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    /// Two consecutive adverse mood evaluations.
    MoodShift,
    /// Armed trailing stop retraced from the favorable extreme.
    TrailingStop,
    /// Tenkan/Kijun cross, price inside the cloud, or chikou confirmation failure.
    IchimokuExit,
    /// Bounded lookahead window exhausted during simulation.
    TimeoutExit,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::MoodShift => "Mood Shift",
            ExitReason::TrailingStop => "Trailing Stop",
            ExitReason::IchimokuExit => "Ichimoku Exit",
            ExitReason::TimeoutExit => "Timeout Exit",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A live (shadow or simulated) position.
///
/// Owned exclusively by the lifecycle manager's per-instrument map; the
/// trailing extremum, arm latch, and mood strike counter are mutated once
/// per step. The arm latch is one-way: once `trail_armed` is set it never
/// reverts within the same lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenTrade {
    pub instrument: String,
    pub direction: Direction,
    pub entry_price: f64,
    pub entry_index: usize,
    pub entry_time: DateTime<Utc>,
    /// Unit count for shadow bookkeeping (0 when the caller does not size).
    pub units: i64,
    pub trail_distance: f64,
    pub trail_armed: bool,
    /// Running max close (bullish) or min close (bearish) since entry.
    pub max_favorable_price: f64,
    pub entry_mood: Mood,
    pub entry_confidence: f64,
    /// Consecutive adverse mood evaluations; reset on any non-adverse step.
    pub mood_strikes: u32,
}

/// A completed round trip — one row of the simulation ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClosedTrade {
    pub entry_index: usize,
    pub exit_index: usize,
    pub instrument: String,
    pub direction: Direction,
    pub entry_price: f64,
    pub exit_price: f64,
    pub exit_time: DateTime<Utc>,
    pub exit_reason: ExitReason,
    pub pnl_pips: f64,
    /// Intent confidence at entry.
    pub confidence: f64,
    /// Mood at entry.
    pub mood: Mood,
}

impl ClosedTrade {
    pub fn is_winner(&self) -> bool {
        self.pnl_pips > 0.0
    }
}

/// Realized profit/loss in pips, rounded to a tenth of a pip.
///
/// Bullish: (exit - entry) * 10000; bearish inverted.
pub fn pnl_pips(direction: Direction, entry_price: f64, exit_price: f64) -> f64 {
    let raw = match direction {
        Direction::Bullish => exit_price - entry_price,
        Direction::Bearish => entry_price - exit_price,
    };
    (raw * 10000.0 * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn pnl_pips_bullish() {
        assert_eq!(pnl_pips(Direction::Bullish, 1.1000, 1.1009), 9.0);
        assert_eq!(pnl_pips(Direction::Bullish, 1.1000, 1.0990), -10.0);
    }

    #[test]
    fn pnl_pips_bearish_inverted() {
        assert_eq!(pnl_pips(Direction::Bearish, 1.1000, 1.0990), 10.0);
        assert_eq!(pnl_pips(Direction::Bearish, 1.1000, 1.1009), -9.0);
    }

    #[test]
    fn pnl_pips_rounds_to_tenth() {
        // 0.00012 -> 1.2 pips exactly, 0.000123 -> 1.2 pips after rounding
        assert_eq!(pnl_pips(Direction::Bullish, 1.0, 1.000123), 1.2);
    }

    #[test]
    fn exit_reason_display() {
        assert_eq!(ExitReason::MoodShift.to_string(), "Mood Shift");
        assert_eq!(ExitReason::TrailingStop.to_string(), "Trailing Stop");
        assert_eq!(ExitReason::IchimokuExit.to_string(), "Ichimoku Exit");
        assert_eq!(ExitReason::TimeoutExit.to_string(), "Timeout Exit");
    }

    #[test]
    fn closed_trade_serialization_roundtrip() {
        let trade = ClosedTrade {
            entry_index: 152,
            exit_index: 160,
            instrument: "EUR_USD".into(),
            direction: Direction::Bullish,
            entry_price: 1.1000,
            exit_price: 1.1009,
            exit_time: Utc.with_ymd_and_hms(2024, 1, 3, 12, 0, 0).unwrap(),
            exit_reason: ExitReason::TrailingStop,
            pnl_pips: 9.0,
            confidence: 0.75,
            mood: Mood::Soaring,
        };
        let json = serde_json::to_string(&trade).unwrap();
        let deser: ClosedTrade = serde_json::from_str(&json).unwrap();
        assert_eq!(trade.pnl_pips, deser.pnl_pips);
        assert_eq!(trade.exit_reason, deser.exit_reason);
        assert!(trade.is_winner());
    }
}
