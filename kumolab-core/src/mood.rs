//! Mood reader — qualitative market mood from recent candles and the cloud.
//!
//! The mood is read from the last three candles (direction census, body vs
//! wick balance) combined with where the latest close sits relative to the
//! cloud. Short-term event flags (direction-flip "tk cross", cloud breakout,
//! cloud entry) are read from the last five. One recursive step over the
//! series minus its last three candles supplies the prior mood.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::Candle;

/// How many candles feed the direction census.
const CENSUS_WINDOW: usize = 3;
/// How many candles feed the event flags.
const RECENT_WINDOW: usize = 5;

/// Qualitative market mood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mood {
    /// Bullish candles above the cloud with conviction (bodies beat wicks).
    Soaring,
    /// Bullish above the cloud, but wicks dominate.
    Drifting,
    /// Bullish candles still below the cloud.
    ClimbingFromValley,
    /// Bearish candles below the cloud with conviction.
    Plunging,
    /// Bearish below the cloud, but wicks dominate.
    Sliding,
    /// Bearish candles above the cloud.
    SlippingFromHeights,
    /// Price inside the cloud — indecision overrides everything else.
    Foggy,
    /// No clear census.
    Wandering,
    /// Fewer than three candles available.
    InsufficientData,
}

impl Mood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Soaring => "soaring",
            Mood::Drifting => "drifting",
            Mood::ClimbingFromValley => "climbing from valley",
            Mood::Plunging => "plunging",
            Mood::Sliding => "sliding",
            Mood::SlippingFromHeights => "slipping from heights",
            Mood::Foggy => "foggy",
            Mood::Wandering => "wandering",
            Mood::InsufficientData => "insufficient_data",
        }
    }

    /// Strongly pessimistic mood — conflicts with an open bullish trade.
    pub fn is_strong_pessimism(&self) -> bool {
        matches!(self, Mood::Plunging)
    }

    /// Strongly optimistic mood — conflicts with an open bearish trade.
    pub fn is_strong_optimism(&self) -> bool {
        matches!(self, Mood::Soaring)
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cloud breakout flag: did the close jump clean across the cloud?
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Breakout {
    Above,
    Below,
    None,
}

impl Breakout {
    pub fn as_str(&self) -> &'static str {
        match self {
            Breakout::Above => "above",
            Breakout::Below => "below",
            Breakout::None => "none",
        }
    }

    pub fn occurred(&self) -> bool {
        !matches!(self, Breakout::None)
    }
}

impl fmt::Display for Breakout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position of a price relative to the cloud.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloudPosition {
    Above,
    Below,
    Inside,
}

/// Mood plus the short-term event flags.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoodReport {
    pub mood: Mood,
    /// Direction flip among the recent candles — an approximation of a
    /// Tenkan/Kijun crossover, not the real thing.
    pub recent_tk_cross: bool,
    pub cloud_breakout: Breakout,
    /// Some(true) = moved into the cloud, Some(false) = moved out of it,
    /// None = no transition between the last two closes.
    pub entered_cloud: Option<bool>,
    /// Mood of the series excluding its last three candles.
    pub prior_mood: Option<Mood>,
}

impl MoodReport {
    fn insufficient() -> Self {
        Self {
            mood: Mood::InsufficientData,
            recent_tk_cross: false,
            cloud_breakout: Breakout::None,
            entered_cloud: None,
            prior_mood: None,
        }
    }
}

/// Classify a price against cloud boundaries.
pub fn cloud_position(price: f64, cloud_top: f64, cloud_bottom: f64) -> CloudPosition {
    if price > cloud_top {
        CloudPosition::Above
    } else if price < cloud_bottom {
        CloudPosition::Below
    } else {
        CloudPosition::Inside
    }
}

/// Assess the market mood and recent cloud-related events.
///
/// Pure and re-entrant; the prior-mood recursion strips three candles per
/// level, so depth is bounded by len / 3.
pub fn market_mood(candles: &[Candle], cloud_top: f64, cloud_bottom: f64) -> MoodReport {
    let n = candles.len();
    if n < CENSUS_WINDOW {
        return MoodReport::insufficient();
    }

    let recent = &candles[n.saturating_sub(RECENT_WINDOW)..];
    let census = &recent[recent.len() - CENSUS_WINDOW..];

    let mut bull_count = 0;
    let mut bear_count = 0;
    let mut body_sum = 0.0;
    let mut wick_sum = 0.0;
    for c in census {
        if c.is_bullish() {
            bull_count += 1;
        } else if c.is_bearish() {
            bear_count += 1;
        }
        body_sum += c.body();
        wick_sum += c.upper_wick() + c.lower_wick();
    }
    let avg_body = body_sum / CENSUS_WINDOW as f64;
    let avg_wick = wick_sum / (2.0 * CENSUS_WINDOW as f64);

    let latest_close = recent[recent.len() - 1].close;
    let prev_close = recent[recent.len() - 2].close;
    let position = cloud_position(latest_close, cloud_top, cloud_bottom);

    let mood = if position == CloudPosition::Inside {
        Mood::Foggy
    } else if bull_count >= 2 {
        match position {
            CloudPosition::Above => {
                if avg_body > avg_wick {
                    Mood::Soaring
                } else {
                    Mood::Drifting
                }
            }
            CloudPosition::Below => Mood::ClimbingFromValley,
            CloudPosition::Inside => unreachable!(),
        }
    } else if bear_count >= 2 {
        match position {
            CloudPosition::Below => {
                if avg_body > avg_wick {
                    Mood::Plunging
                } else {
                    Mood::Sliding
                }
            }
            CloudPosition::Above => Mood::SlippingFromHeights,
            CloudPosition::Inside => unreachable!(),
        }
    } else {
        Mood::Wandering
    };

    let recent_tk_cross = recent.windows(2).any(|pair| {
        (pair[0].is_bearish() && pair[1].is_bullish())
            || (pair[0].is_bullish() && pair[1].is_bearish())
    });

    let cloud_breakout = if prev_close < cloud_bottom && latest_close > cloud_top {
        Breakout::Above
    } else if prev_close > cloud_top && latest_close < cloud_bottom {
        Breakout::Below
    } else {
        Breakout::None
    };

    let prev_inside = cloud_bottom <= prev_close && prev_close <= cloud_top;
    let latest_inside = cloud_bottom <= latest_close && latest_close <= cloud_top;
    let entered_cloud = if prev_inside && !latest_inside {
        Some(false)
    } else if !prev_inside && latest_inside {
        Some(true)
    } else {
        None
    };

    let prior_mood = if n >= 2 * CENSUS_WINDOW {
        Some(market_mood(&candles[..n - CENSUS_WINDOW], cloud_top, cloud_bottom).mood)
    } else {
        None
    };

    MoodReport {
        mood,
        recent_tk_cross,
        cloud_breakout,
        entered_cloud,
        prior_mood,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::make_ohlc_candles;

    const TOP: f64 = 1.00;
    const BOTTOM: f64 = 0.90;

    #[test]
    fn under_three_candles_is_insufficient() {
        let candles = make_ohlc_candles(&[(1.0, 1.1, 0.9, 1.05), (1.05, 1.1, 1.0, 1.08)]);
        let report = market_mood(&candles, TOP, BOTTOM);
        assert_eq!(report.mood, Mood::InsufficientData);
        assert!(!report.recent_tk_cross);
        assert_eq!(report.cloud_breakout, Breakout::None);
        assert_eq!(report.entered_cloud, None);
        assert_eq!(report.prior_mood, None);
    }

    #[test]
    fn bullish_above_cloud_with_conviction_is_soaring() {
        // Full-body bullish candles, no wicks, closes above the cloud top.
        let candles = make_ohlc_candles(&[
            (1.05, 1.06, 1.05, 1.06),
            (1.06, 1.07, 1.06, 1.07),
            (1.07, 1.08, 1.07, 1.08),
        ]);
        assert_eq!(market_mood(&candles, TOP, BOTTOM).mood, Mood::Soaring);
    }

    #[test]
    fn bullish_above_cloud_with_wicks_is_drifting() {
        // Tiny bodies, long wicks.
        let candles = make_ohlc_candles(&[
            (1.050, 1.070, 1.030, 1.051),
            (1.051, 1.071, 1.031, 1.052),
            (1.052, 1.072, 1.032, 1.053),
        ]);
        assert_eq!(market_mood(&candles, TOP, BOTTOM).mood, Mood::Drifting);
    }

    #[test]
    fn bullish_below_cloud_is_climbing() {
        let candles = make_ohlc_candles(&[
            (0.80, 0.81, 0.80, 0.81),
            (0.81, 0.82, 0.81, 0.82),
            (0.82, 0.83, 0.82, 0.83),
        ]);
        assert_eq!(
            market_mood(&candles, TOP, BOTTOM).mood,
            Mood::ClimbingFromValley
        );
    }

    #[test]
    fn bearish_below_cloud_with_conviction_is_plunging() {
        let candles = make_ohlc_candles(&[
            (0.85, 0.85, 0.84, 0.84),
            (0.84, 0.84, 0.83, 0.83),
            (0.83, 0.83, 0.82, 0.82),
        ]);
        assert_eq!(market_mood(&candles, TOP, BOTTOM).mood, Mood::Plunging);
    }

    #[test]
    fn bearish_below_cloud_with_wicks_is_sliding() {
        let candles = make_ohlc_candles(&[
            (0.851, 0.870, 0.830, 0.850),
            (0.850, 0.869, 0.829, 0.849),
            (0.849, 0.868, 0.828, 0.848),
        ]);
        assert_eq!(market_mood(&candles, TOP, BOTTOM).mood, Mood::Sliding);
    }

    #[test]
    fn bearish_above_cloud_is_slipping() {
        let candles = make_ohlc_candles(&[
            (1.08, 1.08, 1.07, 1.07),
            (1.07, 1.07, 1.06, 1.06),
            (1.06, 1.06, 1.05, 1.05),
        ]);
        assert_eq!(
            market_mood(&candles, TOP, BOTTOM).mood,
            Mood::SlippingFromHeights
        );
    }

    #[test]
    fn inside_cloud_is_foggy_regardless_of_census() {
        // Strongly bullish candles, but the latest close is inside the cloud.
        let candles = make_ohlc_candles(&[
            (0.92, 0.93, 0.92, 0.93),
            (0.93, 0.94, 0.93, 0.94),
            (0.94, 0.95, 0.94, 0.95),
        ]);
        assert_eq!(market_mood(&candles, TOP, BOTTOM).mood, Mood::Foggy);
    }

    #[test]
    fn mixed_census_is_wandering() {
        // One bull, one bear, one doji — above the cloud.
        let candles = make_ohlc_candles(&[
            (1.05, 1.06, 1.05, 1.06),
            (1.06, 1.06, 1.05, 1.05),
            (1.05, 1.05, 1.05, 1.05),
        ]);
        assert_eq!(market_mood(&candles, TOP, BOTTOM).mood, Mood::Wandering);
    }

    #[test]
    fn direction_flip_sets_tk_cross() {
        let candles = make_ohlc_candles(&[
            (1.05, 1.05, 1.04, 1.04), // bear
            (1.04, 1.06, 1.04, 1.06), // bull — flip
            (1.06, 1.07, 1.06, 1.07), // bull
        ]);
        assert!(market_mood(&candles, TOP, BOTTOM).recent_tk_cross);
    }

    #[test]
    fn no_flip_no_tk_cross() {
        let candles = make_ohlc_candles(&[
            (1.05, 1.06, 1.05, 1.06),
            (1.06, 1.07, 1.06, 1.07),
            (1.07, 1.08, 1.07, 1.08),
        ]);
        assert!(!market_mood(&candles, TOP, BOTTOM).recent_tk_cross);
    }

    #[test]
    fn breakout_above_when_close_crosses_whole_cloud() {
        let candles = make_ohlc_candles(&[
            (0.86, 0.87, 0.85, 0.86),
            (0.86, 0.87, 0.85, 0.86), // previous close below the cloud bottom
            (0.86, 1.06, 0.86, 1.05), // latest close above the cloud top
        ]);
        let report = market_mood(&candles, TOP, BOTTOM);
        assert_eq!(report.cloud_breakout, Breakout::Above);
    }

    #[test]
    fn breakout_below_when_close_drops_through_cloud() {
        let candles = make_ohlc_candles(&[
            (1.05, 1.06, 1.04, 1.05),
            (1.05, 1.06, 1.04, 1.05),
            (1.05, 1.05, 0.84, 0.85),
        ]);
        let report = market_mood(&candles, TOP, BOTTOM);
        assert_eq!(report.cloud_breakout, Breakout::Below);
    }

    #[test]
    fn entering_the_cloud_flags_true() {
        let candles = make_ohlc_candles(&[
            (0.85, 0.86, 0.84, 0.85),
            (0.85, 0.86, 0.84, 0.85), // outside (below)
            (0.85, 0.96, 0.85, 0.95), // inside
        ]);
        assert_eq!(market_mood(&candles, TOP, BOTTOM).entered_cloud, Some(true));
    }

    #[test]
    fn leaving_the_cloud_flags_false() {
        let candles = make_ohlc_candles(&[
            (0.95, 0.96, 0.94, 0.95),
            (0.95, 0.96, 0.94, 0.95), // inside
            (0.95, 1.06, 0.95, 1.05), // outside (above)
        ]);
        assert_eq!(
            market_mood(&candles, TOP, BOTTOM).entered_cloud,
            Some(false)
        );
    }

    #[test]
    fn prior_mood_reads_earlier_census() {
        // First three: convinced bears below the cloud. Last three: convinced
        // bulls above it.
        let candles = make_ohlc_candles(&[
            (0.85, 0.85, 0.84, 0.84),
            (0.84, 0.84, 0.83, 0.83),
            (0.83, 0.83, 0.82, 0.82),
            (1.05, 1.06, 1.05, 1.06),
            (1.06, 1.07, 1.06, 1.07),
            (1.07, 1.08, 1.07, 1.08),
        ]);
        let report = market_mood(&candles, TOP, BOTTOM);
        assert_eq!(report.mood, Mood::Soaring);
        assert_eq!(report.prior_mood, Some(Mood::Plunging));
    }

    #[test]
    fn prior_mood_absent_under_six_candles() {
        let candles = make_ohlc_candles(&[
            (1.05, 1.06, 1.05, 1.06),
            (1.06, 1.07, 1.06, 1.07),
            (1.07, 1.08, 1.07, 1.08),
            (1.08, 1.09, 1.08, 1.09),
            (1.09, 1.10, 1.09, 1.10),
        ]);
        assert_eq!(market_mood(&candles, TOP, BOTTOM).prior_mood, None);
    }

    #[test]
    fn strong_mood_predicates() {
        assert!(Mood::Plunging.is_strong_pessimism());
        assert!(Mood::Soaring.is_strong_optimism());
        assert!(!Mood::Sliding.is_strong_pessimism());
        assert!(!Mood::Drifting.is_strong_optimism());
    }
}
