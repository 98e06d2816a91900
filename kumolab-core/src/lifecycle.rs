//! Trade lifecycle manager — open, track, and close shadow positions.
//!
//! One manager owns all open trades, keyed by instrument; the map is the
//! single source of truth and enforces at most one open trade per
//! instrument. Each step re-reads the mood, updates the favorable extreme,
//! arms the trailing stop (a one-way latch), and checks the exit ladder in
//! order: mood shift, trailing stop, Ichimoku fallback.
//!
//! A failed mood re-evaluation (undefined cloud, thin history) is treated
//! as "no conflict" for that step — data gaps must never crash an open
//! trade.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::{pnl_pips, Candle, ClosedTrade, Direction, ExitReason, OpenTrade};
use crate::ichimoku::{IchimokuLines, DISPLACEMENT};
use crate::mood::{self, Mood};

/// Tunables for the lifecycle manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// Candles fed to each mood re-evaluation (tail of the series).
    pub intent_lookback: usize,
    /// Consecutive adverse evaluations before a MoodShift exit.
    pub mood_exit_strikes: u32,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            intent_lookback: 100,
            mood_exit_strikes: 2,
        }
    }
}

/// Errors from opening a trade.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OpenError {
    #[error("an open trade already exists for '{0}'")]
    DuplicateTrade(String),
}

/// Entry snapshot captured when a trade opens.
#[derive(Debug, Clone)]
pub struct TradeEntry {
    pub instrument: String,
    pub direction: Direction,
    pub entry_price: f64,
    pub entry_index: usize,
    pub entry_time: DateTime<Utc>,
    pub units: i64,
    pub trail_distance: f64,
    pub mood: Mood,
    pub confidence: f64,
}

/// Per-instrument open-trade store plus the step/exit policy.
#[derive(Debug, Default)]
pub struct TradeLifecycle {
    config: LifecycleConfig,
    open: HashMap<String, OpenTrade>,
}

impl TradeLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LifecycleConfig) -> Self {
        Self {
            config,
            open: HashMap::new(),
        }
    }

    /// Open a trade from an entry snapshot.
    ///
    /// Rejects the entry if the instrument already has an open trade.
    pub fn open_trade(&mut self, entry: TradeEntry) -> Result<&OpenTrade, OpenError> {
        if self.open.contains_key(&entry.instrument) {
            return Err(OpenError::DuplicateTrade(entry.instrument));
        }
        let trade = OpenTrade {
            instrument: entry.instrument.clone(),
            direction: entry.direction,
            entry_price: entry.entry_price,
            entry_index: entry.entry_index,
            entry_time: entry.entry_time,
            units: entry.units,
            trail_distance: entry.trail_distance,
            trail_armed: false,
            max_favorable_price: entry.entry_price,
            entry_mood: entry.mood,
            entry_confidence: entry.confidence,
            mood_strikes: 0,
        };
        Ok(self.open.entry(entry.instrument).or_insert(trade))
    }

    pub fn has_open(&self, instrument: &str) -> bool {
        self.open.contains_key(instrument)
    }

    pub fn open_for(&self, instrument: &str) -> Option<&OpenTrade> {
        self.open.get(instrument)
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    pub fn open_trades(&self) -> impl Iterator<Item = &OpenTrade> {
        self.open.values()
    }

    /// Advance the instrument's open trade by one candle.
    ///
    /// `index` is the current bar; `candles` and `lines` must share the same
    /// index domain. Returns the closed trade if any exit condition fired.
    pub fn step(
        &mut self,
        instrument: &str,
        candles: &[Candle],
        lines: &IchimokuLines,
        index: usize,
    ) -> Option<ClosedTrade> {
        if index >= candles.len() || !self.open.contains_key(instrument) {
            return None;
        }
        let bar = &candles[index];
        let price = bar.close;

        // 1. Mood re-evaluation. An unavailable cloud is swallowed as
        //    "no conflict" for this step.
        match self.reevaluate_mood(candles, lines, index) {
            Some(current_mood) => {
                let trade = self.open.get_mut(instrument)?;
                if mood_conflict(trade.direction, trade.entry_mood, current_mood) {
                    trade.mood_strikes += 1;
                    warn!(
                        instrument,
                        strikes = trade.mood_strikes,
                        mood = %current_mood,
                        "adverse mood shift"
                    );
                    if trade.mood_strikes >= self.config.mood_exit_strikes {
                        return Some(self.close(
                            instrument,
                            index,
                            price,
                            bar.timestamp,
                            ExitReason::MoodShift,
                        )?);
                    }
                } else {
                    trade.mood_strikes = 0;
                }
            }
            None => {
                debug!(instrument, index, "mood re-evaluation unavailable; no conflict assumed");
            }
        }

        let trade = self.open.get_mut(instrument)?;

        // 2. Favorable-extreme update.
        trade.max_favorable_price = match trade.direction {
            Direction::Bullish => trade.max_favorable_price.max(price),
            Direction::Bearish => trade.max_favorable_price.min(price),
        };

        // 3. Arm latch (one-way).
        if !trade.trail_armed {
            let moved = (trade.max_favorable_price - trade.entry_price).abs();
            if moved >= trade.trail_distance {
                trade.trail_armed = true;
                debug!(instrument, "trailing stop armed");
            }
        }

        // 4. Trailing-stop retrace.
        if trade.trail_armed {
            let stop_hit = match trade.direction {
                Direction::Bullish => price <= trade.max_favorable_price - trade.trail_distance,
                Direction::Bearish => price >= trade.max_favorable_price + trade.trail_distance,
            };
            if stop_hit {
                return Some(self.close(
                    instrument,
                    index,
                    price,
                    bar.timestamp,
                    ExitReason::TrailingStop,
                )?);
            }
        }

        // 5. Ichimoku fallback.
        let direction = self.open.get(instrument)?.direction;
        if ichimoku_exit(direction, candles, lines, index) {
            return Some(self.close(
                instrument,
                index,
                price,
                bar.timestamp,
                ExitReason::IchimokuExit,
            )?);
        }

        None
    }

    /// Close the instrument's open trade unconditionally.
    ///
    /// Used internally for every exit and by the simulation driver for the
    /// lookahead timeout.
    pub fn close(
        &mut self,
        instrument: &str,
        exit_index: usize,
        exit_price: f64,
        exit_time: DateTime<Utc>,
        exit_reason: ExitReason,
    ) -> Option<ClosedTrade> {
        let trade = self.open.remove(instrument)?;
        Some(ClosedTrade {
            entry_index: trade.entry_index,
            exit_index,
            instrument: trade.instrument,
            direction: trade.direction,
            entry_price: trade.entry_price,
            exit_price,
            exit_time,
            exit_reason,
            pnl_pips: pnl_pips(trade.direction, trade.entry_price, exit_price),
            confidence: trade.entry_confidence,
            mood: trade.entry_mood,
        })
    }

    /// Current mood at `index`, or None when the cloud is undefined there.
    fn reevaluate_mood(
        &self,
        candles: &[Candle],
        lines: &IchimokuLines,
        index: usize,
    ) -> Option<Mood> {
        let cloud = lines.cloud_at(index)?;
        let history = &candles[..=index];
        let start = history.len().saturating_sub(self.config.intent_lookback);
        let report = mood::market_mood(&history[start..], cloud.top, cloud.bottom);
        if report.mood == Mood::InsufficientData {
            return None;
        }
        Some(report.mood)
    }
}

/// A strongly adverse mood that also differs from the entry mood.
pub fn mood_conflict(direction: Direction, entry_mood: Mood, current_mood: Mood) -> bool {
    let strong_conflict = match direction {
        Direction::Bullish => current_mood.is_strong_pessimism(),
        Direction::Bearish => current_mood.is_strong_optimism(),
    };
    strong_conflict && current_mood != entry_mood
}

/// Indicator-based fallback exit.
///
/// True when the Tenkan crosses against the trade direction relative to the
/// Kijun, when price sits inside the cloud, or when the chikou span value
/// closed against the trade relative to the bar 26 back. Undefined
/// Tenkan/Kijun at `index` means no exit signal at all.
pub fn ichimoku_exit(
    direction: Direction,
    candles: &[Candle],
    lines: &IchimokuLines,
    index: usize,
) -> bool {
    let (Some(tenkan), Some(kijun)) = (
        lines.tenkan.get(index).copied().flatten(),
        lines.kijun.get(index).copied().flatten(),
    ) else {
        return false;
    };
    let price = candles[index].close;

    let tenkan_cross = match direction {
        Direction::Bullish => tenkan < kijun,
        Direction::Bearish => tenkan > kijun,
    };

    let in_kumo = lines
        .cloud_at(index)
        .map(|cloud| cloud.contains(price))
        .unwrap_or(false);

    if index >= DISPLACEMENT {
        let back_index = index - DISPLACEMENT;
        if let Some(chikou_price) = lines.chikou_at(back_index) {
            let back = &candles[back_index];
            match direction {
                Direction::Bullish if chikou_price < back.low => return true,
                Direction::Bearish if chikou_price > back.high => return true,
                _ => {}
            }
        }
    }

    tenkan_cross || in_kumo
}
