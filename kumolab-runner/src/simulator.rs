//! Simulation driver — replay the decision engine over history.
//!
//! The cursor starts once enough bars exist to seed the Ichimoku lines
//! (lookback window + 52). Each step evaluates intent at the cursor; a
//! tradeable intent (confirmed by the Heikin-Ashi vote when enabled) opens
//! a trade, which is then stepped candle-by-candle through a bounded
//! lookahead until an exit fires or the window exhausts (TimeoutExit at
//! the last available price). The cursor jumps past each exit, so trades
//! never overlap within one instrument.

use std::collections::HashMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use kumolab_core::domain::{Candle, ClosedTrade, Direction, ExitReason};
use kumolab_core::heikin::{heikin_ashi, trend_strength};
use kumolab_core::ichimoku::compute_ichimoku;
use kumolab_core::intent::{evaluate_intent, Bias};
use kumolab_core::lifecycle::{LifecycleConfig, TradeEntry, TradeLifecycle};
use kumolab_core::volatility::trail_distance;

use crate::config::SimulationConfig;

/// Bars of Ichimoku seed data required beyond the lookback window.
const ICHIMOKU_SEED_BARS: usize = 52;
/// Heikin-Ashi vote lookback.
const TREND_VOTE_BARS: usize = 3;

/// Errors from the simulation driver.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("not enough candles for '{instrument}': need at least {needed}, got {got}")]
    NotEnoughData {
        instrument: String,
        needed: usize,
        got: usize,
    },
}

/// Exit-reason tally for a ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitBreakdown {
    pub mood_shift: usize,
    pub trailing_stop: usize,
    pub ichimoku: usize,
    pub timeout: usize,
}

impl ExitBreakdown {
    fn record(&mut self, reason: ExitReason) {
        match reason {
            ExitReason::MoodShift => self.mood_shift += 1,
            ExitReason::TrailingStop => self.trailing_stop += 1,
            ExitReason::IchimokuExit => self.ichimoku += 1,
            ExitReason::TimeoutExit => self.timeout += 1,
        }
    }
}

/// Aggregate statistics over a closed-trade ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub trade_count: usize,
    pub winners: usize,
    pub losers: usize,
    pub win_rate: f64,
    pub total_pips: f64,
    pub mean_pips: f64,
    pub exits: ExitBreakdown,
}

impl SimulationSummary {
    pub fn compute(trades: &[ClosedTrade]) -> Self {
        let trade_count = trades.len();
        let winners = trades.iter().filter(|t| t.is_winner()).count();
        let losers = trades.iter().filter(|t| t.pnl_pips < 0.0).count();
        let total_pips: f64 = trades.iter().map(|t| t.pnl_pips).sum();
        let mut exits = ExitBreakdown::default();
        for t in trades {
            exits.record(t.exit_reason);
        }
        Self {
            trade_count,
            winners,
            losers,
            win_rate: if trade_count == 0 {
                0.0
            } else {
                winners as f64 / trade_count as f64
            },
            total_pips,
            mean_pips: if trade_count == 0 {
                0.0
            } else {
                total_pips / trade_count as f64
            },
            exits,
        }
    }
}

/// Result of one instrument's simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    pub instrument: String,
    pub candle_count: usize,
    /// First bar index the driver evaluated.
    pub start_cursor: usize,
    pub trades: Vec<ClosedTrade>,
    pub summary: SimulationSummary,
}

/// Replay the decision engine over one instrument's history.
pub fn run_simulation(
    candles: &[Candle],
    config: &SimulationConfig,
) -> Result<SimulationResult, SimError> {
    let params = &config.simulation;
    let start_cursor = params.lookback_window + ICHIMOKU_SEED_BARS;
    let needed = start_cursor + 1;
    if candles.len() < needed {
        return Err(SimError::NotEnoughData {
            instrument: params.instrument.clone(),
            needed,
            got: candles.len(),
        });
    }

    let lines = compute_ichimoku(candles);
    let mut lifecycle = TradeLifecycle::with_config(LifecycleConfig {
        intent_lookback: params.lookback_window,
        mood_exit_strikes: params.mood_exit_strikes,
    });
    let mut trades: Vec<ClosedTrade> = Vec::new();

    let mut i = start_cursor;
    while i < candles.len() {
        let Some(cloud) = lines.cloud_at(i) else {
            i += 1;
            continue;
        };

        let window = &candles[i + 1 - params.lookback_window..=i];
        let intent = evaluate_intent(window, cloud.top, cloud.bottom, candles[i].timestamp);

        let direction = match intent.bias {
            Bias::BullishBias => Direction::Bullish,
            Bias::BearishBias => Direction::Bearish,
            Bias::Neutral => {
                i += 1;
                continue;
            }
        };

        if !intent.should_trade || !trend_confirms(params.require_trend_confirmation, window, direction) {
            i += 1;
            continue;
        }

        let trail = match params
            .fixed_trail
            .or_else(|| trail_distance(&candles[..=i], params.trail_lookback, params.trail_multiplier))
        {
            Some(t) => t,
            None => {
                i += 1;
                continue;
            }
        };

        let entry = TradeEntry {
            instrument: params.instrument.clone(),
            direction,
            entry_price: candles[i].close,
            entry_index: i,
            entry_time: candles[i].timestamp,
            units: 0,
            trail_distance: trail,
            mood: intent.mood,
            confidence: intent.confidence,
        };
        if let Err(e) = lifecycle.open_trade(entry) {
            warn!(error = %e, "entry skipped");
            i += 1;
            continue;
        }

        // Lifecycle replay with a bounded lookahead window.
        let step_end = (i + params.max_hold_bars).min(candles.len());
        let mut exit: Option<ClosedTrade> = None;
        for j in (i + 1)..step_end {
            if let Some(closed) = lifecycle.step(&params.instrument, candles, &lines, j) {
                exit = Some(closed);
                break;
            }
        }
        let timeout_index = (i + params.max_hold_bars).min(candles.len() - 1);
        let closed = exit.or_else(|| {
            lifecycle.close(
                &params.instrument,
                timeout_index,
                candles[timeout_index].close,
                candles[timeout_index].timestamp,
                ExitReason::TimeoutExit,
            )
        });

        match closed {
            Some(closed) => {
                let next = closed.exit_index + 1;
                trades.push(closed);
                i = next;
            }
            None => i += 1,
        }
    }

    let summary = SimulationSummary::compute(&trades);
    info!(
        instrument = %params.instrument,
        trades = summary.trade_count,
        total_pips = summary.total_pips,
        "simulation finished"
    );

    Ok(SimulationResult {
        instrument: params.instrument.clone(),
        candle_count: candles.len(),
        start_cursor,
        trades,
        summary,
    })
}

fn trend_confirms(required: bool, window: &[Candle], direction: Direction) -> bool {
    if !required {
        return true;
    }
    let vote = trend_strength(&heikin_ashi(window), TREND_VOTE_BARS);
    match direction {
        Direction::Bullish => vote == 1,
        Direction::Bearish => vote == -1,
    }
}

/// Batch report: per-instrument results plus isolated failures.
#[derive(Debug)]
pub struct BatchReport {
    pub results: Vec<SimulationResult>,
    pub failures: Vec<(String, SimError)>,
}

/// Run simulations for several instruments in parallel.
///
/// Each instrument gets its own lifecycle state; one instrument's failure
/// is reported without aborting the others.
pub fn run_batch(
    series: &HashMap<String, Vec<Candle>>,
    config: &SimulationConfig,
) -> BatchReport {
    let outcomes: Vec<_> = series
        .par_iter()
        .map(|(instrument, candles)| {
            let mut per_instrument = config.clone();
            per_instrument.simulation.instrument = instrument.clone();
            (instrument.clone(), run_simulation(candles, &per_instrument))
        })
        .collect();

    let mut results = Vec::new();
    let mut failures = Vec::new();
    for (instrument, outcome) in outcomes {
        match outcome {
            Ok(result) => results.push(result),
            Err(e) => {
                warn!(instrument = %instrument, error = %e, "instrument simulation failed");
                failures.push((instrument, e));
            }
        }
    }
    results.sort_by(|a, b| a.instrument.cmp(&b.instrument));
    failures.sort_by(|a, b| a.0.cmp(&b.0));
    BatchReport { results, failures }
}
