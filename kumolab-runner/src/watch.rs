//! Watch cycle — multi-instrument shadow observation.
//!
//! One cycle per call: for each instrument, fetch candles, compute the
//! Ichimoku lines and weather, evaluate intent, open a shadow trade when
//! the intent clears the bar, step any open trade, and append to the
//! decision journal. Per-instrument failures are isolated — one bad
//! instrument never aborts the rest of the cycle — and order-gateway
//! failures are logged and non-fatal. The caller owns scheduling.

use std::path::Path;

use thiserror::Error;
use tracing::warn;

use kumolab_core::domain::{Candle, Direction, ExitReason};
use kumolab_core::ichimoku::compute_ichimoku;
use kumolab_core::intent::{evaluate_intent, Bias, Intent};
use kumolab_core::lifecycle::{TradeEntry, TradeLifecycle};
use kumolab_core::risk::{exposure_allows, position_units};
use kumolab_core::volatility::trail_distance;
use kumolab_core::weather::assess_weather;

use crate::journal::{append_exit_report, DecisionJournal, DecisionRecord, JournalError, ShadowTradeLog};
use crate::provider::{CandleSource, OrderGateway, OrderTicket, SourceError};

/// Tunables for the watch cycle.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    pub instruments: Vec<String>,
    pub granularity: String,
    /// Candles fetched per instrument per cycle.
    pub candle_count: usize,
    pub risk_pct: f64,
    pub stop_loss_pips: f64,
    pub max_open_trades: usize,
    pub trail_lookback: usize,
    pub trail_multiplier: f64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            instruments: vec!["EUR_USD".to_string()],
            granularity: "M15".to_string(),
            candle_count: 160,
            risk_pct: kumolab_core::risk::DEFAULT_RISK_PCT,
            stop_loss_pips: kumolab_core::risk::DEFAULT_STOP_LOSS_PIPS,
            max_open_trades: kumolab_core::risk::DEFAULT_MAX_OPEN_TRADES,
            trail_lookback: 14,
            trail_multiplier: 1.5,
        }
    }
}

/// Errors that take a single instrument out of one cycle.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Journal(#[from] JournalError),
    #[error("no candles returned for '{0}'")]
    NoCandles(String),
    #[error("cloud undefined for '{0}'; decision skipped")]
    InsufficientCloud(String),
}

/// Persistence sinks used by the cycle.
pub struct WatchSinks<'a> {
    pub decisions: &'a DecisionJournal,
    pub shadow: &'a ShadowTradeLog,
    pub exit_reports: &'a Path,
}

/// What happened for one instrument in one cycle.
#[derive(Debug, Clone)]
pub struct InstrumentOutcome {
    pub instrument: String,
    pub bias: Bias,
    pub confidence: f64,
    pub opened: bool,
    pub closed: Option<ExitReason>,
}

/// One full cycle over all instruments.
#[derive(Debug)]
pub struct CycleReport {
    pub outcomes: Vec<InstrumentOutcome>,
    pub failures: Vec<(String, CycleError)>,
}

/// Run one observation cycle over every configured instrument.
pub fn run_watch_cycle(
    source: &mut dyn CandleSource,
    gateway: &mut dyn OrderGateway,
    lifecycle: &mut TradeLifecycle,
    sinks: &WatchSinks<'_>,
    config: &WatchConfig,
) -> CycleReport {
    let mut outcomes = Vec::new();
    let mut failures = Vec::new();

    for instrument in &config.instruments {
        match observe_instrument(source, gateway, lifecycle, sinks, config, instrument) {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => {
                warn!(instrument = %instrument, error = %e, "instrument cycle failed");
                failures.push((instrument.clone(), e));
            }
        }
    }

    CycleReport { outcomes, failures }
}

fn observe_instrument(
    source: &mut dyn CandleSource,
    gateway: &mut dyn OrderGateway,
    lifecycle: &mut TradeLifecycle,
    sinks: &WatchSinks<'_>,
    config: &WatchConfig,
    instrument: &str,
) -> Result<InstrumentOutcome, CycleError> {
    let candles = source.fetch(instrument, &config.granularity, config.candle_count)?;
    let Some(latest) = candles.last().cloned() else {
        return Err(CycleError::NoCandles(instrument.to_string()));
    };
    let index = candles.len() - 1;

    let lines = compute_ichimoku(&candles);
    let weather = assess_weather(&candles, &lines);
    let Some((_, cloud)) = lines.latest_cloud() else {
        return Err(CycleError::InsufficientCloud(instrument.to_string()));
    };

    let intent = evaluate_intent(&candles, cloud.top, cloud.bottom, latest.timestamp);

    let mut opened = false;
    let direction = match intent.bias {
        Bias::BullishBias => Some(Direction::Bullish),
        Bias::BearishBias => Some(Direction::Bearish),
        Bias::Neutral => None,
    };
    if let Some(direction) = direction {
        if intent.should_trade
            && !lifecycle.has_open(instrument)
            && exposure_allows(lifecycle.open_count(), config.max_open_trades)
        {
            opened = try_open_shadow_trade(
                gateway, lifecycle, sinks, config, instrument, &candles, index, direction, &intent,
            )?;
        }
    }

    let mut closed = None;
    if let Some(closed_trade) = lifecycle.step(instrument, &candles, &lines, index) {
        sinks.shadow.record_exit(&closed_trade)?;
        append_exit_report(sinks.exit_reports, &closed_trade)?;
        closed = Some(closed_trade.exit_reason);
    }

    sinks.decisions.append(&DecisionRecord {
        timestamp: latest.timestamp,
        instrument: instrument.to_string(),
        granularity: config.granularity.clone(),
        price: latest.close,
        intent: intent.clone(),
        weather,
    })?;

    Ok(InstrumentOutcome {
        instrument: instrument.to_string(),
        bias: intent.bias,
        confidence: intent.confidence,
        opened,
        closed,
    })
}

/// Submit the order and register the shadow trade. Gateway failures are
/// logged and reported as "not opened" — never as a cycle failure.
#[allow(clippy::too_many_arguments)]
fn try_open_shadow_trade(
    gateway: &mut dyn OrderGateway,
    lifecycle: &mut TradeLifecycle,
    sinks: &WatchSinks<'_>,
    config: &WatchConfig,
    instrument: &str,
    candles: &[Candle],
    index: usize,
    direction: Direction,
    intent: &Intent,
) -> Result<bool, CycleError> {
    let balance = match gateway.balance() {
        Ok(b) => b,
        Err(e) => {
            warn!(instrument, error = %e, "balance unavailable; standing down");
            return Ok(false);
        }
    };
    let units = position_units(balance, config.risk_pct, config.stop_loss_pips);
    let signed_units = match direction {
        Direction::Bullish => units,
        Direction::Bearish => -units,
    };

    if let Err(e) = gateway.submit_market(OrderTicket {
        instrument: instrument.to_string(),
        units: signed_units,
        stop_loss: None,
        take_profit: None,
    }) {
        warn!(instrument, error = %e, "order submission failed; cycle continues");
        return Ok(false);
    }

    let Some(trail) = trail_distance(candles, config.trail_lookback, config.trail_multiplier)
    else {
        return Ok(false);
    };

    let latest = &candles[index];
    let entry = TradeEntry {
        instrument: instrument.to_string(),
        direction,
        entry_price: latest.close,
        entry_index: index,
        entry_time: latest.timestamp,
        units,
        trail_distance: trail,
        mood: intent.mood,
        confidence: intent.confidence,
    };
    match lifecycle.open_trade(entry) {
        Ok(trade) => {
            sinks.shadow.append_open(trade)?;
            Ok(true)
        }
        Err(e) => {
            warn!(instrument, error = %e, "duplicate shadow trade blocked");
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{CsvReplaySource, GatewayError, OrderReceipt, ShadowGateway};
    use chrono::{Duration, TimeZone, Utc};
    use kumolab_core::domain::Candle;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn make_candles(closes: &[f64]) -> Vec<Candle> {
        let base = Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                let open = if i == 0 { close } else { closes[i - 1] };
                Candle {
                    timestamp: base + Duration::minutes(15 * i as i64),
                    open,
                    high: open.max(close) + 0.0005,
                    low: open.min(close) - 0.0005,
                    close,
                }
            })
            .collect()
    }

    fn rising_source(instrument: &str, n: usize) -> CsvReplaySource {
        let closes: Vec<f64> = (0..n).map(|i| 1.0 + i as f64 * 0.002).collect();
        let mut series = HashMap::new();
        series.insert(instrument.to_string(), make_candles(&closes));
        CsvReplaySource::new(series)
    }

    fn sinks_in(dir: &TempDir) -> (DecisionJournal, ShadowTradeLog, std::path::PathBuf) {
        (
            DecisionJournal::new(dir.path().join("decisions.csv")),
            ShadowTradeLog::new(dir.path().join("shadow_trades.csv")),
            dir.path().join("exits.log"),
        )
    }

    #[test]
    fn cycle_opens_shadow_trade_on_strong_intent() {
        let dir = TempDir::new().unwrap();
        let (decisions, shadow, exits) = sinks_in(&dir);
        let sinks = WatchSinks {
            decisions: &decisions,
            shadow: &shadow,
            exit_reports: &exits,
        };

        let mut source = rising_source("EUR_USD", 250);
        let mut gateway = ShadowGateway::new(10_000.0);
        let mut lifecycle = TradeLifecycle::new();
        let config = WatchConfig::default();

        let report = run_watch_cycle(&mut source, &mut gateway, &mut lifecycle, &sinks, &config);
        assert!(report.failures.is_empty());
        assert_eq!(report.outcomes.len(), 1);
        assert!(report.outcomes[0].opened);
        assert_eq!(report.outcomes[0].bias, Bias::BullishBias);
        assert!(lifecycle.has_open("EUR_USD"));

        // 1% of 10k over 20 pips -> 50k units, signed long.
        assert_eq!(gateway.submitted.len(), 1);
        assert_eq!(gateway.submitted[0].units, 50_000);

        let shadow_text = std::fs::read_to_string(shadow.path()).unwrap();
        assert_eq!(shadow_text.lines().count(), 2);
        let journal_text = std::fs::read_to_string(decisions.path()).unwrap();
        assert_eq!(journal_text.lines().count(), 2);
    }

    #[test]
    fn second_cycle_respects_duplicate_guard() {
        let dir = TempDir::new().unwrap();
        let (decisions, shadow, exits) = sinks_in(&dir);
        let sinks = WatchSinks {
            decisions: &decisions,
            shadow: &shadow,
            exit_reports: &exits,
        };

        let mut source = rising_source("EUR_USD", 250);
        let mut gateway = ShadowGateway::new(10_000.0);
        let mut lifecycle = TradeLifecycle::new();
        let config = WatchConfig::default();

        let first = run_watch_cycle(&mut source, &mut gateway, &mut lifecycle, &sinks, &config);
        assert!(first.outcomes[0].opened);
        let second = run_watch_cycle(&mut source, &mut gateway, &mut lifecycle, &sinks, &config);
        assert!(!second.outcomes[0].opened);

        assert_eq!(gateway.submitted.len(), 1);
        assert_eq!(lifecycle.open_count(), 1);
    }

    #[test]
    fn unknown_instrument_is_isolated() {
        let dir = TempDir::new().unwrap();
        let (decisions, shadow, exits) = sinks_in(&dir);
        let sinks = WatchSinks {
            decisions: &decisions,
            shadow: &shadow,
            exit_reports: &exits,
        };

        let mut source = rising_source("EUR_USD", 250);
        let mut gateway = ShadowGateway::new(10_000.0);
        let mut lifecycle = TradeLifecycle::new();
        let config = WatchConfig {
            instruments: vec!["GBP_USD".to_string(), "EUR_USD".to_string()],
            ..WatchConfig::default()
        };

        let report = run_watch_cycle(&mut source, &mut gateway, &mut lifecycle, &sinks, &config);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, "GBP_USD");
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.outcomes[0].instrument, "EUR_USD");
    }

    struct RejectingGateway;

    impl OrderGateway for RejectingGateway {
        fn balance(&self) -> Result<f64, GatewayError> {
            Ok(10_000.0)
        }
        fn submit_market(&mut self, _ticket: OrderTicket) -> Result<OrderReceipt, GatewayError> {
            Err(GatewayError::Rejected("margin check failed".into()))
        }
    }

    #[test]
    fn gateway_rejection_is_nonfatal() {
        let dir = TempDir::new().unwrap();
        let (decisions, shadow, exits) = sinks_in(&dir);
        let sinks = WatchSinks {
            decisions: &decisions,
            shadow: &shadow,
            exit_reports: &exits,
        };

        let mut source = rising_source("EUR_USD", 250);
        let mut gateway = RejectingGateway;
        let mut lifecycle = TradeLifecycle::new();
        let config = WatchConfig::default();

        let report = run_watch_cycle(&mut source, &mut gateway, &mut lifecycle, &sinks, &config);
        assert!(report.failures.is_empty());
        assert!(!report.outcomes[0].opened);
        assert!(!lifecycle.has_open("EUR_USD"));
        // The decision itself is still journaled.
        assert!(decisions.path().exists());
    }

    #[test]
    fn exposure_cap_blocks_new_trades() {
        let dir = TempDir::new().unwrap();
        let (decisions, shadow, exits) = sinks_in(&dir);
        let sinks = WatchSinks {
            decisions: &decisions,
            shadow: &shadow,
            exit_reports: &exits,
        };

        let mut source = rising_source("EUR_USD", 250);
        let mut gateway = ShadowGateway::new(10_000.0);
        let mut lifecycle = TradeLifecycle::new();
        let config = WatchConfig {
            max_open_trades: 0,
            ..WatchConfig::default()
        };

        let report = run_watch_cycle(&mut source, &mut gateway, &mut lifecycle, &sinks, &config);
        assert!(!report.outcomes[0].opened);
        assert!(gateway.submitted.is_empty());
    }
}
