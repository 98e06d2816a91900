//! External-collaborator seams: candle sources and order gateways.
//!
//! Real brokerage connectivity lives behind these traits and outside this
//! repository. The provided implementations are a CSV replay source (serves
//! advancing windows of a loaded series) and a shadow gateway that records
//! orders without sending anything anywhere.

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

use kumolab_core::domain::Candle;

/// Errors from a candle source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("instrument '{0}' not available from this source")]
    UnknownInstrument(String),
    #[error("replay for '{0}' is exhausted")]
    Exhausted(String),
    #[error("source failure: {0}")]
    Other(String),
}

/// A capability that returns ordered, complete OHLC candles.
pub trait CandleSource {
    fn fetch(
        &mut self,
        instrument: &str,
        granularity: &str,
        count: usize,
    ) -> Result<Vec<Candle>, SourceError>;
}

/// Replays a pre-loaded candle series as advancing windows.
///
/// Each fetch returns the latest `count` candles ending at the replay
/// cursor, then advances the instrument's cursor by one bar — so successive
/// watch cycles each see exactly one new candle.
pub struct CsvReplaySource {
    series: HashMap<String, Vec<Candle>>,
    cursors: HashMap<String, usize>,
    start: Option<usize>,
}

impl CsvReplaySource {
    pub fn new(series: HashMap<String, Vec<Candle>>) -> Self {
        Self {
            series,
            cursors: HashMap::new(),
            start: None,
        }
    }

    /// Begin replay with the window ending at `start` instead of at the
    /// first full window.
    pub fn starting_at(mut self, start: usize) -> Self {
        self.start = Some(start);
        self
    }
}

impl CandleSource for CsvReplaySource {
    fn fetch(
        &mut self,
        instrument: &str,
        _granularity: &str,
        count: usize,
    ) -> Result<Vec<Candle>, SourceError> {
        let series = self
            .series
            .get(instrument)
            .ok_or_else(|| SourceError::UnknownInstrument(instrument.to_string()))?;

        let initial = self.start.unwrap_or(count).min(series.len());
        let cursor = self.cursors.entry(instrument.to_string()).or_insert(initial);
        if *cursor > series.len() {
            return Err(SourceError::Exhausted(instrument.to_string()));
        }

        let begin = cursor.saturating_sub(count);
        let window = series[begin..*cursor].to_vec();
        *cursor += 1;
        Ok(window)
    }
}

/// Errors from an order gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("order rejected: {0}")]
    Rejected(String),
    #[error("gateway unavailable: {0}")]
    Unavailable(String),
}

/// A market order request. Units are signed: positive buys, negative sells.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderTicket {
    pub instrument: String,
    pub units: i64,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
}

/// Acknowledgement from the gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderReceipt {
    pub instrument: String,
    pub units: i64,
}

/// A capability that accepts market orders and reports a balance.
pub trait OrderGateway {
    fn balance(&self) -> Result<f64, GatewayError>;
    fn submit_market(&mut self, ticket: OrderTicket) -> Result<OrderReceipt, GatewayError>;
}

/// Records orders against a paper balance; never sends anything.
pub struct ShadowGateway {
    balance: f64,
    pub submitted: Vec<OrderTicket>,
}

impl ShadowGateway {
    pub fn new(balance: f64) -> Self {
        Self {
            balance,
            submitted: Vec::new(),
        }
    }
}

impl OrderGateway for ShadowGateway {
    fn balance(&self) -> Result<f64, GatewayError> {
        Ok(self.balance)
    }

    fn submit_market(&mut self, ticket: OrderTicket) -> Result<OrderReceipt, GatewayError> {
        debug!(
            instrument = %ticket.instrument,
            units = ticket.units,
            "shadow order recorded"
        );
        let receipt = OrderReceipt {
            instrument: ticket.instrument.clone(),
            units: ticket.units,
        };
        self.submitted.push(ticket);
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_loader::synthetic_candles;

    fn source_with(instrument: &str, n: usize) -> CsvReplaySource {
        let mut series = HashMap::new();
        series.insert(instrument.to_string(), synthetic_candles(1, n, 1.10));
        CsvReplaySource::new(series)
    }

    #[test]
    fn replay_windows_advance_one_bar() {
        let mut source = source_with("EUR_USD", 30);
        let w1 = source.fetch("EUR_USD", "M15", 10).unwrap();
        let w2 = source.fetch("EUR_USD", "M15", 10).unwrap();
        assert_eq!(w1.len(), 10);
        assert_eq!(w2.len(), 10);
        // The second window is shifted forward by exactly one candle.
        assert_eq!(w1[1..], w2[..9]);
    }

    #[test]
    fn replay_exhausts_at_series_end() {
        let mut source = source_with("EUR_USD", 12);
        for _ in 0..3 {
            source.fetch("EUR_USD", "M15", 10).unwrap();
        }
        assert!(matches!(
            source.fetch("EUR_USD", "M15", 10),
            Err(SourceError::Exhausted(_))
        ));
    }

    #[test]
    fn unknown_instrument_is_error() {
        let mut source = source_with("EUR_USD", 30);
        assert!(matches!(
            source.fetch("GBP_USD", "M15", 10),
            Err(SourceError::UnknownInstrument(_))
        ));
    }

    #[test]
    fn starting_at_offsets_the_first_window() {
        let mut source = source_with("EUR_USD", 30).starting_at(20);
        let w = source.fetch("EUR_USD", "M15", 10).unwrap();
        let full = synthetic_candles(1, 30, 1.10);
        assert_eq!(w, full[10..20].to_vec());
    }

    #[test]
    fn shadow_gateway_records_orders() {
        let mut gateway = ShadowGateway::new(10_000.0);
        assert_eq!(gateway.balance().unwrap(), 10_000.0);
        let receipt = gateway
            .submit_market(OrderTicket {
                instrument: "EUR_USD".into(),
                units: -5_000,
                stop_loss: None,
                take_profit: None,
            })
            .unwrap();
        assert_eq!(receipt.units, -5_000);
        assert_eq!(gateway.submitted.len(), 1);
    }
}
