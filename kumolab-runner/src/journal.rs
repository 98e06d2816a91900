//! Persistence sinks: decision journal, shadow-trade log, exit reports.
//!
//! All three are append-only text files. The shadow-trade log is the one
//! exception to pure appending: when a shadow trade closes, its original
//! open row is located by (instrument, entry_price, entry_index) and the
//! exit columns are filled in by rewriting the file.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use kumolab_core::domain::{ClosedTrade, OpenTrade};
use kumolab_core::intent::Intent;
use kumolab_core::weather::WeatherGlance;

/// Errors from the persistence sinks.
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("journal io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("journal csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// One row of the unified decision log.
#[derive(Debug, Clone)]
pub struct DecisionRecord {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub instrument: String,
    pub granularity: String,
    pub price: f64,
    pub intent: Intent,
    pub weather: WeatherGlance,
}

const DECISION_HEADER: [&str; 18] = [
    "timestamp",
    "instrument",
    "granularity",
    "price",
    "sky",
    "cloud",
    "wind",
    "freedom",
    "momentum",
    "bias",
    "confidence",
    "should_trade",
    "mood",
    "session",
    "recent_tk_cross",
    "cloud_breakout",
    "entered_cloud",
    "prior_mood",
];

/// Append-only CSV of every evaluation the watch cycle makes.
pub struct DecisionJournal {
    path: PathBuf,
}

impl DecisionJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &DecisionRecord) -> Result<(), JournalError> {
        let (file, is_new) = open_append(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if is_new {
            writer.write_record(DECISION_HEADER)?;
        }
        let context = &record.intent.context;
        writer.write_record([
            record.timestamp.to_rfc3339().as_str(),
            &record.instrument,
            &record.granularity,
            &format!("{:.5}", record.price),
            &record.weather.sky.to_string(),
            &record.weather.cloud.to_string(),
            &record.weather.wind.to_string(),
            &record.weather.freedom.to_string(),
            &record.weather.momentum.to_string(),
            record.intent.bias.as_str(),
            &format!("{:.2}", record.intent.confidence),
            &record.intent.should_trade.to_string(),
            record.intent.mood.as_str(),
            record.intent.session.session.as_str(),
            &context.recent_tk_cross.to_string(),
            context.cloud_breakout.as_str(),
            &option_bool(context.entered_cloud),
            context.prior_mood.map(|m| m.as_str()).unwrap_or(""),
        ])?;
        writer.flush()?;
        Ok(())
    }
}

const SHADOW_HEADER: [&str; 12] = [
    "timestamp",
    "instrument",
    "direction",
    "entry_price",
    "entry_index",
    "units",
    "entry_mood",
    "entry_confidence",
    "exit_price",
    "pnl_pips",
    "exit_time",
    "exit_reason",
];

/// Shadow-trade log: one row per open, exit columns filled on close.
pub struct ShadowTradeLog {
    path: PathBuf,
}

impl ShadowTradeLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a freshly opened shadow trade with empty exit columns.
    pub fn append_open(&self, trade: &OpenTrade) -> Result<(), JournalError> {
        let (file, is_new) = open_append(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if is_new {
            writer.write_record(SHADOW_HEADER)?;
        }
        writer.write_record([
            trade.entry_time.to_rfc3339().as_str(),
            &trade.instrument,
            trade.direction.as_str(),
            &trade.entry_price.to_string(),
            &trade.entry_index.to_string(),
            &trade.units.to_string(),
            trade.entry_mood.as_str(),
            &format!("{:.2}", trade.entry_confidence),
            "",
            "",
            "",
            "",
        ])?;
        writer.flush()?;
        Ok(())
    }

    /// Fill the exit columns of the matching open row.
    ///
    /// The row is located by (instrument, entry_price, entry_index) and the
    /// whole file is rewritten. Returns false when no row matched (or the
    /// log does not exist yet).
    pub fn record_exit(&self, closed: &ClosedTrade) -> Result<bool, JournalError> {
        if !self.path.exists() {
            return Ok(false);
        }

        let mut reader = csv::Reader::from_path(&self.path)?;
        let headers = reader.headers()?.clone();
        let mut rows: Vec<csv::StringRecord> = Vec::new();
        let mut updated = false;

        for record in reader.records() {
            let mut record = record?;
            let matches = record.get(1) == Some(closed.instrument.as_str())
                && record
                    .get(3)
                    .and_then(|s| s.parse::<f64>().ok())
                    .is_some_and(|p| p == closed.entry_price)
                && record
                    .get(4)
                    .and_then(|s| s.parse::<usize>().ok())
                    .is_some_and(|i| i == closed.entry_index);
            if matches {
                let mut fields: Vec<String> =
                    record.iter().map(|s| s.to_string()).collect();
                fields[8] = closed.exit_price.to_string();
                fields[9] = closed.pnl_pips.to_string();
                fields[10] = closed.exit_time.to_rfc3339();
                fields[11] = closed.exit_reason.as_str().to_string();
                record = csv::StringRecord::from(fields);
                updated = true;
            }
            rows.push(record);
        }

        let mut writer = csv::Writer::from_path(&self.path)?;
        writer.write_record(&headers)?;
        for row in &rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(updated)
    }
}

/// Append a one-line text report for a closed trade.
pub fn append_exit_report(path: &Path, closed: &ClosedTrade) -> Result<(), JournalError> {
    let (mut file, _) = open_append(path)?;
    writeln!(
        file,
        "[SHADOW EXIT] {} | {} exit | {} | P/L: {:+.1} pips | entry {:.5} @ {} -> exit {:.5} @ {}",
        closed.instrument,
        closed.direction.as_str().to_uppercase(),
        closed.exit_reason,
        closed.pnl_pips,
        closed.entry_price,
        closed.entry_index,
        closed.exit_price,
        closed.exit_index,
    )?;
    Ok(())
}

/// Open a file for appending; the bool reports whether it was empty/new.
fn open_append(path: &Path) -> Result<(File, bool), JournalError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let is_new = file.metadata()?.len() == 0;
    Ok((file, is_new))
}

fn option_bool(value: Option<bool>) -> String {
    value.map(|b| b.to_string()).unwrap_or_default()
}
