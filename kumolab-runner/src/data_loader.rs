//! Historical candle loading and synthetic fallback data.
//!
//! CSV input carries Open/High/Low/Close columns (any casing), optionally a
//! Time/Timestamp/Date column. Prices are parsed to f64; rows that fail to
//! parse are a typed error, never silently skipped. Without a time column,
//! evenly spaced timestamps are synthesized so session-aware logic stays
//! deterministic.
//!
//! Synthetic data is a developer-only offline mode: a seeded random walk,
//! reproducible for a given seed.

use std::path::Path;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use kumolab_core::domain::Candle;

/// Spacing used when the CSV has no time column.
const SYNTHESIZED_SPACING_MINUTES: i64 = 15;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("row {row}: bad number in column '{column}'")]
    BadNumber { row: usize, column: &'static str },
    #[error("row {row}: unparseable timestamp '{value}'")]
    BadTimestamp { row: usize, value: String },
    #[error("no data rows in CSV")]
    Empty,
}

/// Load candles from a CSV file.
pub fn load_candles_csv(path: &Path) -> Result<Vec<Candle>, LoadError> {
    let mut reader = csv::Reader::from_path(path)?;

    let headers = reader.headers()?.clone();
    let find = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    };

    let open_col = find("open").ok_or(LoadError::MissingColumn("open"))?;
    let high_col = find("high").ok_or(LoadError::MissingColumn("high"))?;
    let low_col = find("low").ok_or(LoadError::MissingColumn("low"))?;
    let close_col = find("close").ok_or(LoadError::MissingColumn("close"))?;
    let time_col = find("time").or_else(|| find("timestamp")).or_else(|| find("date"));

    let base = Utc.with_ymd_and_hms(2020, 1, 6, 0, 0, 0).unwrap();
    let mut candles = Vec::new();

    for (row_index, record) in reader.records().enumerate() {
        let record = record?;
        let number = |col: usize, column: &'static str| {
            record
                .get(col)
                .and_then(|s| s.trim().parse::<f64>().ok())
                .ok_or(LoadError::BadNumber {
                    row: row_index,
                    column,
                })
        };

        let timestamp = match time_col {
            Some(col) => {
                let raw = record.get(col).unwrap_or("").trim();
                parse_timestamp(raw).ok_or_else(|| LoadError::BadTimestamp {
                    row: row_index,
                    value: raw.to_string(),
                })?
            }
            None => base + Duration::minutes(SYNTHESIZED_SPACING_MINUTES * row_index as i64),
        };

        candles.push(Candle {
            timestamp,
            open: number(open_col, "open")?,
            high: number(high_col, "high")?,
            low: number(low_col, "low")?,
            close: number(close_col, "close")?,
        });
    }

    if candles.is_empty() {
        return Err(LoadError::Empty);
    }
    Ok(candles)
}

/// Parse a timestamp as RFC 3339, then "YYYY-MM-DD HH:MM:SS", then a bare date.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
    }
    None
}

/// BLAKE3 hash over the full candle series, for result provenance.
pub fn dataset_hash(candles: &[Candle]) -> String {
    let mut hasher = blake3::Hasher::new();
    for c in candles {
        hasher.update(&c.timestamp.timestamp().to_le_bytes());
        hasher.update(&c.open.to_le_bytes());
        hasher.update(&c.high.to_le_bytes());
        hasher.update(&c.low.to_le_bytes());
        hasher.update(&c.close.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// Generate a seeded random-walk candle series.
pub fn synthetic_candles(seed: u64, count: usize, start_price: f64) -> Vec<Candle> {
    let mut rng = StdRng::seed_from_u64(seed);
    let base = Utc.with_ymd_and_hms(2020, 1, 6, 0, 0, 0).unwrap();

    let mut candles = Vec::with_capacity(count);
    let mut prev_close = start_price;
    for i in 0..count {
        let open = prev_close;
        let drift: f64 = rng.gen_range(-0.0008..0.0010);
        let close = (open + drift).max(0.0001);
        let high = open.max(close) + rng.gen_range(0.0..0.0006);
        let low = (open.min(close) - rng.gen_range(0.0..0.0006)).max(0.00005);
        candles.push(Candle {
            timestamp: base + Duration::minutes(SYNTHESIZED_SPACING_MINUTES * i as i64),
            open,
            high,
            low,
            close,
        });
        prev_close = close;
    }
    candles
}
