//! KumoLab Core — the Ichimoku decision engine.
//!
//! This crate contains the heart of the trade-decision and simulation system:
//! - Domain types (candles, open trades, closed-trade ledger rows)
//! - Ichimoku line computation with sparse forward/backward-shifted spans
//! - Mood reader (qualitative market mood from recent candles + cloud)
//! - Session oracle (UTC timestamp → trading-session descriptor)
//! - Intent engine (cloud position + mood + session → directional intent)
//! - Trade lifecycle manager (trailing stop / mood reversal / indicator exits)
//! - Heikin-Ashi trend filter and weather-report glance
//!
//! Everything here is pure and synchronous: no I/O, no ambient clock reads
//! (timestamps are always injected), no filesystem. Orchestration lives in
//! `kumolab-runner`.

pub mod domain;
pub mod heikin;
pub mod ichimoku;
pub mod intent;
pub mod lifecycle;
pub mod mood;
pub mod risk;
pub mod session;
pub mod volatility;
pub mod weather;
