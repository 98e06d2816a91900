//! KumoLab Runner — orchestration around the decision engine.
//!
//! - Simulation driver: replays the intent/lifecycle logic over historical
//!   candles into a closed-trade ledger, with a rayon fan-out for batches
//! - CSV data loading (plus a seeded synthetic generator for offline work)
//! - External-collaborator seams: candle source and order gateway traits
//! - Persistence sinks: unified decision journal, shadow-trade log with
//!   in-place exit updates, per-exit text reports
//! - Artifact export: manifest JSON + trade-ledger CSV, schema versioned
//! - Watch cycle: multi-instrument shadow observation loop

pub mod config;
pub mod data_loader;
pub mod export;
pub mod journal;
pub mod provider;
pub mod simulator;
pub mod watch;

pub use config::{ConfigError, SimulationConfig};
pub use data_loader::{dataset_hash, load_candles_csv, synthetic_candles, LoadError};
pub use export::{export_trades_csv, load_artifacts, save_artifacts, SimulationManifest};
pub use journal::{append_exit_report, DecisionJournal, DecisionRecord, JournalError, ShadowTradeLog};
pub use provider::{
    CandleSource, CsvReplaySource, GatewayError, OrderGateway, OrderReceipt, OrderTicket,
    ShadowGateway, SourceError,
};
pub use simulator::{run_batch, run_simulation, BatchReport, SimError, SimulationResult};
pub use watch::{run_watch_cycle, CycleError, CycleReport, WatchConfig, WatchSinks};
