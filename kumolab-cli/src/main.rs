//! KumoLab CLI — simulate, watch, and session commands.
//!
//! Commands:
//! - `simulate` — replay the decision engine over a historical CSV and save
//!   the closed-trade ledger as artifacts
//! - `watch` — run shadow observation cycles over a CSV replay source
//! - `session` — describe the trading session for a timestamp

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

use kumolab_core::lifecycle::TradeLifecycle;
use kumolab_core::session::session_at;
use kumolab_runner::{
    dataset_hash, load_candles_csv, run_simulation, run_watch_cycle, save_artifacts,
    CsvReplaySource, DecisionJournal, ShadowGateway, ShadowTradeLog, SimulationConfig,
    SimulationManifest, SimulationResult, WatchConfig, WatchSinks,
};

#[derive(Parser)]
#[command(name = "kumolab", about = "KumoLab — Ichimoku mood-trading simulator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay the decision engine over a historical OHLC CSV.
    Simulate {
        /// Path to the CSV file (Open/High/Low/Close columns).
        csv: PathBuf,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Instrument name (overrides the config).
        #[arg(long)]
        instrument: Option<String>,

        /// Output directory for artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Run shadow observation cycles over a CSV replay source.
    Watch {
        /// Path to the CSV file used as the replay source.
        csv: PathBuf,

        /// Instrument name for the replayed series.
        #[arg(long, default_value = "EUR_USD")]
        instrument: String,

        /// Number of cycles to run.
        #[arg(long, default_value_t = 12)]
        cycles: usize,

        /// Directory for the decision journal and shadow-trade logs.
        #[arg(long, default_value = "logs")]
        log_dir: PathBuf,
    },
    /// Describe the trading session for a timestamp (default: now).
    Session {
        /// RFC 3339 timestamp, e.g. 2024-03-06T14:00:00Z.
        #[arg(long)]
        at: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Simulate {
            csv,
            config,
            instrument,
            output_dir,
        } => run_simulate_cmd(csv, config, instrument, output_dir),
        Commands::Watch {
            csv,
            instrument,
            cycles,
            log_dir,
        } => run_watch_cmd(csv, instrument, cycles, log_dir),
        Commands::Session { at } => run_session_cmd(at),
    }
}

fn run_simulate_cmd(
    csv: PathBuf,
    config_path: Option<PathBuf>,
    instrument: Option<String>,
    output_dir: PathBuf,
) -> Result<()> {
    let mut config = match config_path {
        Some(path) => SimulationConfig::from_file(&path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => SimulationConfig::default(),
    };
    if let Some(instrument) = instrument {
        config.simulation.instrument = instrument;
    }

    let candles =
        load_candles_csv(&csv).with_context(|| format!("loading candles from {}", csv.display()))?;
    let hash = dataset_hash(&candles);

    let result = run_simulation(&candles, &config)?;
    print_summary(&result);

    let manifest = SimulationManifest::new(config, hash, result);
    let run_dir = save_artifacts(&manifest, &output_dir)?;
    println!("Artifacts saved to: {}", run_dir.display());

    Ok(())
}

fn run_watch_cmd(csv: PathBuf, instrument: String, cycles: usize, log_dir: PathBuf) -> Result<()> {
    let candles =
        load_candles_csv(&csv).with_context(|| format!("loading candles from {}", csv.display()))?;

    let mut series = HashMap::new();
    series.insert(instrument.clone(), candles);
    let mut source = CsvReplaySource::new(series);
    let mut gateway = ShadowGateway::new(10_000.0);
    let mut lifecycle = TradeLifecycle::new();

    let decisions = DecisionJournal::new(log_dir.join("decisions.csv"));
    let shadow = ShadowTradeLog::new(log_dir.join("shadow_trades.csv"));
    let exit_reports = log_dir.join("exits.log");
    let sinks = WatchSinks {
        decisions: &decisions,
        shadow: &shadow,
        exit_reports: &exit_reports,
    };

    let config = WatchConfig {
        instruments: vec![instrument],
        ..WatchConfig::default()
    };

    for cycle in 0..cycles {
        let report = run_watch_cycle(&mut source, &mut gateway, &mut lifecycle, &sinks, &config);
        for outcome in &report.outcomes {
            println!(
                "[cycle {:>3}] {} | {:<12} | confidence {:.2}{}{}",
                cycle,
                outcome.instrument,
                outcome.bias.as_str(),
                outcome.confidence,
                if outcome.opened { " | OPENED" } else { "" },
                outcome
                    .closed
                    .map(|r| format!(" | CLOSED ({r})"))
                    .unwrap_or_default(),
            );
        }
        for (instrument, error) in &report.failures {
            eprintln!("[cycle {cycle:>3}] {instrument} failed: {error}");
        }
        // A drained replay source ends the run early.
        if report.outcomes.is_empty() && !report.failures.is_empty() {
            break;
        }
    }

    println!("Logs written under: {}", log_dir.display());
    Ok(())
}

fn run_session_cmd(at: Option<String>) -> Result<()> {
    let timestamp: DateTime<Utc> = match at {
        Some(raw) => DateTime::parse_from_rfc3339(&raw)
            .with_context(|| format!("unparseable timestamp '{raw}'"))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };

    let info = session_at(timestamp);
    println!("Session:    {}", info.session);
    println!("Mood:       {}", info.mood_label);
    println!("Volatility: {}", info.volatility);
    println!("Notes:      {}", info.advisory);
    Ok(())
}

fn print_summary(result: &SimulationResult) {
    let s = &result.summary;
    println!();
    println!("=== Simulation Result ===");
    println!("Instrument:     {}", result.instrument);
    println!(
        "Candles:        {} (first cursor {})",
        result.candle_count, result.start_cursor
    );
    println!("Trades:         {}", s.trade_count);
    println!("Win rate:       {:.1}%", s.win_rate * 100.0);
    println!("Total P/L:      {:+.1} pips", s.total_pips);
    println!("Mean P/L:       {:+.1} pips", s.mean_pips);
    println!(
        "Exits:          {} mood shift, {} trailing stop, {} ichimoku, {} timeout",
        s.exits.mood_shift, s.exits.trailing_stop, s.exits.ichimoku, s.exits.timeout
    );
    println!();
}
