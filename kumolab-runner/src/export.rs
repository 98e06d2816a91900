//! Artifact export — manifest JSON and trade-ledger CSV.
//!
//! All persisted artifacts carry a `schema_version` field; newer versions
//! than this build understands are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use kumolab_core::domain::ClosedTrade;

use crate::config::SimulationConfig;
use crate::simulator::SimulationResult;

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Full description of one simulation run, as persisted to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationManifest {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub config: SimulationConfig,
    pub dataset_hash: String,
    pub result: SimulationResult,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl SimulationManifest {
    pub fn new(config: SimulationConfig, dataset_hash: String, result: SimulationResult) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            config,
            dataset_hash,
            result,
        }
    }
}

// ─── JSON ───────────────────────────────────────────────────────────

/// Serialize a manifest to pretty JSON.
pub fn export_json(manifest: &SimulationManifest) -> Result<String> {
    serde_json::to_string_pretty(manifest).context("failed to serialize manifest to JSON")
}

/// Deserialize a manifest, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<SimulationManifest> {
    let manifest: SimulationManifest =
        serde_json::from_str(json).context("failed to deserialize manifest from JSON")?;
    if manifest.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            manifest.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(manifest)
}

// ─── CSV ────────────────────────────────────────────────────────────

/// Export the closed-trade ledger as CSV.
///
/// Columns: entry_index, exit_index, instrument, direction, entry_price,
/// exit_price, exit_time, exit_reason, pnl_pips, confidence, mood
pub fn export_trades_csv(trades: &[ClosedTrade]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);

    writer.write_record([
        "entry_index",
        "exit_index",
        "instrument",
        "direction",
        "entry_price",
        "exit_price",
        "exit_time",
        "exit_reason",
        "pnl_pips",
        "confidence",
        "mood",
    ])?;

    for t in trades {
        writer.write_record([
            &t.entry_index.to_string(),
            &t.exit_index.to_string(),
            &t.instrument,
            t.direction.as_str(),
            &format!("{:.5}", t.entry_price),
            &format!("{:.5}", t.exit_price),
            &t.exit_time.to_rfc3339(),
            t.exit_reason.as_str(),
            &format!("{:.1}", t.pnl_pips),
            &format!("{:.2}", t.confidence),
            t.mood.as_str(),
        ])?;
    }

    let data = writer.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the artifact set for one simulation run.
///
/// Creates `{instrument}_{timestamp}/` under `output_dir` containing
/// `manifest.json` and `trades.csv`, and returns the created path.
pub fn save_artifacts(manifest: &SimulationManifest, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!(
        "{}_{}",
        manifest.result.instrument,
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("manifest.json"), export_json(manifest)?)?;
    std::fs::write(
        run_dir.join("trades.csv"),
        export_trades_csv(&manifest.result.trades)?,
    )?;

    Ok(run_dir)
}

/// Load a manifest back from an artifact directory.
pub fn load_artifacts(dir: &Path) -> Result<SimulationManifest> {
    let manifest_path = dir.join("manifest.json");
    let json = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    import_json(&json)
}
