//! Serializable simulation configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration for a simulation run.
///
/// ```toml
/// [simulation]
/// instrument = "EUR_USD"
/// granularity = "M15"
/// lookback_window = 100
/// max_hold_bars = 50
/// require_trend_confirmation = true
/// trail_lookback = 14
/// trail_multiplier = 1.5
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub simulation: SimulationParams,
}

/// The `[simulation]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    pub instrument: String,
    pub granularity: String,
    /// Candles fed to each intent evaluation.
    pub lookback_window: usize,
    /// Bounded lookahead for one trade's lifecycle.
    pub max_hold_bars: usize,
    /// Require the Heikin-Ashi trend vote to agree before entering.
    pub require_trend_confirmation: bool,
    /// True-range lookback for the trailing distance.
    pub trail_lookback: usize,
    /// Multiplier on the mean true range.
    pub trail_multiplier: f64,
    /// Fixed trailing distance override (skips the true-range computation).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_trail: Option<f64>,
    /// Consecutive adverse mood evaluations before a MoodShift exit.
    pub mood_exit_strikes: u32,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            instrument: "EUR_USD".to_string(),
            granularity: "M15".to_string(),
            lookback_window: 100,
            max_hold_bars: 50,
            require_trend_confirmation: true,
            trail_lookback: 14,
            trail_multiplier: 1.5,
            fixed_trail: None,
            mood_exit_strikes: 2,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            simulation: SimulationParams::default(),
        }
    }
}

impl SimulationConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.simulation;
        if p.instrument.is_empty() {
            return Err(ConfigError::Invalid("instrument must not be empty".into()));
        }
        if p.lookback_window < 10 {
            return Err(ConfigError::Invalid(format!(
                "lookback_window must be >= 10, got {}",
                p.lookback_window
            )));
        }
        if p.max_hold_bars == 0 {
            return Err(ConfigError::Invalid("max_hold_bars must be >= 1".into()));
        }
        if p.trail_lookback == 0 {
            return Err(ConfigError::Invalid("trail_lookback must be >= 1".into()));
        }
        if p.trail_multiplier <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "trail_multiplier must be positive, got {}",
                p.trail_multiplier
            )));
        }
        if let Some(fixed) = p.fixed_trail {
            if fixed <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "fixed_trail must be positive, got {fixed}"
                )));
            }
        }
        if p.mood_exit_strikes == 0 {
            return Err(ConfigError::Invalid("mood_exit_strikes must be >= 1".into()));
        }
        Ok(())
    }
}
