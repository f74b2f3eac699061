use crate::engine::SimulationParams;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";
pub const DEFAULT_SERVER_PORT: u16 = 4000;
pub const DEFAULT_CYCLE_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_DATA_FILE: &str = "data/state.json";
pub const DEFAULT_AUDIT_FILE: &str = "data/audit.json";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub app: AppSection,
    pub logging: LoggingSection,
    #[serde(default)]
    pub server: Option<ServerSection>,
    #[serde(default)]
    pub simulation: Option<SimulationSection>,
    #[serde(default)]
    pub storage: Option<StorageSection>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSection {
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSection {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSection {
    /// Port to listen on (default: 4000)
    pub port: Option<u16>,
    /// Interval in seconds between simulation cycles (default: 5)
    pub cycle_interval_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SimulationSection {
    /// Forecast horizon in minutes (default: 30)
    pub forecast_horizon_minutes: Option<u32>,
    /// Per-cycle chance of injecting a random alert (default: 0.4)
    pub alert_probability: Option<f64>,
    /// Per-cycle chance a pending recommendation at a severe junction
    /// auto-accepts (default: 0.05)
    pub auto_accept_probability: Option<f64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageSection {
    pub data_file: Option<PathBuf>,
    pub audit_file: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

pub fn load_default() -> Result<Config, ConfigError> {
    load_from_path(DEFAULT_CONFIG_PATH)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)?;
    Ok(config)
}

impl Config {
    /// Returns the logging level, falling back to `info` when the
    /// configured value is not one of tracing's level names.
    pub fn log_level(&self) -> tracing::Level {
        self.logging
            .level
            .parse()
            .unwrap_or(tracing::Level::INFO)
    }

    /// Returns the server port (default: 4000)
    pub fn server_port(&self) -> u16 {
        self.server
            .as_ref()
            .and_then(|s| s.port)
            .unwrap_or(DEFAULT_SERVER_PORT)
    }

    /// Returns the cycle interval as Duration (default: 5 seconds)
    pub fn cycle_interval(&self) -> Duration {
        let secs = self
            .server
            .as_ref()
            .and_then(|s| s.cycle_interval_secs)
            .unwrap_or(DEFAULT_CYCLE_INTERVAL_SECS);
        Duration::from_secs(secs)
    }

    /// Returns simulation tuning knobs, defaulted where unset.
    pub fn simulation_params(&self) -> SimulationParams {
        let defaults = SimulationParams::default();
        let section = self.simulation.as_ref();
        SimulationParams {
            forecast_horizon_minutes: section
                .and_then(|s| s.forecast_horizon_minutes)
                .unwrap_or(defaults.forecast_horizon_minutes),
            alert_probability: section
                .and_then(|s| s.alert_probability)
                .unwrap_or(defaults.alert_probability),
            auto_accept_probability: section
                .and_then(|s| s.auto_accept_probability)
                .unwrap_or(defaults.auto_accept_probability),
        }
    }

    pub fn data_file(&self) -> PathBuf {
        self.storage
            .as_ref()
            .and_then(|s| s.data_file.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_FILE))
    }

    pub fn audit_file(&self) -> PathBuf {
        self.storage
            .as_ref()
            .and_then(|s| s.audit_file.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_AUDIT_FILE))
    }
}
