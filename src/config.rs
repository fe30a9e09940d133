use crate::signals::{Signal, DEFAULT_DELIVERY_CAPACITY};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level configuration loaded from utilkit.toml.
#[derive(Debug, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct UtilConfig {
    pub logging: LoggingConfig,
    pub signals: SignalsConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset and no verbosity flag is given.
    pub level: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SignalsConfig {
    /// Signals `watch` reports on when none are given on the command line.
    pub watch: Vec<Signal>,
    /// Capacity of the "done" notification channel.
    pub notify_capacity: usize,
    /// Capacity of the channel carrying OS deliveries to the dispatch loop.
    pub delivery_capacity: usize,
}

// --- Default implementations ---

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for SignalsConfig {
    fn default() -> Self {
        Self {
            watch: vec![Signal::Interrupt, Signal::Terminate, Signal::Hangup],
            notify_capacity: 1,
            delivery_capacity: DEFAULT_DELIVERY_CAPACITY,
        }
    }
}

/// Errors that can occur while loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "failed to read config {}: {}", path.display(), source)
            }
            ConfigError::Parse { path, source } => {
                write!(f, "failed to parse config {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
        }
    }
}

/// Load config from `path`. A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<UtilConfig, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(UtilConfig::default());
        }
        Err(e) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };

    toml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}
