//! Config file handling
//!
//! Optional TOML file at `<config_dir>/probestack/config.toml`:
//!
//! ```toml
//! [defaults]
//! timeout_secs = 30
//! script_budget_ms = 5000
//! variables_dir = "variables"
//! environment = "staging"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::ProbestackError;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SCRIPT_BUDGET_MS: u64 = 5000;

/// ProbeStack configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub config_dir: PathBuf,
    /// Transport timeout
    pub timeout_secs: u64,
    /// Wall-clock budget for each script run
    pub script_budget_ms: u64,
    /// Where variable scopes are persisted
    pub variables_dir: PathBuf,
    /// Environment selected when none is given on the command line
    pub environment: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self::with_dir(Self::default_config_dir())
    }
}

impl Config {
    fn with_dir(config_dir: PathBuf) -> Self {
        Self {
            variables_dir: config_dir.join("variables"),
            config_dir,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            script_budget_ms: DEFAULT_SCRIPT_BUDGET_MS,
            environment: None,
        }
    }

    /// Load configuration from the default location; a missing file yields defaults
    pub fn load() -> Result<Self, ProbestackError> {
        let config_dir = Self::default_config_dir();
        let config_file = config_dir.join("config.toml");
        if !config_file.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&config_file)
    }

    /// Load configuration from an explicit file (TOML format)
    pub fn load_from(config_file: &Path) -> Result<Self, ProbestackError> {
        let config_dir = config_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_config_dir);

        let content = std::fs::read_to_string(config_file)
            .map_err(|e| ProbestackError::Config(format!("Failed to read config: {}", e)))?;

        let toml_value: toml::Value = toml::from_str(&content)
            .map_err(|e| ProbestackError::Config(format!("Invalid config TOML: {}", e)))?;

        let mut config = Self::with_dir(config_dir);
        let Some(defaults) = toml_value.get("defaults") else {
            return Ok(config);
        };

        if let Some(timeout) = defaults.get("timeout_secs") {
            config.timeout_secs = Self::positive_integer(timeout, "timeout_secs")?;
        }
        if let Some(budget) = defaults.get("script_budget_ms") {
            config.script_budget_ms = Self::positive_integer(budget, "script_budget_ms")?;
        }
        if let Some(dir) = defaults.get("variables_dir").and_then(|v| v.as_str()) {
            let path = PathBuf::from(dir);
            // Resolve relative paths against config dir
            config.variables_dir = if path.is_absolute() {
                path
            } else {
                config.config_dir.join(path)
            };
        }
        config.environment = defaults
            .get("environment")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(String::from);

        Ok(config)
    }

    fn positive_integer(value: &toml::Value, key: &str) -> Result<u64, ProbestackError> {
        value
            .as_integer()
            .filter(|n| *n > 0)
            .map(|n| n as u64)
            .ok_or_else(|| ProbestackError::Config(format!("defaults.{} must be a positive integer", key)))
    }

    /// Get the default config directory
    fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|p| p.join("probestack"))
            .unwrap_or_else(|| PathBuf::from(".probestack"))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn script_budget(&self) -> Duration {
        Duration::from_millis(self.script_budget_ms)
    }
}
