//! Configuration for the Facelive Decision Agent.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::core::decider::{DEFAULT_REAL_THRESHOLD, DEFAULT_WINDOW_SIZE};

/// Main configuration for the decision agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Number of recent labels the sliding-window decider votes over
    pub window_size: usize,

    /// Count either side needs to win the vote; must exceed half the window
    pub real_threshold: usize,

    /// Default collection session length in seconds
    pub session_duration_secs: u64,

    /// Path for storing reports and audit counters
    pub data_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("facelive-decision-agent");

        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            real_threshold: DEFAULT_REAL_THRESHOLD,
            session_duration_secs: 10,
            data_path: data_dir,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(&config_path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("facelive-decision-agent")
            .join("config.json")
    }

    /// Ensure the data directory exists.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.data_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Check the decider parameters.
    ///
    /// `real_threshold` must exceed `window_size / 2` so the liveness and
    /// spoof outcomes cannot both be reached from one window.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_size == 0 {
            return Err(ConfigError::InvalidDeciderParams(
                "window_size must be at least 1".to_string(),
            ));
        }
        if self.real_threshold <= self.window_size / 2 || self.real_threshold > self.window_size {
            return Err(ConfigError::InvalidDeciderParams(format!(
                "real_threshold {} must exceed half of window_size {} and not exceed it",
                self.real_threshold, self.window_size
            )));
        }
        if self.session_duration_secs == 0 {
            return Err(ConfigError::InvalidDeciderParams(
                "session_duration_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    InvalidDeciderParams(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::InvalidDeciderParams(e) => write!(f, "Invalid decider parameters: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.window_size, 7);
        assert_eq!(config.real_threshold, 4);
        assert_eq!(config.session_duration_secs, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_weak_threshold() {
        let config = Config {
            real_threshold: 3,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_threshold_above_window() {
        let config = Config {
            real_threshold: 8,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_window() {
        let config = Config {
            window_size: 0,
            real_threshold: 1,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
