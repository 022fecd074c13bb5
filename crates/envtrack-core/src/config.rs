//! Configuration loading

use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TrackerError};

/// Default number of undo steps retained
pub const DEFAULT_MAX_DEPTH: usize = 50;

/// Undo history settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of deltas kept on the undo stack
    pub max_depth: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Top-level envtrack configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Undo history settings
    pub history: HistoryConfig,
}

/// Loads [`TrackerConfig`] from an optional TOML file overlaid with
/// `ENVTRACK_*` environment variables (`ENVTRACK_HISTORY__MAX_DEPTH=100`).
pub struct ConfigLoader {
    config_path: PathBuf,
    env_prefix: String,
}

impl ConfigLoader {
    /// Loader for the default config path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
            env_prefix: "ENVTRACK".to_string(),
        }
    }

    /// Loader for a custom config path
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            env_prefix: "ENVTRACK".to_string(),
        }
    }

    /// Path the loader reads from
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("envtrack")
            .join("config.toml")
    }

    /// Load and validate the configuration; a missing file yields defaults
    pub fn load(&self) -> Result<TrackerConfig> {
        let config = Config::builder()
            .add_source(File::from(self.config_path.clone()).required(false))
            .add_source(
                Environment::with_prefix(&self.env_prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let tracker_config: TrackerConfig = config.try_deserialize()?;
        Self::validate(&tracker_config)?;
        debug!(
            path = %self.config_path.display(),
            max_depth = tracker_config.history.max_depth,
            "loaded configuration"
        );
        Ok(tracker_config)
    }

    /// Load and validate configuration from TOML text
    pub fn load_from_str(toml: &str) -> Result<TrackerConfig> {
        let config = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;
        let tracker_config: TrackerConfig = config.try_deserialize()?;
        Self::validate(&tracker_config)?;
        Ok(tracker_config)
    }

    /// Reject values the history cannot work with
    pub fn validate(config: &TrackerConfig) -> Result<()> {
        if config.history.max_depth == 0 {
            return Err(TrackerError::validation_error(
                "history.max_depth must be greater than 0",
            ));
        }
        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = TrackerConfig::default();
        assert_eq!(config.history.max_depth, 50);
        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn test_load_from_str() {
        let config = ConfigLoader::load_from_str("[history]\nmax_depth = 10\n").unwrap();
        assert_eq!(config.history.max_depth, 10);
    }

    #[test]
    fn test_load_from_str_missing_keys_use_defaults() {
        let config = ConfigLoader::load_from_str("").unwrap();
        assert_eq!(config, TrackerConfig::default());
    }

    #[test]
    fn test_zero_depth_is_rejected() {
        let result = ConfigLoader::load_from_str("[history]\nmax_depth = 0\n");
        assert!(matches!(result, Err(TrackerError::Validation(_))));
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let result = ConfigLoader::load_from_str("[history\nmax_depth = ");
        assert!(matches!(result, Err(TrackerError::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[history]").unwrap();
        writeln!(file, "max_depth = 7").unwrap();

        let loader = ConfigLoader::with_path(file.path());
        assert_eq!(loader.config_path(), file.path());
        let config = loader.load().unwrap();
        assert_eq!(config.history.max_depth, 7);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loader = ConfigLoader::with_path(dir.path().join("absent.toml"));
        let config = loader.load().unwrap();
        assert_eq!(config.history.max_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn test_default_path_ends_with_config_toml() {
        let loader = ConfigLoader::default();
        assert!(loader.config_path().ends_with("envtrack/config.toml"));
    }
}
