//! Configuration Loader
//!
//! Loads and validates configuration from TOML files. Every section is
//! optional; missing values fall back to the defaults below.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::DEFAULT_STATE_FILE;
use crate::strategy::params::{ClassifierConfig, EngineConfig, ForestConfig, ParamsError, PredictorConfig};

/// Environment override for the tactical memory file
pub const STATE_FILE_ENV: &str = "FRACTALIS_STATE_FILE";
/// Environment override for the price CSV directory
pub const PRICES_DIR_ENV: &str = "FRACTALIS_PRICES_DIR";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Main configuration structure matching config.toml
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub classifier: ClassifierSection,
    pub predictor: PredictorSection,
    pub storage: StorageSection,
    pub data: DataSection,
    pub logging: LoggingSection,
}

/// Regime classifier section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifierSection {
    /// Minimum usable closes before a regime is reported
    pub min_observations: usize,
    /// Returns per rolling volatility window
    pub volatility_window: usize,
    /// Volatility below this is stable
    pub stable_below: f64,
    /// Volatility above this is chaotic
    pub chaotic_above: f64,
}

impl Default for ClassifierSection {
    fn default() -> Self {
        let defaults = ClassifierConfig::default();
        Self {
            min_observations: defaults.min_observations,
            volatility_window: defaults.volatility_window,
            stable_below: defaults.stable_below,
            chaotic_above: defaults.chaotic_above,
        }
    }
}

/// Direction predictor section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PredictorSection {
    /// Minimum labelled rows needed to fit
    pub min_rows: usize,
    pub n_trees: usize,
    pub seed: u64,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for PredictorSection {
    fn default() -> Self {
        let defaults = PredictorConfig::default();
        Self {
            min_rows: defaults.min_rows,
            n_trees: defaults.forest.n_trees,
            seed: defaults.forest.seed,
            max_depth: defaults.forest.max_depth,
            min_samples_split: defaults.forest.min_samples_split,
            min_samples_leaf: defaults.forest.min_samples_leaf,
        }
    }
}

/// Tactical memory storage section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// JSON file holding the tactical memory
    pub state_file: String,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            state_file: DEFAULT_STATE_FILE.to_string(),
        }
    }
}

impl StorageSection {
    /// State file path with environment variable override
    /// Checks FRACTALIS_STATE_FILE env var first, falls back to config value
    pub fn get_state_file(&self) -> PathBuf {
        resolve_path(&self.state_file, std::env::var(STATE_FILE_ENV).ok())
    }
}

/// Market data section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataSection {
    /// Directory of `<TICKER>.csv` price files
    pub prices_dir: String,
    /// Watchlist JSON produced by the screening tooling
    pub watchlist_file: String,
}

impl Default for DataSection {
    fn default() -> Self {
        Self {
            prices_dir: "data/prices".to_string(),
            watchlist_file: "watchlist.json".to_string(),
        }
    }
}

impl DataSection {
    /// Prices directory with environment variable override
    /// Checks FRACTALIS_PRICES_DIR env var first, falls back to config value
    pub fn get_prices_dir(&self) -> PathBuf {
        resolve_path(&self.prices_dir, std::env::var(PRICES_DIR_ENV).ok())
    }

    pub fn get_watchlist_file(&self) -> PathBuf {
        resolve_path(&self.watchlist_file, None)
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Prefer a non-empty override, then expand a leading `~`
fn resolve_path(configured: &str, env_override: Option<String>) -> PathBuf {
    let raw = env_override
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| configured.to_string());
    PathBuf::from(shellexpand::tilde(&raw).into_owned())
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Invalid parameters: {0}")]
    InvalidParams(#[from] ParamsError),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        EngineConfig::from(self).validate()?;

        if self.storage.state_file.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "state_file cannot be empty".to_string(),
            ));
        }

        if self.data.prices_dir.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "prices_dir cannot be empty".to_string(),
            ));
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "logging level must be one of {:?}, got {}",
                LOG_LEVELS, self.logging.level
            )));
        }

        Ok(())
    }
}

// Conversion from Config to EngineConfig
impl From<&Config> for EngineConfig {
    fn from(config: &Config) -> Self {
        EngineConfig {
            classifier: ClassifierConfig {
                min_observations: config.classifier.min_observations,
                volatility_window: config.classifier.volatility_window,
                stable_below: config.classifier.stable_below,
                chaotic_above: config.classifier.chaotic_above,
            },
            predictor: PredictorConfig {
                min_rows: config.predictor.min_rows,
                forest: ForestConfig {
                    n_trees: config.predictor.n_trees,
                    max_depth: config.predictor.max_depth,
                    min_samples_split: config.predictor.min_samples_split,
                    min_samples_leaf: config.predictor.min_samples_leaf,
                    seed: config.predictor.seed,
                    ..ForestConfig::default()
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_valid_config() -> String {
        r#"
[classifier]
min_observations = 12
volatility_window = 5
stable_below = 0.008
chaotic_above = 0.025

[predictor]
min_rows = 30
n_trees = 50
seed = 7
max_depth = 8

[storage]
state_file = "state/estado.json"

[data]
prices_dir = "~/prices"
watchlist_file = "watchlist.json"

[logging]
level = "debug"
"#
        .to_string()
    }

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let file = write_config(&create_valid_config());
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.classifier.min_observations, 12);
        assert_eq!(config.classifier.stable_below, 0.008);
        assert_eq!(config.predictor.n_trees, 50);
        assert_eq!(config.predictor.max_depth, Some(8));
        assert_eq!(config.storage.state_file, "state/estado.json");
        assert_eq!(config.logging.level, "debug");
        // Unset keys keep their defaults
        assert_eq!(config.predictor.min_samples_split, 2);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let file = write_config("");
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.storage.state_file, "estado_fractalis.json");
        assert_eq!(config.data.prices_dir, "data/prices");
        assert_eq!(EngineConfig::from(&config), EngineConfig::default());
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config("/nonexistent/path/config.toml");
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ConfigError::IoError(_)));
    }

    #[test]
    fn test_malformed_toml() {
        let file = write_config("[classifier\nmin_observations = ");
        assert!(matches!(load_config(file.path()), Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_invalid_thresholds() {
        let file = write_config(
            r#"
[classifier]
stable_below = 0.05
chaotic_above = 0.01
"#,
        );
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::InvalidParams(ParamsError::InvalidThresholds { .. }))
        ));
    }

    #[test]
    fn test_invalid_log_level() {
        let file = write_config("[logging]\nlevel = \"loud\"\n");
        assert!(matches!(load_config(file.path()), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_engine_config_conversion() {
        let file = write_config(&create_valid_config());
        let config = load_config(file.path()).unwrap();
        let engine = EngineConfig::from(&config);

        assert_eq!(engine.classifier.chaotic_above, 0.025);
        assert_eq!(engine.predictor.min_rows, 30);
        assert_eq!(engine.predictor.forest.n_trees, 50);
        assert_eq!(engine.predictor.forest.seed, 7);
        assert!(engine.predictor.forest.bootstrap);
    }

    #[test]
    fn test_resolve_path_override_and_tilde() {
        assert_eq!(resolve_path("a.json", None), PathBuf::from("a.json"));
        assert_eq!(
            resolve_path("a.json", Some("/tmp/b.json".to_string())),
            PathBuf::from("/tmp/b.json")
        );
        assert_eq!(resolve_path("a.json", Some("  ".to_string())), PathBuf::from("a.json"));

        let expanded = resolve_path("~/prices", None);
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.ends_with("prices"));
    }
}
