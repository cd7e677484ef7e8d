//! Configuration Module
//!
//! Loads and validates configuration from TOML files.

pub mod loader;

pub use loader::{
    Config, ConfigError, load_config, PRICES_DIR_ENV, STATE_FILE_ENV,
};
