//! Domain Layer - Core types for regime gating and tactical memory
//!
//! Pure domain types with no I/O except the state file persistence:
//! - `series`: validated price series
//! - `regime`: volatility regime labels
//! - `signal`: decisions and predicted directions
//! - `position`: open/closed position status
//! - `record`: per-instrument record and the whole tactical memory
//! - `state_persistence`: JSON file store for the tactical memory

pub mod series;
pub mod regime;
pub mod signal;
pub mod position;
pub mod record;
pub mod state_persistence;

use serde::{Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub use series::{PricePoint, PriceSeries, SeriesError};
pub use regime::Regime;
pub use signal::{Decision, Direction};
pub use position::PositionStatus;
pub use record::{InstrumentId, InstrumentRecord, TacticalMemory};
pub use state_persistence::{JsonStateStore, PersistError, StoreRecovery, DEFAULT_STATE_FILE};

/// Unrecognized label when parsing a stored enum value
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LabelError {
    #[error("Unknown regime label: {0}")]
    Regime(String),
    #[error("Unknown decision label: {0}")]
    Decision(String),
    #[error("Unknown position label: {0}")]
    Position(String),
}

/// Read a stored label through the type's `FromStr` parser, so files and
/// command-line input accept the same vocabulary
pub(crate) fn deserialize_label<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}
