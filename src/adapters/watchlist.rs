//! Watchlist
//!
//! Reads the screening output (`watchlist.json`): a JSON array of entries with
//! a ticker, a status and optional diagnostics. Only entries marked
//! `Operável` are fed into analysis.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Status marking an instrument as ready for analysis
pub const OPERABLE_STATUS: &str = "Operável";

#[derive(Debug, Error)]
pub enum WatchlistError {
    #[error("Failed to read watchlist: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse watchlist: {0}")]
    ParseError(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub ticker: String,
    pub status: String,
    /// Regime label at screening time; free text (may be an error marker)
    #[serde(default)]
    pub regime_atual: Option<String>,
    #[serde(default, rename = "acuracia_IA")]
    pub accuracy: Option<f64>,
    #[serde(default, rename = "volume_medio")]
    pub average_volume: Option<f64>,
}

impl WatchlistEntry {
    pub fn is_operable(&self) -> bool {
        self.status.trim() == OPERABLE_STATUS
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Watchlist {
    entries: Vec<WatchlistEntry>,
}

impl Watchlist {
    pub fn new(entries: Vec<WatchlistEntry>) -> Self {
        Self { entries }
    }

    pub fn load(path: &Path) -> Result<Self, WatchlistError> {
        let content = std::fs::read_to_string(path)?;
        let watchlist: Watchlist = serde_json::from_str(&content)?;
        tracing::debug!("Loaded {} watchlist entries from {:?}", watchlist.entries.len(), path);
        Ok(watchlist)
    }

    pub fn entries(&self) -> &[WatchlistEntry] {
        &self.entries
    }

    /// Tickers cleared for analysis, in file order
    pub fn operable(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.is_operable())
            .map(|e| e.ticker.clone())
            .collect()
    }
}
