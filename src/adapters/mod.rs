//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits and the outer surfaces:
//! - Price CSV: daily history files per instrument
//! - Watchlist: screening output naming operable instruments
//! - Export: flat CSV of analysis results
//! - CLI: Command-line interface handlers

pub mod cli;
pub mod export;
pub mod price_csv;
pub mod watchlist;

pub use cli::CliApp;
pub use export::{export_to_file, rows_from_memory, ExportError, ExportRow};
pub use price_csv::CsvPriceSource;
pub use watchlist::{Watchlist, WatchlistEntry, WatchlistError};
