use thiserror::Error;

use crate::domain::{PriceSeries, SeriesError};

/// Market data error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketDataError {
    #[error("No price data found for {0}")]
    NotFound(String),

    #[error("Price data for {instrument} has no '{column}' column")]
    MissingColumn { instrument: String, column: String },

    #[error("Price data for {0} is empty")]
    Empty(String),

    #[error("Data parsing error: {0}")]
    ParseError(String),

    #[error("Invalid series: {0}")]
    InvalidSeries(#[from] SeriesError),
}

/// Source of historical closing prices for an instrument.
///
/// Implementations own any blocking I/O; the analysis core only sees the
/// finished series.
pub trait PriceSource {
    fn fetch_series(&self, instrument: &str) -> Result<PriceSeries, MarketDataError>;
}
