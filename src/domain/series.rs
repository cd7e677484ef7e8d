//! Price Series
//!
//! Time-ascending closing prices for one instrument. A non-finite close is
//! treated as a missing observation rather than an error, so gaps in a data
//! feed flow through to the regime/predictor guards instead of aborting.

use chrono::{Duration, NaiveDate};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SeriesError {
    #[error("Price series is empty")]
    Empty,

    #[error("Timestamps out of order at index {index}: {previous} then {current}")]
    NotAscending {
        index: usize,
        previous: NaiveDate,
        current: NaiveDate,
    },

    #[error("Duplicate timestamp: {0}")]
    DuplicateTimestamp(NaiveDate),
}

/// One observation of the series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    /// Closing price; NaN marks a missing observation
    pub close: f64,
    /// Traded volume when the source provides it
    pub volume: Option<f64>,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close, volume: None }
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }

    /// Whether the close is a usable number
    pub fn has_close(&self) -> bool {
        self.close.is_finite()
    }
}

/// Validated, time-ascending price series
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series, rejecting empty input, unordered or duplicated dates
    pub fn new(points: Vec<PricePoint>) -> Result<Self, SeriesError> {
        if points.is_empty() {
            return Err(SeriesError::Empty);
        }

        for (index, pair) in points.windows(2).enumerate() {
            let (previous, current) = (pair[0].date, pair[1].date);
            if current == previous {
                return Err(SeriesError::DuplicateTimestamp(current));
            }
            if current < previous {
                return Err(SeriesError::NotAscending {
                    index: index + 1,
                    previous,
                    current,
                });
            }
        }

        Ok(Self { points })
    }

    /// Build a daily series starting at `start` from raw closes
    pub fn from_closes(start: NaiveDate, closes: &[f64]) -> Result<Self, SeriesError> {
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint::new(start + Duration::days(i as i64), close))
            .collect();
        Self::new(points)
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// All closes in order, missing observations included as NaN
    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    /// Closes with missing observations dropped
    pub fn valid_closes(&self) -> Vec<f64> {
        self.points
            .iter()
            .filter(|p| p.has_close())
            .map(|p| p.close)
            .collect()
    }

    /// Most recent non-missing close
    pub fn last_close(&self) -> Option<f64> {
        self.points.iter().rev().find(|p| p.has_close()).map(|p| p.close)
    }

    /// Date of the final observation
    pub fn last_date(&self) -> NaiveDate {
        // Non-empty by construction
        self.points[self.points.len() - 1].date
    }

    /// Mean of the last `n` available volumes
    pub fn average_volume(&self, n: usize) -> Option<f64> {
        let recent: Vec<f64> = self
            .points
            .iter()
            .rev()
            .filter_map(|p| p.volume.filter(|v| v.is_finite()))
            .take(n)
            .collect();

        if recent.is_empty() {
            return None;
        }
        Some(recent.iter().sum::<f64>() / recent.len() as f64)
    }
}
