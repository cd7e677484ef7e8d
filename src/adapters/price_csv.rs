//! CSV Price Files
//!
//! Reads daily history from `<dir>/<TICKER>.csv`. The header must contain
//! `Date` and `Close` (any case); `Volume` is optional. A blank or unparsable
//! close is kept as a missing observation. Rows are sorted by date before the
//! series is validated.

use chrono::{NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use std::fs::File;
use std::path::PathBuf;

use crate::domain::{PricePoint, PriceSeries};
use crate::ports::{MarketDataError, PriceSource};

/// Price source backed by a directory of CSV files
#[derive(Debug, Clone)]
pub struct CsvPriceSource {
    dir: PathBuf,
}

impl CsvPriceSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File expected to hold the instrument's history
    pub fn file_for(&self, instrument: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", instrument))
    }
}

impl PriceSource for CsvPriceSource {
    fn fetch_series(&self, instrument: &str) -> Result<PriceSeries, MarketDataError> {
        let path = self.file_for(instrument);
        if !path.is_file() {
            return Err(MarketDataError::NotFound(instrument.to_string()));
        }

        let file = File::open(&path)
            .map_err(|e| MarketDataError::ParseError(format!("Failed to open {:?}: {}", path, e)))?;
        let points = read_points(file, instrument)?;

        tracing::debug!("Loaded {} rows for {} from {:?}", points.len(), instrument, path);
        Ok(PriceSeries::new(points)?)
    }
}

fn column(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| raw.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()))
}

fn parse_number(raw: Option<&str>) -> f64 {
    raw.and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(f64::NAN)
}

/// Parse CSV rows into points sorted by date
pub fn read_points<R: std::io::Read>(reader: R, instrument: &str) -> Result<Vec<PricePoint>, MarketDataError> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = reader
        .headers()
        .map_err(|e| MarketDataError::ParseError(e.to_string()))?
        .clone();

    let missing = |column: &str| MarketDataError::MissingColumn {
        instrument: instrument.to_string(),
        column: column.to_string(),
    };
    let date_idx = column(&headers, "date").ok_or_else(|| missing("Date"))?;
    let close_idx = column(&headers, "close").ok_or_else(|| missing("Close"))?;
    let volume_idx = column(&headers, "volume");

    let mut points = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|e| MarketDataError::ParseError(e.to_string()))?;
        let raw_date = record.get(date_idx).unwrap_or_default();
        let date = parse_date(raw_date).ok_or_else(|| {
            MarketDataError::ParseError(format!("Row {}: invalid date '{}'", line + 1, raw_date))
        })?;

        let mut point = PricePoint::new(date, parse_number(record.get(close_idx)));
        if let Some(idx) = volume_idx {
            let volume = parse_number(record.get(idx));
            if volume.is_finite() {
                point = point.with_volume(volume);
            }
        }
        points.push(point);
    }

    if points.is_empty() {
        return Err(MarketDataError::Empty(instrument.to_string()));
    }

    points.sort_by_key(|p| p.date);
    Ok(points)
}
