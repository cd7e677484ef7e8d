//! Flat CSV export of analysis results
//!
//! One row per instrument: `Ativo, Data, Preço, Regime, Decisão, Posição`.

use csv::Writer;
use serde::Serialize;
use std::path::Path;
use thiserror::Error;

use crate::application::AnalysisReport;
use crate::domain::signal::sticky_decision;
use crate::domain::{InstrumentRecord, TacticalMemory};

/// Column names, matching the serde renames on `ExportRow`
pub const HEADER: [&str; 6] = ["Ativo", "Data", "Preço", "Regime", "Decisão", "Posição"];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write export: {0}")]
    WriteError(#[from] csv::Error),
    #[error("Failed to flush export: {0}")]
    IoError(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    #[serde(rename = "Ativo")]
    pub instrument: String,
    #[serde(rename = "Data")]
    pub date: String,
    #[serde(rename = "Preço")]
    pub price: f64,
    #[serde(rename = "Regime")]
    pub regime: String,
    #[serde(rename = "Decisão")]
    pub decision: String,
    #[serde(rename = "Posição")]
    pub position: String,
}

impl ExportRow {
    pub fn from_record(instrument: &str, record: &InstrumentRecord) -> Self {
        Self {
            instrument: instrument.to_string(),
            date: record.last_date.to_string(),
            price: record.last_price,
            regime: record.last_regime.to_string(),
            decision: record.decision_label().to_string(),
            position: record.position.to_string(),
        }
    }

    pub fn from_report(report: &AnalysisReport) -> Self {
        Self {
            instrument: report.instrument.clone(),
            date: report.date.to_string(),
            price: report.price,
            regime: report.regime.to_string(),
            decision: report
                .last_decision
                .map(|d| d.to_string())
                .unwrap_or_else(|| sticky_decision::NOT_AVAILABLE.to_string()),
            position: report.position.to_string(),
        }
    }
}

/// Rows for every stored instrument, in key order
pub fn rows_from_memory(memory: &TacticalMemory) -> Vec<ExportRow> {
    memory
        .iter()
        .map(|(id, record)| ExportRow::from_record(id, record))
        .collect()
}

/// Write rows as CSV to any writer; the header is written even with no rows
pub fn write_rows<W: std::io::Write>(writer: W, rows: &[ExportRow]) -> Result<(), ExportError> {
    let mut writer = Writer::from_writer(writer);
    if rows.is_empty() {
        writer.write_record(HEADER)?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write rows as CSV to a file
pub fn export_to_file(path: &Path, rows: &[ExportRow]) -> Result<(), ExportError> {
    let file = std::fs::File::create(path)?;
    write_rows(file, rows)?;
    tracing::info!("Exported {} rows to {:?}", rows.len(), path);
    Ok(())
}
