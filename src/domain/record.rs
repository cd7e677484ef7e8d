//! Instrument Record
//!
//! Per-instrument tactical memory entry. Field names on disk keep the
//! Portuguese keys used by existing state files (`última_data`, ...); the
//! English names are accepted as aliases.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::position::PositionStatus;
use super::regime::Regime;
use super::signal::{sticky_decision, Decision};

/// Instrument identifier, e.g. `"WEGE3.SA"`
pub type InstrumentId = String;

/// Last known state of one instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentRecord {
    #[serde(rename = "última_data", alias = "last_date")]
    pub last_date: NaiveDate,

    #[serde(rename = "último_regime", alias = "last_regime")]
    pub last_regime: Regime,

    /// Sticky: only replaced when a new decision is emitted
    #[serde(
        rename = "última_decisão",
        alias = "last_decision",
        with = "sticky_decision",
        default
    )]
    pub last_decision: Option<Decision>,

    #[serde(rename = "último_preço", alias = "last_price")]
    pub last_price: f64,

    #[serde(rename = "posição", alias = "position", default)]
    pub position: PositionStatus,
}

impl InstrumentRecord {
    /// Label of the stored decision, `"N/A"` when none was ever emitted
    pub fn decision_label(&self) -> &'static str {
        self.last_decision
            .as_ref()
            .map(Decision::as_str)
            .unwrap_or(sticky_decision::NOT_AVAILABLE)
    }
}

/// Whole tactical memory: at most one record per instrument
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TacticalMemory {
    records: BTreeMap<InstrumentId, InstrumentRecord>,
}

impl TacticalMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, instrument: &str) -> Option<&InstrumentRecord> {
        self.records.get(instrument)
    }

    /// Insert or overwrite the record for an instrument
    pub fn upsert(&mut self, instrument: impl Into<InstrumentId>, record: InstrumentRecord) {
        self.records.insert(instrument.into(), record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&InstrumentId, &InstrumentRecord)> {
        self.records.iter()
    }
}
