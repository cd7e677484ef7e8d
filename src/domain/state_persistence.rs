//! Tactical Memory Persistence
//!
//! Stores the whole instrument -> record mapping as one pretty-printed JSON
//! document. Every save replaces the entire file; there are no partial updates.
//!
//! Loading never fails from the caller's point of view: a missing, unreadable
//! or malformed file yields an empty memory. Saving propagates errors.
//!
//! Only one process is expected to use a given state file at a time. Two
//! processes saving concurrently will race and the last rename wins.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

use super::record::TacticalMemory;
use crate::ports::StateStore;

/// Default state file name
pub const DEFAULT_STATE_FILE: &str = "estado_fractalis.json";

#[derive(Error, Debug, Clone)]
pub enum PersistError {
    #[error("Failed to serialize tactical memory: {0}")]
    SerializationError(String),

    #[error("Failed to deserialize tactical memory: {0}")]
    DeserializationError(String),

    #[error("Failed to write state file: {0}")]
    WriteError(String),

    #[error("Failed to read state file: {0}")]
    ReadError(String),

    #[error("Failed to create directory: {0}")]
    DirectoryError(String),
}

/// Outcome of inspecting the state file
#[derive(Debug, Clone)]
pub enum StoreRecovery {
    /// No state file (or an empty one)
    Empty,
    /// State loaded successfully
    Loaded(TacticalMemory),
    /// File exists but could not be read or parsed
    Corrupted(String),
}

impl StoreRecovery {
    /// Collapse to a usable memory, treating corruption as empty
    pub fn into_memory(self) -> TacticalMemory {
        match self {
            StoreRecovery::Loaded(memory) => memory,
            StoreRecovery::Empty | StoreRecovery::Corrupted(_) => TacticalMemory::new(),
        }
    }
}

/// JSON file backed tactical memory store
#[derive(Debug, Clone)]
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store using the default file name inside `data_dir`
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(DEFAULT_STATE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the state file, reporting corruption instead of hiding it
    pub fn load_checked(&self) -> StoreRecovery {
        if !self.path.exists() {
            return StoreRecovery::Empty;
        }

        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => return StoreRecovery::Corrupted(PersistError::ReadError(e.to_string()).to_string()),
        };

        if content.trim().is_empty() {
            return StoreRecovery::Empty;
        }

        match serde_json::from_str::<TacticalMemory>(&content) {
            Ok(memory) => StoreRecovery::Loaded(memory),
            Err(e) => StoreRecovery::Corrupted(
                PersistError::DeserializationError(e.to_string()).to_string(),
            ),
        }
    }

    fn write_atomically(&self, content: &str) -> Result<(), PersistError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| PersistError::DirectoryError(e.to_string()))?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| PersistError::WriteError(e.to_string()))?;
        tmp.write_all(content.as_bytes())
            .map_err(|e| PersistError::WriteError(e.to_string()))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| PersistError::WriteError(e.to_string()))?;
        tmp.persist(&self.path)
            .map_err(|e| PersistError::WriteError(e.error.to_string()))?;

        Ok(())
    }
}

impl StateStore for JsonStateStore {
    fn load(&self) -> TacticalMemory {
        match self.load_checked() {
            StoreRecovery::Loaded(memory) => {
                tracing::debug!(
                    "Tactical memory loaded: {} instrument(s) from {}",
                    memory.len(),
                    self.path.display()
                );
                memory
            }
            StoreRecovery::Empty => TacticalMemory::new(),
            StoreRecovery::Corrupted(reason) => {
                tracing::warn!(
                    "State file {} unusable, starting from empty memory: {}",
                    self.path.display(),
                    reason
                );
                TacticalMemory::new()
            }
        }
    }

    fn save(&self, memory: &TacticalMemory) -> Result<(), PersistError> {
        let content = serde_json::to_string_pretty(memory)
            .map_err(|e| PersistError::SerializationError(e.to_string()))?;

        self.write_atomically(&content)?;

        tracing::info!(
            "Tactical memory saved: {} instrument(s) to {}",
            memory.len(),
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Decision, InstrumentRecord, PositionStatus, Regime};
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn record(position: PositionStatus, decision: Option<Decision>) -> InstrumentRecord {
        InstrumentRecord {
            last_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            last_regime: Regime::Stable,
            last_decision: decision,
            last_price: 10.25,
            position,
        }
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = JsonStateStore::new(dir.path().join("missing.json"));

        assert!(matches!(store.load_checked(), StoreRecovery::Empty));
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let store = JsonStateStore::in_dir(dir.path());

        let mut memory = TacticalMemory::new();
        memory.upsert("WEGE3.SA", record(PositionStatus::Open, Some(Decision::Buy)));
        memory.upsert("PETR4.SA", record(PositionStatus::Closed, None));
        store.save(&memory).unwrap();

        assert_eq!(store.load(), memory);
    }

    #[test]
    fn test_save_replaces_whole_document() {
        let dir = tempdir().unwrap();
        let store = JsonStateStore::in_dir(dir.path());

        let mut first = TacticalMemory::new();
        first.upsert("A", record(PositionStatus::Open, Some(Decision::Buy)));
        first.upsert("B", record(PositionStatus::Open, Some(Decision::Sell)));
        store.save(&first).unwrap();

        let mut second = TacticalMemory::new();
        second.upsert("B", record(PositionStatus::Closed, Some(Decision::Close)));
        store.save(&second).unwrap();

        let loaded = store.load();
        assert_eq!(loaded.len(), 1);
        assert!(loaded.get("A").is_none());
        assert_eq!(loaded.get("B").unwrap().last_decision, Some(Decision::Close));
    }

    #[test]
    fn test_corrupted_file_loads_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{ not json").unwrap();

        let store = JsonStateStore::new(&path);
        assert!(matches!(store.load_checked(), StoreRecovery::Corrupted(_)));
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_mixed_case_labels_keep_every_record() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(
            &path,
            r#"{
                "WEGE3.SA": {"última_data": "2024-05-17", "último_regime": "Estável", "última_decisão": "BUY", "último_preço": 36.4, "posição": "Aberta"},
                "VALE3.SA": {"última_data": "2024-05-17", "último_regime": "caotico", "última_decisão": "sell", "último_preço": 61.0, "posição": "oPen"}
            }"#,
        )
        .unwrap();

        let store = JsonStateStore::new(&path);
        let mut memory = match store.load_checked() {
            StoreRecovery::Loaded(memory) => memory,
            other => panic!("expected a loaded memory, got {:?}", other),
        };
        assert_eq!(memory.get("VALE3.SA").unwrap().position, PositionStatus::Open);

        memory.upsert("X", record(PositionStatus::Closed, None));
        store.save(&memory).unwrap();

        let reloaded = store.load();
        assert_eq!(reloaded.len(), 3);
        assert!(reloaded.get("WEGE3.SA").is_some());
        assert_eq!(reloaded.get("VALE3.SA").unwrap().last_regime, Regime::Chaotic);
    }

    #[test]
    fn test_wrong_shape_loads_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        let store = JsonStateStore::new(&path);
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_blank_file_is_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "  \n").unwrap();

        assert!(matches!(JsonStateStore::new(&path).load_checked(), StoreRecovery::Empty));
    }

    #[test]
    fn test_save_creates_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("state.json");
        let store = JsonStateStore::new(&path);

        store.save(&TacticalMemory::new()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_saved_file_is_human_readable() {
        let dir = tempdir().unwrap();
        let store = JsonStateStore::in_dir(dir.path());

        let mut memory = TacticalMemory::new();
        memory.upsert("WEGE3.SA", record(PositionStatus::Open, Some(Decision::Buy)));
        store.save(&memory).unwrap();

        let content = fs::read_to_string(store.path()).unwrap();
        assert!(content.contains('\n'));
        assert!(content.contains("\"última_decisão\": \"BUY\""));
    }

    #[test]
    fn test_save_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        let store = JsonStateStore::in_dir(dir.path());
        store.save(&TacticalMemory::new()).unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_recovery_into_memory() {
        assert!(StoreRecovery::Corrupted("bad".to_string()).into_memory().is_empty());
        assert!(StoreRecovery::Empty.into_memory().is_empty());
    }
}
