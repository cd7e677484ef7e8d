use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::{MarketDataError, PriceSource, StateStore};
use crate::domain::{PersistError, PriceSeries, TacticalMemory};

/// Mock price source that records calls and serves configured series
#[derive(Debug, Default, Clone)]
pub struct MockPriceSource {
    calls: Arc<Mutex<Vec<String>>>,
    series: Arc<Mutex<HashMap<String, PriceSeries>>>,
}

impl MockPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to serve a series for an instrument
    pub fn with_series(self, instrument: &str, series: PriceSeries) -> Self {
        self.set_series(instrument, series);
        self
    }

    /// Replace the series served for an instrument
    pub fn set_series(&self, instrument: &str, series: PriceSeries) {
        self.series.lock().unwrap().insert(instrument.to_string(), series);
    }

    /// Get all recorded calls
    pub fn get_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl PriceSource for MockPriceSource {
    fn fetch_series(&self, instrument: &str) -> Result<PriceSeries, MarketDataError> {
        self.calls.lock().unwrap().push(instrument.to_string());
        self.series
            .lock()
            .unwrap()
            .get(instrument)
            .cloned()
            .ok_or_else(|| MarketDataError::NotFound(instrument.to_string()))
    }
}

/// In-memory state store that counts saves and can be told to fail them
#[derive(Debug, Default, Clone)]
pub struct InMemoryStateStore {
    memory: Arc<Mutex<TacticalMemory>>,
    saves: Arc<Mutex<usize>>,
    fail_saves: bool,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to seed the stored memory
    pub fn with_memory(self, memory: TacticalMemory) -> Self {
        *self.memory.lock().unwrap() = memory;
        self
    }

    /// Builder method making every save fail
    pub fn failing(mut self) -> Self {
        self.fail_saves = true;
        self
    }

    pub fn snapshot(&self) -> TacticalMemory {
        self.memory.lock().unwrap().clone()
    }

    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap()
    }
}

impl StateStore for InMemoryStateStore {
    fn load(&self) -> TacticalMemory {
        self.snapshot()
    }

    fn save(&self, memory: &TacticalMemory) -> Result<(), PersistError> {
        if self.fail_saves {
            return Err(PersistError::WriteError("store is read-only".to_string()));
        }
        *self.memory.lock().unwrap() = memory.clone();
        *self.saves.lock().unwrap() += 1;
        Ok(())
    }
}
