use crate::domain::{PersistError, TacticalMemory};

/// Whole-document store for the tactical memory.
///
/// `load` never fails: a missing or unusable backing store reads as empty.
/// `save` replaces everything and reports failures.
pub trait StateStore {
    fn load(&self) -> TacticalMemory;

    fn save(&self, memory: &TacticalMemory) -> Result<(), PersistError>;
}
