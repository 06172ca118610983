//! In-memory store

use std::sync::{Arc, Mutex};

use super::{SplitStore, StoreError, TimeRecord};

/// Keeps records in memory.
///
/// Clones share the same buffer, so a caller can keep one handle while the
/// engine owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<Mutex<Vec<TimeRecord>>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all saved records
    pub fn records(&self) -> Vec<TimeRecord> {
        self.records
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Number of saved records
    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// Whether nothing has been saved
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove all saved records
    pub fn clear(&self) {
        if let Ok(mut records) = self.records.lock() {
            records.clear();
        }
    }
}

impl SplitStore for MemoryStore {
    fn save(&mut self, record: TimeRecord) -> Result<(), StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Unavailable("record buffer poisoned".to_string()))?
            .push(record);
        Ok(())
    }
}
