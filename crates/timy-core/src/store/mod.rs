//! Split Time Storage
//!
//! The capture engine hands every converted split to a [`SplitStore`]. The
//! engine does not care where records end up.

mod jsonl;
mod memory;

pub use jsonl::JsonLinesStore;
pub use memory::MemoryStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::timing::serde_split_time;

/// A captured split, ready for persistence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRecord {
    /// Run time since midnight, hundredth resolution
    #[serde(with = "serde_split_time")]
    pub time_measured: Duration,
    /// Order number reported by the device (1-99)
    pub order_number: u8,
    /// When the split was captured
    pub captured_at: DateTime<Utc>,
}

impl TimeRecord {
    /// Create a record stamped with the current time
    pub fn new(time_measured: Duration, order_number: u8) -> Self {
        Self {
            time_measured,
            order_number,
            captured_at: Utc::now(),
        }
    }
}

/// Storage failures
#[derive(Error, Debug)]
pub enum StoreError {
    /// File access failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Record could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend refused the write
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Destination for captured splits
pub trait SplitStore: Send {
    /// Persist one record
    fn save(&mut self, record: TimeRecord) -> Result<(), StoreError>;
}
