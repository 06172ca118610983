//! Capture configuration

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use super::CaptureError;
use crate::protocol::{
    Command, DEFAULT_POLL_INTERVAL_MS, DEFAULT_READ_TIMEOUT_MS, DEFAULT_WRITE_TIMEOUT_MS,
    FRAME_SIZE, READ_ENDPOINT, TIMY_PRODUCT_ID, TIMY_VENDOR_ID, WRITE_ENDPOINT,
};

/// Capture engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// USB vendor ID to open
    pub vendor_id: u16,
    /// USB product ID to open
    pub product_id: u16,
    /// Interrupt input endpoint
    pub read_endpoint: u8,
    /// Interrupt output endpoint
    pub write_endpoint: u8,
    /// Bytes requested per read
    pub frame_size: usize,
    /// Read timeout in milliseconds.
    /// Also bounds how long a stop request can take to be honoured.
    pub read_timeout_ms: u64,
    /// Write timeout in milliseconds
    pub write_timeout_ms: u64,
    /// Delay between poll iterations in milliseconds
    pub poll_interval_ms: u64,
    /// Commands sent once at session start, in order
    pub init_commands: Vec<String>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            vendor_id: TIMY_VENDOR_ID,
            product_id: TIMY_PRODUCT_ID,
            read_endpoint: READ_ENDPOINT,
            write_endpoint: WRITE_ENDPOINT,
            frame_size: FRAME_SIZE,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            write_timeout_ms: DEFAULT_WRITE_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            init_commands: Command::default_sequence(),
        }
    }
}

impl CaptureConfig {
    /// Load from a JSON file; missing fields keep their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CaptureError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the engine cannot work with
    pub fn validate(&self) -> Result<(), CaptureError> {
        if self.frame_size == 0 {
            return Err(CaptureError::Config("frame_size must be positive".to_string()));
        }
        if self.read_timeout_ms == 0 {
            // libusb treats 0 as "wait forever", which makes stop requests unreachable
            return Err(CaptureError::Config(
                "read_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Read timeout as a duration
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Write timeout as a duration
    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    /// Delay between loop iterations
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
