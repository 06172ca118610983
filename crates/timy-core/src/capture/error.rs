//! Capture errors

use thiserror::Error;

use crate::protocol::{CodecError, TransportError};
use crate::store::StoreError;
use crate::timing::TimeFormatError;

/// Errors raised by the capture engine.
///
/// Only `DeviceNotFound`, `Fatal` and configuration errors ever reach the
/// caller of a capture run. The per-event kinds are logged and the event is
/// dropped.
#[derive(Error, Debug)]
pub enum CaptureError {
    /// No device matched the configured identifiers
    #[error("ALGE TIMY3 ({vendor_id:04x}:{product_id:04x}) not found. Time capture not possible.")]
    DeviceNotFound {
        /// Vendor id searched for
        vendor_id: u16,
        /// Product id searched for
        product_id: u16,
    },

    /// Frame bytes were not text
    #[error("Undecodable frame: {0}")]
    Decode(#[from] CodecError),

    /// Split time text was malformed
    #[error("Invalid split time: {0}")]
    TimeFormat(#[from] TimeFormatError),

    /// Order number was not 1-99
    #[error("Invalid order number '{0}' (expected 1-99)")]
    InvalidOrderNumber(String),

    /// The store rejected a record
    #[error("Failed to save split: {0}")]
    Persistence(#[from] StoreError),

    /// Transport failure that ends the capture
    #[error("Unrecoverable transport failure: {0}")]
    Fatal(#[from] TransportError),

    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Reading the configuration file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file is not valid JSON
    #[error("Malformed configuration file: {0}")]
    Json(#[from] serde_json::Error),
}
