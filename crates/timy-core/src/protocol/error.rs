//! Protocol errors

use std::fmt;

use thiserror::Error;

/// Status reported by the transport for a failed endpoint transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportStatus {
    /// The transfer timed out before any data arrived
    TimedOut,
    /// The device is gone (unplugged or powered off)
    NoDevice,
    /// Raw OS error number reported by the driver
    Os(i32),
    /// Any other backend failure
    Other,
}

impl fmt::Display for TransportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportStatus::TimedOut => write!(f, "timed out"),
            TransportStatus::NoDevice => write!(f, "no device"),
            TransportStatus::Os(code) => write!(f, "os error {}", code),
            TransportStatus::Other => write!(f, "other"),
        }
    }
}

/// Failure of a single transfer on the device transport
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("USB transfer failed ({status}): {message}")]
pub struct TransportError {
    /// Status code of the failed transfer
    pub status: TransportStatus,
    /// Backend message
    pub message: String,
}

impl TransportError {
    /// Build from a status and backend message
    pub fn new(status: TransportStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Transfer timeout
    pub fn timed_out() -> Self {
        Self::new(TransportStatus::TimedOut, "Operation timed out")
    }

    /// Device gone
    pub fn no_device() -> Self {
        Self::new(
            TransportStatus::NoDevice,
            "No such device (it may have been disconnected)",
        )
    }

    /// Build from a raw OS error number
    pub fn from_os(code: i32, message: impl Into<String>) -> Self {
        Self::new(TransportStatus::Os(code), message)
    }
}

/// Errors raised while decoding device frames
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Frame bytes are not UTF-8
    #[error("Frame is not valid UTF-8: {0}")]
    InvalidEncoding(#[from] std::str::Utf8Error),
}
