//! TIMY USB Protocol Communication
//!
//! Implements the ASCII command/response dialect spoken by the ALGE TIMY 3
//! over its interrupt endpoints.
//!
//! Commands are plain ASCII words terminated by a carriage return. The device
//! answers with short whitespace-separated text frames, one per interrupt
//! transfer.

pub mod classify;
pub mod codec;
pub mod commands;
mod error;
pub mod transport;
#[cfg(feature = "usb")]
pub mod usb;

pub use classify::{classify, read_outcome, ErrorClass, ReadOutcome};
pub use codec::{decode_frame, encode_command, DecodedFrame, SplitEvent};
pub use commands::{Command, CommandSequencer, UnknownCommand};
pub use error::{CodecError, TransportError, TransportStatus};
pub use transport::{DeviceSession, Transport};
#[cfg(feature = "usb")]
pub use usb::UsbTransport;

/// USB vendor ID of the ALGE TIMY 3
pub const TIMY_VENDOR_ID: u16 = 0x0c4a;

/// USB product ID of the ALGE TIMY 3
pub const TIMY_PRODUCT_ID: u16 = 0x0889;

/// Interrupt input endpoint
pub const READ_ENDPOINT: u8 = 0x81;

/// Interrupt output endpoint
pub const WRITE_ENDPOINT: u8 = 0x01;

/// Size of a single interrupt read
pub const FRAME_SIZE: usize = 32;

/// Terminator appended to every command
pub const LINE_TERMINATOR: u8 = b'\r';

/// Marker field identifying a split-time report
pub const SPLIT_MARKER: &str = "c1M";

/// Default read timeout in milliseconds.
/// The device stays silent between competitors, so this is deliberately long.
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 720_000;

/// Default write timeout in milliseconds
pub const DEFAULT_WRITE_TIMEOUT_MS: u64 = 1000;

/// Delay between two poll iterations in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;
