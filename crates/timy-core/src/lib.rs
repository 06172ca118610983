//! # TIMY Core Library
//!
//! Split-time capture for the ALGE TIMY 3 timing device.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - The TIMY USB command/frame dialect
//! - Split time parsing and formatting
//! - The capture engine (session lifecycle and poll loop)
//! - Storage for captured splits
//! - A simulated device for running without hardware
//!
//! ## Example
//!
//! ```rust,ignore
//! use timy_core::prelude::*;
//!
//! let store = MemoryStore::new();
//! let engine = CaptureEngine::connect(
//!     CaptureConfig::default(),
//!     &mut UsbTransport::new(),
//!     Box::new(store.clone()),
//! )?;
//!
//! let handle = engine.handle();
//! std::thread::spawn(move || engine.start());
//!
//! // later, from anywhere
//! handle.request_stop();
//! ```

pub mod capture;
pub mod demo;
pub mod protocol;
pub mod store;
pub mod timing;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::capture::{
        spawn_capture, CaptureConfig, CaptureEngine, CaptureError, CaptureHandle,
        CaptureOutcome, CaptureReport, CaptureState,
    };
    pub use crate::demo::DemoTransport;
    pub use crate::protocol::{DeviceSession, Transport, TransportError};
    #[cfg(feature = "usb")]
    pub use crate::protocol::UsbTransport;
    pub use crate::store::{JsonLinesStore, MemoryStore, SplitStore, TimeRecord};
    pub use crate::timing::{format_split_time, parse_split_time};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
