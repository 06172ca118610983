//! Split Time Capture
//!
//! Runs the TIMY poll loop and feeds captured splits to a store.
//!
//! The loop is blocking. Run it on a dedicated thread, or through
//! [`spawn_capture`] from async code, and stop it with a [`CaptureHandle`].

mod config;
mod engine;
mod error;

pub use config::CaptureConfig;
pub use engine::{
    build_record, CaptureEngine, CaptureHandle, CaptureOutcome, CaptureReport, CaptureState,
};
pub use error::CaptureError;

use tokio::task::JoinHandle;

/// Run a capture on Tokio's blocking pool.
///
/// Take a [`CaptureHandle`] from the engine first if the loop must be
/// stoppable. Must be called from within a Tokio runtime.
pub fn spawn_capture(engine: CaptureEngine) -> JoinHandle<Result<CaptureReport, CaptureError>> {
    tokio::task::spawn_blocking(move || engine.start())
}
