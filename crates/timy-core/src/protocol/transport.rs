//! Device transport abstraction
//!
//! The capture engine never touches libusb directly. It talks to a
//! [`Transport`] to discover the device and to the returned
//! [`DeviceSession`] for every transfer, so tests and demo mode can plug in
//! their own implementations.

use std::time::Duration;

use super::TransportError;

/// Opens device sessions by USB identifiers
pub trait Transport: Send {
    /// Open the first device matching the identifiers.
    ///
    /// Returns `Ok(None)` when no such device is attached.
    fn open(
        &mut self,
        vendor_id: u16,
        product_id: u16,
    ) -> Result<Option<Box<dyn DeviceSession>>, TransportError>;
}

/// An opened device, exclusively owned by one capture engine
pub trait DeviceSession: Send {
    /// Select the active configuration and claim the interface
    fn configure(&mut self) -> Result<(), TransportError>;

    /// Write bytes to an output endpoint, returning the number written
    fn write(
        &mut self,
        endpoint: u8,
        data: &[u8],
        timeout: Duration,
    ) -> Result<usize, TransportError>;

    /// Read at most `max_len` bytes from an input endpoint.
    ///
    /// Blocks until data arrives or `timeout` elapses. An in-flight read
    /// cannot be interrupted.
    fn read(
        &mut self,
        endpoint: u8,
        max_len: usize,
        timeout: Duration,
    ) -> Result<Vec<u8>, TransportError>;

    /// Reset the device so a later discovery can reopen it cleanly
    fn reset(&mut self) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn open(
        &mut self,
        vendor_id: u16,
        product_id: u16,
    ) -> Result<Option<Box<dyn DeviceSession>>, TransportError> {
        (**self).open(vendor_id, product_id)
    }
}
