//! USB device handling
//!
//! Provides libusb access to the TIMY through `rusb`.

use std::time::Duration;

use rusb::{DeviceHandle, GlobalContext};

use super::{DeviceSession, Transport, TransportError, TransportStatus};

/// Configuration value selected on open
const TIMY_CONFIGURATION: u8 = 1;

/// Interface carrying both interrupt endpoints
const TIMY_INTERFACE: u8 = 0;

impl From<rusb::Error> for TransportError {
    fn from(e: rusb::Error) -> Self {
        let status = match e {
            rusb::Error::Timeout => TransportStatus::TimedOut,
            rusb::Error::NoDevice => TransportStatus::NoDevice,
            _ => TransportStatus::Other,
        };
        TransportError::new(status, e.to_string())
    }
}

/// Transport backed by the system libusb
#[derive(Debug, Default, Clone, Copy)]
pub struct UsbTransport;

impl UsbTransport {
    /// Create a transport using the global libusb context
    pub fn new() -> Self {
        Self
    }
}

impl Transport for UsbTransport {
    fn open(
        &mut self,
        vendor_id: u16,
        product_id: u16,
    ) -> Result<Option<Box<dyn DeviceSession>>, TransportError> {
        match rusb::open_device_with_vid_pid(vendor_id, product_id) {
            Some(handle) => {
                tracing::debug!(
                    "Opened USB device {:04x}:{:04x}",
                    vendor_id,
                    product_id
                );
                Ok(Some(Box::new(UsbSession::new(handle))))
            }
            None => Ok(None),
        }
    }
}

/// An opened TIMY on the USB bus
pub struct UsbSession {
    handle: DeviceHandle<GlobalContext>,
    claimed: bool,
}

impl UsbSession {
    fn new(handle: DeviceHandle<GlobalContext>) -> Self {
        Self {
            handle,
            claimed: false,
        }
    }
}

impl DeviceSession for UsbSession {
    fn configure(&mut self) -> Result<(), TransportError> {
        // Not supported on every platform; a bound kernel driver then shows up
        // as Busy on claim.
        if let Err(e) = self.handle.set_auto_detach_kernel_driver(true) {
            tracing::debug!("Kernel driver auto-detach unavailable: {} (continuing)", e);
        }

        match self.handle.set_active_configuration(TIMY_CONFIGURATION) {
            Ok(()) => {}
            // Already configured by the OS
            Err(rusb::Error::Busy) => {
                tracing::debug!("Configuration {} already active", TIMY_CONFIGURATION)
            }
            Err(e) => return Err(e.into()),
        }

        self.handle.claim_interface(TIMY_INTERFACE)?;
        self.claimed = true;
        Ok(())
    }

    fn write(
        &mut self,
        endpoint: u8,
        data: &[u8],
        timeout: Duration,
    ) -> Result<usize, TransportError> {
        Ok(self.handle.write_interrupt(endpoint, data, timeout)?)
    }

    fn read(
        &mut self,
        endpoint: u8,
        max_len: usize,
        timeout: Duration,
    ) -> Result<Vec<u8>, TransportError> {
        let mut buffer = vec![0u8; max_len];
        let n = self.handle.read_interrupt(endpoint, &mut buffer, timeout)?;
        buffer.truncate(n);
        Ok(buffer)
    }

    fn reset(&mut self) -> Result<(), TransportError> {
        Ok(self.handle.reset()?)
    }
}

impl Drop for UsbSession {
    fn drop(&mut self) {
        if self.claimed {
            let _ = self.handle.release_interface(TIMY_INTERFACE);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{classify, ErrorClass};

    #[test]
    fn test_rusb_error_mapping() {
        let timeout: TransportError = rusb::Error::Timeout.into();
        assert_eq!(timeout.status, TransportStatus::TimedOut);
        assert_eq!(classify(&timeout), ErrorClass::Timeout);

        let gone: TransportError = rusb::Error::NoDevice.into();
        assert_eq!(classify(&gone), ErrorClass::Disconnected);

        let pipe: TransportError = rusb::Error::Pipe.into();
        assert_eq!(pipe.status, TransportStatus::Other);
        assert_eq!(classify(&pipe), ErrorClass::Fatal);
    }
}
