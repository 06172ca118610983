//! Transport failure classification
//!
//! Turns raw transfer failures into the three outcomes the capture loop
//! cares about.

use super::{TransportError, TransportStatus};

/// `ENODEV` as reported by libusb backends on Linux and macOS
const ERRNO_NO_DEVICE: i32 = 19;
/// `ETIMEDOUT` on macOS/BSD
const ERRNO_TIMED_OUT_BSD: i32 = 60;
/// `ETIMEDOUT` on Linux
const ERRNO_TIMED_OUT_LINUX: i32 = 110;

/// How the capture loop must react to a transport failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// No data within the read timeout; keep polling
    Timeout,
    /// Device was unplugged; stop gracefully
    Disconnected,
    /// Anything else; abort the session
    Fatal,
}

/// Classify a transport failure
pub fn classify(error: &TransportError) -> ErrorClass {
    match error.status {
        TransportStatus::TimedOut
        | TransportStatus::Os(ERRNO_TIMED_OUT_BSD)
        | TransportStatus::Os(ERRNO_TIMED_OUT_LINUX) => ErrorClass::Timeout,
        TransportStatus::NoDevice | TransportStatus::Os(ERRNO_NO_DEVICE) => {
            ErrorClass::Disconnected
        }
        TransportStatus::Os(_) | TransportStatus::Other => ErrorClass::Fatal,
    }
}

/// Result of one bounded endpoint read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Bytes received from the device
    Data(Vec<u8>),
    /// The read timeout elapsed with no data
    Timeout,
    /// The device disappeared
    Disconnected,
    /// Unrecoverable transfer failure
    Fatal(TransportError),
}

/// Tag a raw read result
pub fn read_outcome(result: Result<Vec<u8>, TransportError>) -> ReadOutcome {
    match result {
        Ok(data) => ReadOutcome::Data(data),
        Err(e) => match classify(&e) {
            ErrorClass::Timeout => ReadOutcome::Timeout,
            ErrorClass::Disconnected => ReadOutcome::Disconnected,
            ErrorClass::Fatal => ReadOutcome::Fatal(e),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_statuses() {
        assert_eq!(classify(&TransportError::timed_out()), ErrorClass::Timeout);
        assert_eq!(
            classify(&TransportError::from_os(60, "Operation timed out")),
            ErrorClass::Timeout
        );
        assert_eq!(
            classify(&TransportError::from_os(110, "Connection timed out")),
            ErrorClass::Timeout
        );
    }

    #[test]
    fn test_disconnect_statuses() {
        assert_eq!(
            classify(&TransportError::no_device()),
            ErrorClass::Disconnected
        );
        assert_eq!(
            classify(&TransportError::from_os(19, "No such device")),
            ErrorClass::Disconnected
        );
    }

    #[test]
    fn test_everything_else_is_fatal() {
        assert_eq!(
            classify(&TransportError::from_os(5, "Input/output error")),
            ErrorClass::Fatal
        );
        assert_eq!(
            classify(&TransportError::new(TransportStatus::Other, "Pipe error")),
            ErrorClass::Fatal
        );
    }

    #[test]
    fn test_read_outcome_keeps_fatal_error() {
        let err = TransportError::from_os(13, "Access denied");
        assert_eq!(read_outcome(Err(err.clone())), ReadOutcome::Fatal(err));
        assert_eq!(read_outcome(Ok(b"x".to_vec())), ReadOutcome::Data(b"x".to_vec()));
        assert_eq!(
            read_outcome(Err(TransportError::timed_out())),
            ReadOutcome::Timeout
        );
    }
}
