//! Frame encoding/decoding
//!
//! Outgoing commands are ASCII words followed by a carriage return.
//! Incoming frames are whitespace-separated text. A split-time report looks
//! like:
//!
//! ```text
//! 001 c1M 00:00:10.82 07
//! ^   ^   ^           ^
//! |   |   |           order number (competitor/lane, 1-99)
//! |   |   run time HH:MM:SS.ff
//! |   marker
//! sequence number
//! ```

use super::{CodecError, LINE_TERMINATOR, SPLIT_MARKER};

/// Encode a command for transmission
pub fn encode_command(cmd: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(cmd.len() + 1);
    bytes.extend_from_slice(cmd.as_bytes());
    bytes.push(LINE_TERMINATOR);
    bytes
}

/// Decode a raw frame into its text fields.
///
/// NUL padding is treated like whitespace. An empty frame decodes to no
/// fields.
pub fn decode_frame(raw: &[u8]) -> Result<DecodedFrame, CodecError> {
    let text = std::str::from_utf8(raw)?;
    let fields = text
        .split(|c: char| c.is_whitespace() || c == '\0')
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect();
    Ok(DecodedFrame { fields })
}

/// A frame split into fields
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DecodedFrame {
    /// Fields in wire order
    pub fields: Vec<String>,
}

impl DecodedFrame {
    /// Whether the frame carried no fields at all
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Extract the split event, if this frame is one
    pub fn split_event(&self) -> Option<SplitEvent> {
        match self.fields.as_slice() {
            [sequence, marker, duration, order] if marker == SPLIT_MARKER => Some(SplitEvent {
                sequence: sequence.clone(),
                raw_duration: duration.clone(),
                order_number: order.clone(),
            }),
            _ => None,
        }
    }
}

/// A split-time report as it came off the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitEvent {
    /// Device sequence number (first field)
    pub sequence: String,
    /// Run time, expected as `HH:MM:SS.ff`
    pub raw_duration: String,
    /// Order number, expected in 1..=99
    pub order_number: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_appends_carriage_return() {
        assert_eq!(encode_command("TIMYINIT"), b"TIMYINIT\r".to_vec());
        assert_eq!(encode_command(""), b"\r".to_vec());
    }

    #[test]
    fn test_decode_split_frame() {
        let frame = decode_frame(b"001 c1M 00:00:10.82 07\r").unwrap();
        assert_eq!(frame.fields, vec!["001", "c1M", "00:00:10.82", "07"]);

        let event = frame.split_event().unwrap();
        assert_eq!(event.sequence, "001");
        assert_eq!(event.raw_duration, "00:00:10.82");
        assert_eq!(event.order_number, "07");
    }

    #[test]
    fn test_decode_empty_frame() {
        let frame = decode_frame(b"").unwrap();
        assert!(frame.is_empty());
        assert!(frame.split_event().is_none());
    }

    #[test]
    fn test_decode_nul_padding() {
        let mut raw = b"002 c1M 00:01:02.03 12".to_vec();
        raw.resize(32, 0);
        let frame = decode_frame(&raw).unwrap();
        assert_eq!(frame.fields.len(), 4);
        assert!(frame.split_event().is_some());
    }

    #[test]
    fn test_decode_invalid_utf8() {
        let result = decode_frame(&[0x30, 0xff, 0xfe]);
        assert!(matches!(result, Err(CodecError::InvalidEncoding(_))));
    }

    #[test]
    fn test_non_split_frames() {
        for raw in [
            &b"noise"[..],
            b"001 c1M 00:00:10.82",
            b"001 c1M 00:00:10.82 07 extra",
            b"001 c2M 00:00:10.82 07",
            b"001 C1M 00:00:10.82 07",
        ] {
            let frame = decode_frame(raw).unwrap();
            assert!(frame.split_event().is_none(), "{:?}", frame);
        }
    }
}
