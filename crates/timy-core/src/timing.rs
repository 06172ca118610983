//! Split time conversion
//!
//! The TIMY reports run times as `HH:MM:SS.ff` (hundredths of a second).
//! They are durations measured from midnight, not wall-clock timestamps.

use std::time::Duration;

use chrono::{NaiveTime, Timelike};
use thiserror::Error;

/// Length of `HH:MM:SS.ff`
const SPLIT_TIME_LEN: usize = 11;

const NANOS_PER_HUNDREDTH: u32 = 10_000_000;
const MILLIS_PER_HUNDREDTH: u32 = 10;

/// Errors converting between split time text and durations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeFormatError {
    /// Text is not `HH:MM:SS.ff`
    #[error("Split time '{0}' does not match HH:MM:SS.ff")]
    InvalidLayout(String),

    /// A component exceeds its range
    #[error("Split time '{input}' has {component} out of range")]
    OutOfRange {
        /// Offending text
        input: String,
        /// Component out of range
        component: &'static str,
    },

    /// Duration reaches past midnight
    #[error("Duration of {0:?} does not fit in a single day")]
    TooLong(Duration),
}

/// Parse a `HH:MM:SS.ff` split time into a duration since midnight.
///
/// Surrounding whitespace is ignored. Every component must have exactly two
/// digits.
pub fn parse_split_time(raw: &str) -> Result<Duration, TimeFormatError> {
    let input = raw.trim();
    let bytes = input.as_bytes();

    let layout_ok = bytes.len() == SPLIT_TIME_LEN
        && bytes[2] == b':'
        && bytes[5] == b':'
        && bytes[8] == b'.'
        && [0, 1, 3, 4, 6, 7, 9, 10]
            .iter()
            .all(|&i| bytes[i].is_ascii_digit());
    if !layout_ok {
        return Err(TimeFormatError::InvalidLayout(input.to_string()));
    }

    let two_digits = |i: usize| u32::from(bytes[i] - b'0') * 10 + u32::from(bytes[i + 1] - b'0');
    let hours = two_digits(0);
    let minutes = two_digits(3);
    let seconds = two_digits(6);
    let hundredths = two_digits(9);

    let out_of_range = |component| TimeFormatError::OutOfRange {
        input: input.to_string(),
        component,
    };
    if hours >= 24 {
        return Err(out_of_range("hours"));
    }
    if minutes >= 60 {
        return Err(out_of_range("minutes"));
    }
    if seconds >= 60 {
        return Err(out_of_range("seconds"));
    }

    let time = NaiveTime::from_hms_milli_opt(
        hours,
        minutes,
        seconds,
        hundredths * MILLIS_PER_HUNDREDTH,
    )
    .ok_or_else(|| TimeFormatError::InvalidLayout(input.to_string()))?;

    Ok(Duration::new(
        u64::from(time.num_seconds_from_midnight()),
        time.nanosecond(),
    ))
}

/// Format a duration since midnight as `HH:MM:SS.ff`.
///
/// Precision below a hundredth is truncated.
pub fn format_split_time(duration: Duration) -> Result<String, TimeFormatError> {
    let secs = u32::try_from(duration.as_secs()).map_err(|_| TimeFormatError::TooLong(duration))?;
    let nanos = duration.subsec_nanos() - duration.subsec_nanos() % NANOS_PER_HUNDREDTH;
    let time = NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos)
        .ok_or(TimeFormatError::TooLong(duration))?;

    Ok(format!(
        "{}.{:02}",
        time.format("%H:%M:%S"),
        time.nanosecond() / NANOS_PER_HUNDREDTH
    ))
}

/// Serde adapter storing durations as `HH:MM:SS.ff` text
pub mod serde_split_time {
    use std::time::Duration;

    use serde::{de, ser, Deserialize, Deserializer, Serializer};

    /// Write a duration as split time text
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        match super::format_split_time(*duration) {
            Ok(text) => serializer.serialize_str(&text),
            Err(e) => Err(ser::Error::custom(e)),
        }
    }

    /// Read a duration from split time text
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::parse_split_time(&text).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        assert_eq!(
            parse_split_time("00:00:10.82").unwrap(),
            Duration::from_millis(10_820)
        );
        assert_eq!(
            parse_split_time("01:02:03.04").unwrap(),
            Duration::from_millis(3_723_040)
        );
        assert_eq!(
            parse_split_time("23:59:59.99").unwrap(),
            Duration::from_millis(86_399_990)
        );
    }

    #[test]
    fn test_parse_trims_whitespace() {
        assert_eq!(
            parse_split_time("  00:00:01.50\r\n").unwrap(),
            Duration::from_millis(1_500)
        );
    }

    #[test]
    fn test_hour_out_of_range() {
        assert_eq!(
            parse_split_time("24:00:00.00"),
            Err(TimeFormatError::OutOfRange {
                input: "24:00:00.00".to_string(),
                component: "hours"
            })
        );
    }

    #[test]
    fn test_minute_and_second_out_of_range() {
        assert!(matches!(
            parse_split_time("00:60:00.00"),
            Err(TimeFormatError::OutOfRange { component: "minutes", .. })
        ));
        assert!(matches!(
            parse_split_time("00:00:60.00"),
            Err(TimeFormatError::OutOfRange { component: "seconds", .. })
        ));
    }

    #[test]
    fn test_malformed_layouts() {
        for raw in [
            "",
            "0:00:10.82",
            "00:00:10.8",
            "00:00:10.820",
            "00:00:10,82",
            "00-00-10.82",
            "00:0a:10.82",
            "+0:00:10.82",
            "00:00:10.8 ",
            "00:00:1 .82",
            "１0:00:10.82",
        ] {
            assert!(
                matches!(parse_split_time(raw), Err(TimeFormatError::InvalidLayout(_))),
                "{:?} should be rejected",
                raw
            );
        }
    }

    #[test]
    fn test_hundredths_round_trip() {
        for h in [0u32, 9, 23] {
            for m in [0u32, 30, 59] {
                for s in [0u32, 1, 59] {
                    for ff in 0..100u32 {
                        let text = format!("{:02}:{:02}:{:02}.{:02}", h, m, s, ff);
                        let d = parse_split_time(&text).unwrap();
                        assert_eq!(d.subsec_nanos() % NANOS_PER_HUNDREDTH, 0);
                        assert_eq!(format_split_time(d).unwrap(), text);
                    }
                }
            }
        }
    }

    #[test]
    fn test_format_truncates_and_limits() {
        assert_eq!(
            format_split_time(Duration::from_micros(10_829_999)).unwrap(),
            "00:00:10.82"
        );
        assert!(matches!(
            format_split_time(Duration::from_secs(86_400)),
            Err(TimeFormatError::TooLong(_))
        ));
    }
}
