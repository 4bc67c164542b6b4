//! Scalar wire codecs for the tagged entry types.
//!
//! These four functions define the exact text profiles of the `@ISOtime` and
//! `@base64` wire forms; formatter and parser are strict inverses.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, SecondsFormat, Utc};

/// Format an instant as ISO-8601 text: UTC, trailing `Z`, seconds with
/// sub-second digits in groups of three only when present
/// (e.g. `2015-07-23T14:34:05.980Z`).
pub(crate) fn format_instant(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Parse ISO-8601 instant text. Not tolerant of variations in time format.
pub(crate) fn parse_instant(text: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(text).map(|dt| dt.with_timezone(&Utc))
}

/// Encode bytes as standard base64: padded, no line wrapping.
pub(crate) fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode standard base64 text. Strict alphabet; invalid input fails.
pub(crate) fn decode_base64(text: &str) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_instant_format_millis() {
        let t = Utc.with_ymd_and_hms(2015, 7, 23, 14, 34, 5).unwrap()
            + chrono::Duration::milliseconds(980);
        assert_eq!(format_instant(&t), "2015-07-23T14:34:05.980Z");
    }

    #[test]
    fn test_instant_format_whole_seconds() {
        let t = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(format_instant(&t), "2020-01-01T00:00:00Z");
    }

    #[test]
    fn test_instant_round_trip() {
        let t = Utc.with_ymd_and_hms(2015, 7, 23, 14, 34, 5).unwrap()
            + chrono::Duration::milliseconds(980);
        assert_eq!(parse_instant(&format_instant(&t)).unwrap(), t);
    }

    #[test]
    fn test_instant_parse_rejects_garbage() {
        assert!(parse_instant("not-a-time").is_err());
        assert!(parse_instant("2020-01-01").is_err());
    }

    #[test]
    fn test_base64_round_trip() {
        let bytes: Vec<u8> = (0..=255).collect();
        assert_eq!(decode_base64(&encode_base64(&bytes)).unwrap(), bytes);
    }

    #[test]
    fn test_base64_rejects_invalid_alphabet() {
        assert!(decode_base64("not base64!").is_err());
    }
}
