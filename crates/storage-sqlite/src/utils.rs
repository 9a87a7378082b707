//! Shared helpers for storage models.

use chrono::{DateTime, Utc};

/// Parses an RFC 3339 timestamp stored as text.
///
/// Falls back to the Unix epoch for unparseable data so a single corrupt row
/// cannot take down a whole listing; the fallback is logged loudly.
pub fn parse_timestamp_tolerant(value: &str, field_name: &str) -> DateTime<Utc> {
    match DateTime::parse_from_rfc3339(value) {
        Ok(parsed) => parsed.with_timezone(&Utc),
        Err(err) => {
            log::error!("Failed to parse {field_name} '{value}' as RFC 3339: {err}. Falling back to epoch.");
            DateTime::UNIX_EPOCH
        }
    }
}

/// Formats a timestamp for storage.
pub fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_round_trip() {
        let now = Utc::now();
        let parsed = parse_timestamp_tolerant(&format_timestamp(now), "test");
        assert_eq!(parsed, now);
    }

    #[test]
    fn test_corrupt_timestamp_falls_back_to_epoch() {
        let parsed = parse_timestamp_tolerant("not-a-date", "test");
        assert_eq!(parsed, DateTime::UNIX_EPOCH);
    }
}
