//! Timestamp utilities

use chrono::{DateTime, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Format a timestamp the way it is persisted (RFC 3339, millisecond precision, `Z` suffix)
pub fn to_storage_string(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Parse a persisted timestamp back into UTC
pub fn from_storage_string(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value).map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        // Should be a reasonable timestamp (after year 2000)
        assert!(timestamp.timestamp() > 946_684_800);
    }

    #[tokio::test]
    async fn test_now_successive_calls_advance() {
        let time1 = now();
        tokio::time::sleep(Duration::from_millis(10)).await;
        let time2 = now();
        assert!(time2 > time1);
    }

    #[test]
    fn test_storage_string_uses_utc_suffix() {
        let ts = from_storage_string("2024-03-01T10:15:30.250+02:00").unwrap();
        assert_eq!(to_storage_string(&ts), "2024-03-01T08:15:30.250Z");
    }

    #[test]
    fn test_storage_string_round_trip_keeps_millis() {
        let ts = now();
        let parsed = from_storage_string(&to_storage_string(&ts)).unwrap();
        assert_eq!(parsed.timestamp_millis(), ts.timestamp_millis());
    }

    #[test]
    fn test_from_storage_string_rejects_garbage() {
        assert!(from_storage_string("yesterday").is_err());
    }
}
