//! Service timestamp handling.
//!
//! The alert service emits naive timestamps in its own clock, which is UTC.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

/// How long an open alert stays on screen after its timestamp.
pub const OPEN_ALERT_VISIBLE_SECS: i64 = 5 * 60;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse a service timestamp as UTC.
///
/// Accepts `YYYY-MM-DDTHH:MM:SS[.fff]` with an optional trailing `Z`, the same
/// with a space separator, RFC 3339 with an explicit offset, and a bare date
/// (midnight UTC).
pub fn parse_service_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let naive = raw.strip_suffix('Z').unwrap_or(raw);
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(naive, format) {
            return Some(dt.and_utc());
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(naive, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Visibility window for open alerts.
pub fn open_alert_window() -> Duration {
    Duration::seconds(OPEN_ALERT_VISIBLE_SECS)
}

/// Whether an alert stamped `timestamp` is still inside `window` at `now`.
///
/// Timestamps in the future count as inside the window.
#[inline]
pub fn within_window(timestamp: DateTime<Utc>, now: DateTime<Utc>, window: Duration) -> bool {
    now.signed_duration_since(timestamp) <= window
}

/// Open-alert visibility rule. Unparsable timestamps stay visible.
pub fn is_open_alert_visible(timestamp: &str, now: DateTime<Utc>) -> bool {
    match parse_service_timestamp(timestamp) {
        Some(ts) => within_window(ts, now, open_alert_window()),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 25, h, m, s).unwrap()
    }

    #[test]
    fn test_parse_naive_as_utc() {
        assert_eq!(parse_service_timestamp("2025-02-25T10:00:00"), Some(at(10, 0, 0)));
        assert_eq!(parse_service_timestamp("2025-02-25T10:00:00Z"), Some(at(10, 0, 0)));
        assert_eq!(parse_service_timestamp("2025-02-25 10:00:00"), Some(at(10, 0, 0)));
    }

    #[test]
    fn test_parse_fractional_and_offset() {
        let parsed = parse_service_timestamp("2025-02-25T10:00:00.250").unwrap();
        assert_eq!(parsed.timestamp_millis(), at(10, 0, 0).timestamp_millis() + 250);

        assert_eq!(
            parse_service_timestamp("2025-02-25T12:00:00+02:00"),
            Some(at(10, 0, 0))
        );
    }

    #[test]
    fn test_parse_date_only() {
        assert_eq!(parse_service_timestamp("2025-02-25"), Some(at(0, 0, 0)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_service_timestamp(""), None);
        assert_eq!(parse_service_timestamp("yesterday"), None);
        assert_eq!(parse_service_timestamp("2025-13-45T99:00:00"), None);
    }

    #[test]
    fn test_visibility_boundary() {
        let ts = "2025-02-25T10:00:00";
        assert!(is_open_alert_visible(ts, at(10, 0, 0)));
        assert!(is_open_alert_visible(ts, at(10, 4, 59)));
        assert!(is_open_alert_visible(ts, at(10, 5, 0)));
        assert!(!is_open_alert_visible(ts, at(10, 5, 1)));
        assert!(!is_open_alert_visible(ts, at(11, 0, 0)));
    }

    #[test]
    fn test_future_timestamp_visible() {
        assert!(is_open_alert_visible("2025-02-25T10:10:00", at(10, 0, 0)));
    }

    #[test]
    fn test_unparsable_timestamp_visible() {
        assert!(is_open_alert_visible("", at(10, 0, 0)));
        assert!(is_open_alert_visible("soon", at(10, 0, 0)));
    }
}
