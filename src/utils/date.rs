//! HTTP date helpers (`Wed, 21 Oct 2015 07:28:00 GMT`).

use chrono::{DateTime, Utc};

const HTTP_DATE: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Current time in epoch milliseconds.
pub fn now_millis() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
}

/// Format epoch milliseconds as an HTTP date.
pub fn http_date(millis: u64) -> String {
    let millis = i64::try_from(millis).unwrap_or(i64::MAX);
    DateTime::<Utc>::from_timestamp_millis(millis)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
        .format(HTTP_DATE)
        .to_string()
}

/// Parse an HTTP date into epoch milliseconds.
///
/// Accepts the IMF-fixdate form and anything else RFC 2822 allows.
pub fn parse_http_date(value: &str) -> Option<u64> {
    let parsed = DateTime::parse_from_rfc2822(value.trim()).ok()?;
    u64::try_from(parsed.timestamp_millis()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_date_round_trip() {
        let millis = 1_445_412_480_000;
        let formatted = http_date(millis);
        assert_eq!(formatted, "Wed, 21 Oct 2015 07:28:00 GMT");
        assert_eq!(parse_http_date(&formatted), Some(millis));
    }

    #[test]
    fn test_parse_invalid() {
        assert_eq!(parse_http_date("yesterday"), None);
        assert_eq!(parse_http_date(""), None);
    }

    #[test]
    fn test_now_is_recent() {
        assert!(now_millis() > 1_600_000_000_000);
    }
}
