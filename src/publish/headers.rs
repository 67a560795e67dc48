//! Upload header set.

use crate::storage::Headers;
use crate::utils::date::http_date;

/// One year, in seconds.
pub const ONE_YEAR: u64 = 31_556_926;

pub const PUBLIC_READ: &str = "public-read";

/// Headers for an upload of `mime` content at time `now_millis`.
///
/// Cache, content-type and content-encoding values are duplicated under the
/// `response-` prefix for caches that honor only one form.
pub fn upload_headers(mime: &str, max_age: u64, acl: &str, now_millis: u64) -> Headers {
    let cache_control = format!("public, max-age={max_age}");
    let expires = http_date(now_millis.saturating_add(max_age.saturating_mul(1000)));

    let mut headers = Vec::with_capacity(9);
    for (name, value) in [
        ("Content-Type", mime),
        ("Cache-Control", cache_control.as_str()),
        ("Expires", expires.as_str()),
        ("Content-Encoding", "gzip"),
    ] {
        headers.push((name.to_string(), value.to_string()));
        headers.push((format!("response-{}", name.to_ascii_lowercase()), value.to_string()));
    }
    headers.push(("x-amz-acl".to_string(), acl.to_string()));
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get<'a>(headers: &'a Headers, name: &str) -> Option<&'a str> {
        headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_fixed_header_set() {
        let headers = upload_headers("text/css", ONE_YEAR, PUBLIC_READ, 1_445_412_480_000);
        assert_eq!(headers.len(), 9);
        assert_eq!(get(&headers, "Content-Type"), Some("text/css"));
        assert_eq!(get(&headers, "response-content-type"), Some("text/css"));
        assert_eq!(get(&headers, "Cache-Control"), Some("public, max-age=31556926"));
        assert_eq!(
            get(&headers, "response-cache-control"),
            get(&headers, "Cache-Control")
        );
        assert_eq!(get(&headers, "Content-Encoding"), Some("gzip"));
        assert_eq!(get(&headers, "response-content-encoding"), Some("gzip"));
        assert_eq!(get(&headers, "x-amz-acl"), Some("public-read"));
        assert_eq!(get(&headers, "Expires"), get(&headers, "response-expires"));
    }

    #[test]
    fn test_expires_is_max_age_ahead() {
        let headers = upload_headers("image/png", 60, PUBLIC_READ, 1_445_412_480_000);
        assert_eq!(get(&headers, "Expires"), Some("Wed, 21 Oct 2015 07:29:00 GMT"));
    }
}
