//! Path and URL helpers.
//!
//! Artifact names live in a `/`-separated key space independent of the host
//! platform, so conversions between filesystem paths and keys go through here.

use std::path::{Component, Path, PathBuf};

/// Strip leading slashes from a URL path.
#[inline]
pub fn strip_leading_slash(url: &str) -> &str {
    url.trim_start_matches('/')
}

/// Check if a link points off-site (`https:`, `mailto:`, protocol-relative `//`).
///
/// A valid scheme has at least one character before the colon and only
/// contains ASCII alphanumerics or `+`, `-`, `.`.
#[inline]
pub fn is_external_link(link: &str) -> bool {
    if link.starts_with("//") {
        return true;
    }
    link.find(':').is_some_and(|pos| {
        pos > 0
            && link[..pos]
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

/// Split a URL into the path and its `?query` / `#fragment` suffix.
///
/// The suffix keeps its leading delimiter.
#[inline]
pub fn split_suffix(url: &str) -> (&str, &str) {
    match url.find(['?', '#']) {
        Some(pos) => url.split_at(pos),
        None => (url, ""),
    }
}

/// Resolve `.` and `..` components without touching the filesystem.
pub fn normalize_lexical(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Resolve `.` and `..` in a `/`-separated key.
///
/// Returns `None` when the key climbs above the root.
pub fn normalize_key(key: &str) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();
    for part in key.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }
    Some(parts.join("/"))
}

/// Join path components with `/`.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Relative URL from the directory `from_dir` to the key `to`.
///
/// Both arguments are `/`-separated keys without a leading slash;
/// an empty `from_dir` is the bucket root.
///
/// ```ignore
/// assert_eq!(relative_url("css", "images/a.png"), "../images/a.png");
/// assert_eq!(relative_url("", "images/a.png"), "images/a.png");
/// ```
pub fn relative_url(from_dir: &str, to: &str) -> String {
    let from: Vec<&str> = from_dir.split('/').filter(|s| !s.is_empty()).collect();
    let target: Vec<&str> = to.split('/').filter(|s| !s.is_empty()).collect();

    // Keep the file name out of the shared prefix
    let dir_len = target.len().saturating_sub(1);
    let common = from
        .iter()
        .zip(target.iter().take(dir_len))
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<&str> = vec![".."; from.len() - common];
    parts.extend(&target[common..]);
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_leading_slash() {
        assert_eq!(strip_leading_slash("/css/site.css"), "css/site.css");
        assert_eq!(strip_leading_slash("css/site.css"), "css/site.css");
    }

    #[test]
    fn test_is_external_link() {
        assert!(is_external_link("https://example.com/a.png"));
        assert!(is_external_link("//cdn.example.com/a.png"));
        assert!(is_external_link("data:image/png;base64,AAAA"));
        assert!(!is_external_link("/images/a.png"));
        assert!(!is_external_link("../images/a.png"));
    }

    #[test]
    fn test_split_suffix() {
        assert_eq!(split_suffix("font.woff?#iefix"), ("font.woff", "?#iefix"));
        assert_eq!(split_suffix("font.svg#glyph"), ("font.svg", "#glyph"));
        assert_eq!(split_suffix("a.png"), ("a.png", ""));
    }

    #[test]
    fn test_normalize_lexical() {
        assert_eq!(
            normalize_lexical(Path::new("/site/public/css/../images/./a.png")),
            PathBuf::from("/site/public/images/a.png")
        );
    }

    #[test]
    fn test_relative_url() {
        assert_eq!(relative_url("css", "images/a.png"), "../images/a.png");
        assert_eq!(relative_url("", "images/a.png"), "images/a.png");
        assert_eq!(relative_url("css", "css/img/a.png"), "img/a.png");
        assert_eq!(relative_url("css/vendor", "fonts/x.woff"), "../../fonts/x.woff");
        assert_eq!(relative_url("images", "images/a.png"), "a.png");
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("css/../images/a.png").as_deref(), Some("images/a.png"));
        assert_eq!(normalize_key("./a/./b.png").as_deref(), Some("a/b.png"));
        assert_eq!(normalize_key("css/../../secret.png"), None);
    }
}
