//! Stylesheets: per-file minification and sub-resource URL rewriting.
//!
//! ```text
//! css/site.css:   background: url(../images/a.png)
//!                 → images/a.png published as its own artifact
//!                 → url(../images/a.png) relative to the artifact's dir
//! ```
//!
//! Only `url(...)` values of `background`, `background-image`, `content`,
//! `border-image`, `cursor` and `src` declarations are followed. Data URIs
//! and external URLs are left as they are.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::{Captures, Regex};
use rustc_hash::FxHashSet;

use crate::asset::minify::{is_preminified, minify_css};
use crate::error::{CdnError, Result};
use crate::utils::path::{is_external_link, normalize_key, relative_url, split_suffix};

use super::{blocking, display_path, read_text};

fn declaration_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // `url(...)` groups and strings may hold `;` (data URIs)
        Regex::new(
            r#"(^|[{;\s])((?:background-image|background|content|border-image|cursor|src)\s*:)((?:url\([^)]*\)|"[^"]*"|'[^']*'|[^;}])*)"#,
        )
        .unwrap()
    })
}

fn url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"url\(\s*(['"]?)([^'")]+?)['"]?\s*\)"#).unwrap())
}

/// Minified stylesheet bytes plus the sub-resource keys it references.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StylesheetOutput {
    pub css: String,
    /// Public-root-relative keys in first-seen order.
    pub resources: Vec<String>,
}

/// Minify each member, rewrite its sub-resource URLs against
/// `artifact_dir` and join the results with newlines.
pub async fn transform_stylesheet(
    files: &[PathBuf],
    public_root: &Path,
    artifact_dir: &str,
) -> Result<StylesheetOutput> {
    let mut parts = Vec::with_capacity(files.len());
    let mut resources = Vec::new();
    let mut seen = FxHashSet::default();

    for file in files {
        let source = read_text(file).await?;
        let name = display_path(public_root, file);

        let css = if is_preminified(file) {
            source
        } else {
            let filename = name.clone();
            blocking(&name, move || minify_css(&source, &filename))
                .await?
                .map_err(|message| CdnError::Minify {
                    file: name.clone(),
                    message,
                })?
        };

        let source_dir = name.rsplit_once('/').map_or("", |(dir, _)| dir);
        let (css, found) = rewrite_urls(&css, source_dir, artifact_dir);
        for key in found {
            if seen.insert(key.clone()) {
                resources.push(key);
            }
        }
        parts.push(css);
    }

    Ok(StylesheetOutput {
        css: parts.join("\n"),
        resources,
    })
}

/// Rewrite followed `url(...)` references.
///
/// `source_dir` is the public-relative directory of the stylesheet the CSS
/// came from, `artifact_dir` the directory of the published artifact.
/// Returns the rewritten CSS and the resolved sub-resource keys.
pub fn rewrite_urls(css: &str, source_dir: &str, artifact_dir: &str) -> (String, Vec<String>) {
    let mut resources = Vec::new();

    let rewritten = declaration_re().replace_all(css, |decl: &Captures<'_>| {
        let value = url_re().replace_all(&decl[3], |url: &Captures<'_>| {
            let quote = &url[1];
            let target = url[2].trim();
            match resolve_key(target, source_dir) {
                Some((key, suffix)) => {
                    let relative = relative_url(artifact_dir, &key);
                    resources.push(key);
                    format!("url({quote}{relative}{suffix}{quote})")
                }
                None => url[0].to_string(),
            }
        });
        format!("{}{}{}", &decl[1], &decl[2], value)
    });

    (rewritten.into_owned(), resources)
}

/// Public-root key and `?query`/`#fragment` suffix for a stylesheet URL.
fn resolve_key<'a>(url: &'a str, source_dir: &str) -> Option<(String, &'a str)> {
    if url.starts_with("data:") || url.starts_with('#') || is_external_link(url) {
        return None;
    }
    let (path, suffix) = split_suffix(url);
    if path.is_empty() {
        return None;
    }

    let key = match path.strip_prefix('/') {
        Some(rooted) => normalize_key(rooted)?,
        None => normalize_key(&format!("{source_dir}/{path}"))?,
    };
    (!key.is_empty()).then_some((key, suffix))
}
