//! Asset resolution: artifact naming, MIME grouping and fingerprints.
//!
//! ```text
//! "/css/site.css"              → css/site.css        (public prefix stripped)
//! ["/js/a.js", "/js/b.js"]     → a.js+b.js           (basenames, in order)
//! ```
//!
//! The fingerprint never appears in the object name. The renderer carries it
//! as `?cache=<fingerprint>`, so one object name is reused across revisions.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::error::{CdnError, Result};
use crate::utils::mime;
use crate::utils::path::{normalize_lexical, strip_leading_slash};

use super::{AssetReference, AssetType};

/// Separator between bundle member basenames.
pub const BUNDLE_SEPARATOR: &str = "+";

/// Characters `encodeURIComponent` leaves alone.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Same as [`COMPONENT`] but keeps `/` so keys stay readable in URLs.
const URL_PATH: &AsciiSet = &COMPONENT.remove(b'/');

/// A reference resolved against the public root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    pub reference: AssetReference,
    /// Object name in remote storage.
    pub name: String,
    /// Absolute source files in bundle order.
    pub files: Vec<PathBuf>,
    pub mime: &'static str,
    pub asset_type: AssetType,
    /// Max modification time across `files`, epoch millis.
    pub fingerprint: u64,
}

impl ResolvedAsset {
    /// Directory of the artifact inside the bucket (`""` for the root).
    pub fn artifact_dir(&self) -> &str {
        self.name.rsplit_once('/').map_or("", |(dir, _)| dir)
    }
}

/// Resolve a reference: validate MIME consistency, stat members and derive
/// the artifact name.
///
/// A missing Single yields fingerprint `0`; a missing bundle member is fatal.
pub fn resolve(reference: &AssetReference, public_root: &Path) -> Result<ResolvedAsset> {
    let mime = bundle_mime(reference)?;
    let asset_type = AssetType::from_mime(mime);

    let files: Vec<PathBuf> = reference
        .paths()
        .iter()
        .map(|p| source_path(public_root, p))
        .collect();

    let fingerprint = match reference {
        AssetReference::Single(_) => mtime_millis(&files[0]).unwrap_or(0),
        AssetReference::Bundle(_) => max_mtime(&files)?,
    };

    Ok(ResolvedAsset {
        reference: reference.clone(),
        name: artifact_name(reference),
        files,
        mime,
        asset_type,
        fingerprint,
    })
}

/// MIME type shared by all members of the reference.
fn bundle_mime(reference: &AssetReference) -> Result<&'static str> {
    let paths = reference.paths();
    let Some(first) = paths.first() else {
        return Err(CdnError::EmptyBundle);
    };

    let expected = mime::from_path(Path::new(first));
    if let AssetReference::Bundle(_) = reference {
        for path in &paths[1..] {
            let found = mime::from_path(Path::new(path));
            if found != expected {
                return Err(CdnError::MismatchedBundle {
                    bundle: reference.to_string(),
                    path: path.clone(),
                    expected,
                    found,
                });
            }
        }
        if !AssetType::from_mime(expected).is_bundleable() {
            return Err(CdnError::UnsupportedBundle {
                bundle: reference.to_string(),
                mime: expected,
            });
        }
    }
    Ok(expected)
}

/// Deterministic object name for a reference.
pub fn artifact_name(reference: &AssetReference) -> String {
    match reference {
        AssetReference::Single(path) => strip_leading_slash(path).to_string(),
        AssetReference::Bundle(paths) => paths
            .iter()
            .map(|p| basename(p))
            .collect::<Vec<_>>()
            .join(BUNDLE_SEPARATOR),
    }
}

fn max_mtime(files: &[PathBuf]) -> Result<u64> {
    files.iter().try_fold(0, |max, file| {
        let mtime = mtime_millis(file).map_err(|source| CdnError::MissingFile {
            path: file.clone(),
            source,
        })?;
        Ok(max.max(mtime))
    })
}

/// Absolute source path for a public-root-relative reference path.
pub fn source_path(public_root: &Path, path: &str) -> PathBuf {
    normalize_lexical(&public_root.join(strip_leading_slash(path)))
}

/// File modification time in epoch milliseconds.
pub fn mtime_millis(path: &Path) -> std::io::Result<u64> {
    let modified = path.metadata()?.modified()?;
    Ok(system_time_millis(modified))
}

pub fn system_time_millis(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Escape an object name for a storage request (`encodeURIComponent`).
pub fn escape_name(name: &str) -> String {
    utf8_percent_encode(name, COMPONENT).to_string()
}

/// Escape an object name for use as a URL path, keeping `/`.
pub fn url_path(name: &str) -> String {
    utf8_percent_encode(name, URL_PATH).to_string()
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
