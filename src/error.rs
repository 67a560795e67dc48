//! Error types for the publish pipeline.
//!
//! Every variant here is fatal for a run. Upload failures after retries are
//! not errors: they surface as a failed publish status instead.

use std::path::PathBuf;

use thiserror::Error;

use crate::scan::ScanError;
use crate::storage::StorageError;

/// Result type alias for pipeline operations
pub type Result<T, E = CdnError> = std::result::Result<T, E>;

/// Fatal pipeline error. The message always names the offending asset.
#[derive(Debug, Error)]
pub enum CdnError {
    /// Bundle members resolve to different MIME types
    #[error("mismatched bundle {bundle}: expected {expected} but `{path}` is {found}")]
    MismatchedBundle {
        bundle: String,
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Bundle of a type that cannot be concatenated
    #[error("unsupported bundle type {mime} for {bundle}")]
    UnsupportedBundle { bundle: String, mime: &'static str },

    #[error("empty bundle")]
    EmptyBundle,

    /// Bundle member could not be stat'ed
    #[error("missing file {}", path.display())]
    MissingFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Tag renderer has no tag shape for this MIME type
    #[error("unknown asset type {mime} for `{asset}`")]
    UnknownAssetType { asset: String, mime: &'static str },

    /// Minifier rejected the source
    #[error("failed to minify `{file}`: {message}")]
    Minify { file: String, message: String },

    /// Optimizer tool missing or exited non-zero
    #[error("{tool} failed on {}: {message}", path.display())]
    Tool {
        tool: String,
        path: PathBuf,
        message: String,
    },

    /// Freshness lookup transport failure
    #[error("freshness check for `{name}` failed")]
    Freshness {
        name: String,
        #[source]
        source: StorageError,
    },

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("IO error on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("manifest {}: {message}", path.display())]
    Manifest { path: PathBuf, message: String },

    /// Background task panicked or was cancelled
    #[error("background task for `{name}` failed: {message}")]
    Task { name: String, message: String },
}

impl CdnError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Configuration errors are raised before any network call.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MismatchedBundle { .. }
                | Self::UnsupportedBundle { .. }
                | Self::EmptyBundle
                | Self::MissingFile { .. }
                | Self::Scan(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_asset() {
        let err = CdnError::MismatchedBundle {
            bundle: "[/js/a.js, /css/b.css]".into(),
            path: "/css/b.css".into(),
            expected: "application/javascript",
            found: "text/css",
        };
        let msg = err.to_string();
        assert!(msg.contains("/css/b.css"));
        assert!(msg.contains("text/css"));
        assert!(err.is_configuration());

        let err = CdnError::Minify {
            file: "js/broken.js".into(),
            message: "Unexpected token".into(),
        };
        assert!(err.to_string().contains("js/broken.js"));
        assert!(!err.is_configuration());
    }
}
