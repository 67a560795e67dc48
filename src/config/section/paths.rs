//! `[paths]` and `[views]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [paths]
//! public = "public"                   # Public root, the bucket mirrors it
//! views = "views"                     # Template tree to scan
//! manifest = ".cdnify/manifest.json"  # Omit to always run the full cycle
//!
//! [views]
//! marker = "CDN"
//! extensions = ["jade", "ejs"]
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::ConfigDiagnostics;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub public: PathBuf,
    pub views: PathBuf,
    pub manifest: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            public: "public".into(),
            views: "views".into(),
            manifest: None,
        }
    }
}

impl PathsConfig {
    /// Paths are expected to be resolved against the project root already.
    pub fn validate(&self, needs_views: bool, diag: &mut ConfigDiagnostics) {
        if !self.public.is_dir() {
            diag.error(
                "paths.public",
                format!("public root not found: {}", self.public.display()),
            );
        }
        if needs_views && !self.views.is_dir() {
            diag.error(
                "paths.views",
                format!("views directory not found: {}", self.views.display()),
            );
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewsConfig {
    /// Call-like token marking asset references, `CDN(...)`.
    pub marker: String,
    /// Template extensions, without the dot.
    pub extensions: Vec<String>,
}

impl Default for ViewsConfig {
    fn default() -> Self {
        Self {
            marker: "CDN".to_string(),
            extensions: vec!["jade".to_string(), "ejs".to_string()],
        }
    }
}

impl ViewsConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        let is_ident = |s: &str| {
            let mut chars = s.chars();
            chars
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        };
        if !is_ident(&self.marker) {
            diag.error_with_hint(
                "views.marker",
                format!("`{}` is not a valid marker name", self.marker),
                "use an identifier such as `CDN`",
            );
        }
        if self.extensions.is_empty() {
            diag.error("views.extensions", "at least one template extension is required");
        }
        if let Some(ext) = self.extensions.iter().find(|e| e.starts_with('.')) {
            diag.error_with_hint(
                "views.extensions",
                format!("`{ext}` starts with a dot"),
                format!("write `{}`", ext.trim_start_matches('.')),
            );
        }
    }
}
