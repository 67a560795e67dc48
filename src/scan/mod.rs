//! Template scanning.
//!
//! Walks the views directory, finds every `MARKER(...)` call in files with a
//! configured extension and parses its arguments. References are
//! deduplicated in first-seen order: files are visited in sorted path order,
//! markers in source order within a file.

mod marker;

use std::io;
use std::path::{Path, PathBuf};

use jwalk::WalkDir;
use regex::Regex;
use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::asset::{AssetReference, RenderAttributes};
use crate::error::{CdnError, Result};

pub use marker::{Marker, MarkerError, parse_marker};

/// Malformed marker arguments. Fatal for the run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{}:{line}:{column}: malformed marker: {message}", file.display())]
pub struct ScanError {
    pub file: PathBuf,
    /// Byte offset of the failure in the file.
    pub offset: usize,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl ScanError {
    fn at(file: &Path, source: &str, offset: usize, message: String) -> Self {
        let before = &source[..offset.min(source.len())];
        let line = before.matches('\n').count() + 1;
        let column = before.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
        Self {
            file: file.to_path_buf(),
            offset,
            line,
            column,
            message,
        }
    }
}

/// First occurrence of a reference in the views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedAsset {
    pub reference: AssetReference,
    /// Attributes of the first occurrence. Publishing ignores them.
    pub attributes: RenderAttributes,
}

/// Finds marker calls in template sources.
#[derive(Debug, Clone)]
pub struct Scanner {
    pattern: Regex,
    extensions: Vec<String>,
}

impl Scanner {
    pub fn new(marker: &str, extensions: &[String]) -> Result<Self> {
        // One level of nested parentheses inside the arguments is allowed.
        let pattern = format!(
            r"\b{}\(((?:[^()]|\([^()]*\))*)\)",
            regex::escape(marker)
        );
        let pattern = Regex::new(&pattern).map_err(|e| {
            CdnError::Scan(ScanError {
                file: PathBuf::new(),
                offset: 0,
                line: 0,
                column: 0,
                message: format!("invalid marker `{marker}`: {e}"),
            })
        })?;
        let extensions = extensions
            .iter()
            .map(|ext| ext.trim_start_matches('.').to_string())
            .collect();
        Ok(Self {
            pattern,
            extensions,
        })
    }

    /// Template files under `views`, sorted by path.
    pub fn template_files(&self, views: &Path) -> Result<Vec<PathBuf>> {
        if !views.is_dir() {
            return Err(CdnError::io(
                views,
                io::Error::new(io::ErrorKind::NotFound, "views directory not found"),
            ));
        }

        let mut files: Vec<PathBuf> = WalkDir::new(views)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path())
            .filter(|path| self.matches_extension(path))
            .collect();
        files.sort();
        Ok(files)
    }

    fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e == ext))
    }

    /// Markers in one template source, in order of appearance.
    pub fn scan_source(&self, file: &Path, source: &str) -> Result<Vec<Marker>, ScanError> {
        self.pattern
            .captures_iter(source)
            .filter_map(|caps| caps.get(1))
            .map(|args| {
                parse_marker(args.as_str()).map_err(|e| {
                    ScanError::at(file, source, args.start() + e.offset, e.message)
                })
            })
            .collect()
    }

    /// Scan every template under `views` and deduplicate references.
    pub fn scan(&self, views: &Path) -> Result<Vec<ScannedAsset>> {
        let mut seen = FxHashSet::default();
        let mut assets = Vec::new();

        for file in self.template_files(views)? {
            let source =
                std::fs::read_to_string(&file).map_err(|e| CdnError::io(&file, e))?;
            for marker in self.scan_source(&file, &source)? {
                if seen.insert(marker.assets.clone()) {
                    assets.push(ScannedAsset {
                        reference: marker.assets,
                        attributes: marker.attributes,
                    });
                }
            }
        }
        Ok(assets)
    }
}
