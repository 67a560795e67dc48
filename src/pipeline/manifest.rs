//! Publish manifest persistence.
//!
//! A JSON array of published references. Its presence (non-empty) at the
//! start of a run skips the whole cycle; it is never consulted otherwise.

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::asset::AssetReference;
use crate::error::{CdnError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    path: PathBuf,
}

impl Manifest {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored references, `None` when the file does not exist.
    pub async fn load(&self) -> Result<Option<Vec<AssetReference>>> {
        let json = match fs::read_to_string(&self.path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CdnError::io(&self.path, e)),
        };
        let references = serde_json::from_str(&json).map_err(|e| CdnError::Manifest {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        Ok(Some(references))
    }

    /// Whether a previous run completed and the cycle can be skipped.
    ///
    /// Unreadable or malformed manifests are treated as absent.
    pub async fn is_complete(&self) -> bool {
        matches!(self.load().await, Ok(Some(refs)) if !refs.is_empty())
    }

    pub async fn write(&self, references: &[AssetReference]) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| CdnError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(references).map_err(|e| CdnError::Manifest {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        fs::write(&self.path, json)
            .await
            .map_err(|e| CdnError::io(&self.path, e))
    }

    /// Delete a stale manifest; a missing file is fine.
    pub async fn remove(&self) -> Result<()> {
        match fs::remove_file(&self.path).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                Err(CdnError::io(&self.path, e))
            }
            _ => Ok(()),
        }
    }
}
