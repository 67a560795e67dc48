//! Remote staleness check.
//!
//! An artifact is fresh when the remote copy exists and was modified at or
//! after the local fingerprint. Everything else means republish. Transport
//! failures are fatal and not retried here.

use crate::error::{CdnError, Result};
use crate::storage::{HeadResponse, RemoteStorage};

/// Ask remote storage whether `name` is at least as new as `fingerprint`.
pub async fn is_fresh(storage: &dyn RemoteStorage, name: &str, fingerprint: u64) -> Result<bool> {
    let head = storage
        .head(name)
        .await
        .map_err(|source| CdnError::Freshness {
            name: name.to_string(),
            source,
        })?;
    Ok(is_fresh_response(&head, fingerprint))
}

/// Freshness decision for a completed lookup.
pub fn is_fresh_response(head: &HeadResponse, fingerprint: u64) -> bool {
    head.is_found()
        && head
            .last_modified
            .is_some_and(|remote| remote >= fingerprint)
}
