//! Artifact upload: gzip, fixed headers, retry.
//!
//! An upload that still fails after retries is not an error. It is reported
//! as [`PublishStatus::Failed`] and the run carries on with other artifacts.

mod headers;
mod retry;

use std::fmt;
use std::io::Write;
use std::sync::Arc;

use flate2::Compression;
use flate2::write::GzEncoder;

use crate::error::{CdnError, Result};
use crate::logger::Logger;
use crate::storage::{RemoteStorage, StorageError};
use crate::utils::date::now_millis;

pub use headers::{ONE_YEAR, PUBLIC_READ, upload_headers};
pub use retry::RetryPolicy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// Final non-200 response
    Status(u16),
    Transport(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(status) => write!(f, "status {status}"),
            Self::Transport(message) => f.write_str(message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishStatus {
    Uploaded { attempts: u32 },
    Failed { reason: FailureReason, attempts: u32 },
}

/// Uploads artifacts to remote storage.
#[derive(Clone)]
pub struct Publisher {
    storage: Arc<dyn RemoteStorage>,
    retry: RetryPolicy,
    max_age: u64,
    acl: String,
    logger: Logger,
}

impl Publisher {
    pub fn new(storage: Arc<dyn RemoteStorage>, logger: Logger) -> Self {
        Self {
            storage,
            retry: RetryPolicy::default(),
            max_age: ONE_YEAR,
            acl: PUBLIC_READ.to_string(),
            logger,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_max_age(mut self, max_age: u64) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn with_acl(mut self, acl: impl Into<String>) -> Self {
        self.acl = acl.into();
        self
    }

    /// Compress and upload `bytes` under `name`.
    ///
    /// Transport errors and 5xx responses are retried; other statuses fail
    /// immediately.
    pub async fn publish(&self, name: &str, bytes: &[u8], mime: &str) -> Result<PublishStatus> {
        let body = gzip(bytes).map_err(|e| CdnError::io(name, e))?;
        let headers = upload_headers(mime, self.max_age, &self.acl, now_millis());

        let mut attempts = 0;
        let mut reason = FailureReason::Transport("no attempts made".to_string());

        for retry in 0..self.retry.attempts() {
            if retry > 0 {
                let delay = self.retry.backoff(retry - 1);
                self.logger.debug(
                    "upload",
                    &format!("retrying {name} in {}ms ({reason})", delay.as_millis()),
                );
                tokio::time::sleep(delay).await;
            }
            attempts += 1;

            match self.storage.put(name, body.clone(), &headers).await {
                Ok(response) if response.is_success() => {
                    self.logger.log("upload", name);
                    return Ok(PublishStatus::Uploaded { attempts });
                }
                Ok(response) => {
                    reason = FailureReason::Status(response.status);
                    if !response.is_server_error() {
                        break;
                    }
                }
                Err(e @ StorageError::Transport { .. }) => {
                    reason = FailureReason::Transport(e.to_string());
                }
            }
        }

        self.logger.log(
            "failed",
            &format!("{name}: {reason} after {attempts} attempt(s)"),
        );
        Ok(PublishStatus::Failed { reason, attempts })
    }
}

impl fmt::Debug for Publisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Publisher")
            .field("retry", &self.retry)
            .field("max_age", &self.max_age)
            .field("acl", &self.acl)
            .finish_non_exhaustive()
    }
}

fn gzip(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(bytes.len() / 2), Compression::default());
    encoder.write_all(bytes)?;
    encoder.finish()
}
