//! Remote object storage.
//!
//! The pipeline only needs two primitives: a metadata lookup for freshness
//! and an upload. Object names are passed unescaped; implementations escape
//! them for their transport.

mod http;
mod memory;

use async_trait::async_trait;
use thiserror::Error;

pub use http::HttpStorage;
pub use memory::{MemoryStorage, StoredObject};

/// Header list sent with an upload, in insertion order.
pub type Headers = Vec<(String, String)>;

/// Result of a `head` lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadResponse {
    pub status: u16,
    /// Remote last-modified time, epoch millis.
    pub last_modified: Option<u64>,
}

impl HeadResponse {
    pub const fn not_found() -> Self {
        Self {
            status: 404,
            last_modified: None,
        }
    }

    pub const fn is_found(&self) -> bool {
        self.status == 200
    }
}

/// Result of a `put` upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PutResponse {
    pub status: u16,
}

impl PutResponse {
    pub const fn is_success(&self) -> bool {
        self.status == 200
    }

    pub const fn is_server_error(&self) -> bool {
        self.status >= 500
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    /// Connection, DNS, TLS or timeout failure
    #[error("transport error for `{name}`: {message}")]
    Transport { name: String, message: String },
}

impl StorageError {
    pub fn transport(name: &str, message: impl Into<String>) -> Self {
        Self::Transport {
            name: name.to_string(),
            message: message.into(),
        }
    }
}

/// Object storage seen by the staleness check and the publisher.
#[async_trait]
pub trait RemoteStorage: Send + Sync {
    /// Metadata-only lookup. A missing object is `Ok` with status 404.
    async fn head(&self, name: &str) -> Result<HeadResponse, StorageError>;

    /// Upload `body` under `name`.
    async fn put(
        &self,
        name: &str,
        body: Vec<u8>,
        headers: &Headers,
    ) -> Result<PutResponse, StorageError>;
}
