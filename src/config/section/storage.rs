//! `[storage]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [storage]
//! endpoint = "https://assets.s3.amazonaws.com"  # Required when publishing
//! acl = "public-read"
//! timeout_secs = 30
//!
//! [storage.headers]
//! authorization = "..."                         # Sent with every request
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::ConfigDiagnostics;
use crate::publish::PUBLIC_READ;
use crate::storage::Headers;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub endpoint: Option<String>,
    pub acl: String,
    pub timeout_secs: u64,
    pub headers: BTreeMap<String, String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            acl: PUBLIC_READ.to_string(),
            timeout_secs: 30,
            headers: BTreeMap::new(),
        }
    }
}

impl StorageConfig {
    /// Parsed endpoint, `None` when unset or invalid.
    pub fn endpoint_url(&self) -> Option<Url> {
        let url = Url::parse(self.endpoint.as_deref()?).ok()?;
        matches!(url.scheme(), "http" | "https").then_some(url)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn static_headers(&self) -> Headers {
        self.headers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn validate(&self, uploads: bool, diag: &mut ConfigDiagnostics) {
        match &self.endpoint {
            None if uploads => diag.error_with_hint(
                "storage.endpoint",
                "required when publishing",
                "set it to the bucket URL, or pass --dry-run",
            ),
            Some(endpoint) if self.endpoint_url().is_none() => diag.error(
                "storage.endpoint",
                format!("`{endpoint}` is not an http(s) URL"),
            ),
            _ => {}
        }
        if self.timeout_secs == 0 {
            diag.error("storage.timeout_secs", "must be greater than 0");
        }
        if self.acl.trim().is_empty() {
            diag.error("storage.acl", "must not be empty");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_validation() {
        let mut diag = ConfigDiagnostics::new();
        StorageConfig::default().validate(true, &mut diag);
        assert_eq!(diag.errors()[0].field, "storage.endpoint");

        let mut diag = ConfigDiagnostics::new();
        StorageConfig::default().validate(false, &mut diag);
        assert!(diag.is_empty());

        let mut diag = ConfigDiagnostics::new();
        let bad = StorageConfig {
            endpoint: Some("s3://bucket".into()),
            ..StorageConfig::default()
        };
        bad.validate(false, &mut diag);
        assert_eq!(diag.len(), 1);
    }

    #[test]
    fn test_headers_table() {
        let storage: StorageConfig = toml::from_str(
            "endpoint = \"https://b.example.com\"\n[headers]\nx-api-key = \"k\"\n",
        )
        .unwrap();
        assert_eq!(
            storage.static_headers(),
            vec![("x-api-key".to_string(), "k".to_string())]
        );
        assert_eq!(storage.endpoint_url().unwrap().host_str(), Some("b.example.com"));
    }
}
