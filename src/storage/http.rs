//! HTTP object storage (S3-style `HEAD` / `PUT` on `<endpoint>/<name>`).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::LAST_MODIFIED;
use reqwest::{Client, RequestBuilder};
use url::Url;

use crate::asset::resolve::escape_name;
use crate::utils::date::parse_http_date;

use super::{HeadResponse, Headers, PutResponse, RemoteStorage, StorageError};

pub struct HttpStorage {
    client: Client,
    endpoint: Url,
    /// Sent with every request (auth tokens, host overrides).
    headers: Headers,
}

impl HttpStorage {
    pub fn new(endpoint: Url, timeout: Duration, headers: Headers) -> Result<Self, StorageError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StorageError::transport(endpoint.as_str(), e.to_string()))?;
        Ok(Self {
            client,
            endpoint,
            headers,
        })
    }

    /// Request URL for an object; the name is escaped as one path segment.
    pub fn object_url(&self, name: &str) -> String {
        format!(
            "{}/{}",
            self.endpoint.as_str().trim_end_matches('/'),
            escape_name(name)
        )
    }

    fn with_headers(
        &self,
        mut request: RequestBuilder,
        extra: &[(String, String)],
    ) -> RequestBuilder {
        for (key, value) in self.headers.iter().chain(extra) {
            request = request.header(key.as_str(), value.as_str());
        }
        request
    }
}

impl std::fmt::Debug for HttpStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpStorage")
            .field("endpoint", &self.endpoint.as_str())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RemoteStorage for HttpStorage {
    async fn head(&self, name: &str) -> Result<HeadResponse, StorageError> {
        let request = self.with_headers(self.client.head(self.object_url(name)), &[]);
        let response = request
            .send()
            .await
            .map_err(|e| StorageError::transport(name, e.to_string()))?;

        let last_modified = response
            .headers()
            .get(LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_http_date);

        Ok(HeadResponse {
            status: response.status().as_u16(),
            last_modified,
        })
    }

    async fn put(
        &self,
        name: &str,
        body: Vec<u8>,
        headers: &Headers,
    ) -> Result<PutResponse, StorageError> {
        let request = self
            .with_headers(self.client.put(self.object_url(name)), headers)
            .body(body);
        let response = request
            .send()
            .await
            .map_err(|e| StorageError::transport(name, e.to_string()))?;

        Ok(PutResponse {
            status: response.status().as_u16(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(endpoint: &str) -> HttpStorage {
        HttpStorage::new(
            Url::parse(endpoint).unwrap(),
            Duration::from_secs(1),
            Vec::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_object_url_escapes_name() {
        let storage = storage("https://bucket.example.com/");
        assert_eq!(
            storage.object_url("a.js+b.js"),
            "https://bucket.example.com/a.js%2Bb.js"
        );
        assert_eq!(
            storage.object_url("css/site.css"),
            "https://bucket.example.com/css%2Fsite.css"
        );
    }

    #[test]
    fn test_object_url_with_prefix_path() {
        let storage = storage("https://s3.example.com/bucket");
        assert_eq!(
            storage.object_url("img/logo.png"),
            "https://s3.example.com/bucket/img%2Flogo.png"
        );
    }
}
