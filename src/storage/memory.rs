//! In-process storage for dry runs and tests.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::utils::date::now_millis;

use super::{HeadResponse, Headers, PutResponse, RemoteStorage, StorageError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Body as uploaded (gzip compressed by the publisher).
    pub body: Vec<u8>,
    pub headers: Headers,
    pub last_modified: u64,
}

impl StoredObject {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Default)]
struct State {
    objects: HashMap<String, StoredObject>,
    /// Statuses returned by upcoming puts before they fall back to 200.
    put_statuses: VecDeque<u16>,
    put_errors: usize,
    head_errors: bool,
    heads: Vec<String>,
    puts: Vec<String>,
}

/// Object map keyed by unescaped name; uploads are stamped with the clock.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    state: Mutex<State>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object with a fixed last-modified time.
    pub fn insert(&self, name: impl Into<String>, last_modified: u64) {
        self.state.lock().objects.insert(
            name.into(),
            StoredObject {
                body: Vec::new(),
                headers: Vec::new(),
                last_modified,
            },
        );
    }

    /// Answer the next puts with these statuses, in order.
    pub fn fail_puts_with(&self, statuses: impl IntoIterator<Item = u16>) {
        self.state.lock().put_statuses.extend(statuses);
    }

    /// Fail the next `count` puts with a transport error.
    pub fn fail_next_puts(&self, count: usize) {
        self.state.lock().put_errors += count;
    }

    /// Fail every head lookup with a transport error.
    pub fn fail_heads(&self) {
        self.state.lock().head_errors = true;
    }

    pub fn object(&self, name: &str) -> Option<StoredObject> {
        self.state.lock().objects.get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.state.lock().objects.keys().cloned().collect();
        names.sort();
        names
    }

    /// Names passed to `head`, in call order.
    pub fn head_calls(&self) -> Vec<String> {
        self.state.lock().heads.clone()
    }

    /// Names passed to `put`, in call order (including failed attempts).
    pub fn put_calls(&self) -> Vec<String> {
        self.state.lock().puts.clone()
    }
}

#[async_trait]
impl RemoteStorage for MemoryStorage {
    async fn head(&self, name: &str) -> Result<HeadResponse, StorageError> {
        let mut state = self.state.lock();
        state.heads.push(name.to_string());
        if state.head_errors {
            return Err(StorageError::transport(name, "injected head failure"));
        }
        Ok(state
            .objects
            .get(name)
            .map_or(HeadResponse::not_found(), |object| HeadResponse {
                status: 200,
                last_modified: Some(object.last_modified),
            }))
    }

    async fn put(
        &self,
        name: &str,
        body: Vec<u8>,
        headers: &Headers,
    ) -> Result<PutResponse, StorageError> {
        let mut state = self.state.lock();
        state.puts.push(name.to_string());
        if state.put_errors > 0 {
            state.put_errors -= 1;
            return Err(StorageError::transport(name, "injected put failure"));
        }
        if let Some(status) = state.put_statuses.pop_front()
            && status != 200
        {
            return Ok(PutResponse { status });
        }

        state.objects.insert(
            name.to_string(),
            StoredObject {
                body,
                headers: headers.clone(),
                last_modified: now_millis(),
            },
        );
        Ok(PutResponse { status: 200 })
    }
}
