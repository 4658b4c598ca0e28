//! Shared fixtures for handler tests.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{TimeZone, Utc};
use futures::StreamExt;
use http_body_util::BodyExt;
use hyper::Response;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::config::{test_config, AppState};
use crate::http::cache::ConditionalContext;
use crate::http::range::ByteRange;
use crate::http::ResponseBody;
use crate::storage::{
    ByteStream, EntryStream, ListEntry, MediaStore, ObjectMetadata, ObjectStoreBackend, StoreError,
};

use super::router::RequestContext;

/// State over an in-memory store holding `(bucket, key, bytes)` objects
pub async fn seeded_state(objects: &[(&str, &str, &[u8])]) -> Arc<AppState> {
    let config = test_config();
    let backend = ObjectStoreBackend::in_memory(&[
        config.storage.music_bucket.as_str(),
        config.storage.image_bucket.as_str(),
    ]);
    for (bucket, key, data) in objects {
        backend
            .put(bucket, key, Bytes::copy_from_slice(data))
            .await
            .unwrap();
    }
    Arc::new(AppState::new(config, Arc::new(backend)))
}

pub fn state_with(store: Arc<dyn MediaStore>) -> Arc<AppState> {
    Arc::new(AppState::new(test_config(), store))
}

pub fn get_ctx(path: &str) -> RequestContext<'_> {
    RequestContext {
        path,
        is_head: false,
        conditional: ConditionalContext::default(),
        range_header: None,
    }
}

pub async fn body_bytes(resp: Response<ResponseBody>) -> Bytes {
    resp.into_body().collect().await.unwrap().to_bytes()
}

/// `n` deterministic, position-dependent bytes
pub fn pattern(n: usize) -> Vec<u8> {
    (0..n).map(|i| u8::try_from(i % 251).unwrap()).collect()
}

/// Scripted store: fixed metadata, chunked bodies that report when they are
/// dropped, and a listing with injectable per-entry failures.
pub struct ScriptedStore {
    pub data: Vec<u8>,
    pub chunk_size: usize,
    pub stat_error: Mutex<Option<StoreError>>,
    pub listing: Vec<Result<ListEntry, String>>,
    pub list_error: bool,
    pub opened: AtomicUsize,
    pub released: Arc<AtomicBool>,
}

impl ScriptedStore {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            chunk_size: 16,
            stat_error: Mutex::new(None),
            listing: Vec::new(),
            list_error: false,
            opened: AtomicUsize::new(0),
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    fn open(&self, start: usize, end_exclusive: usize) -> ByteStream {
        self.opened.fetch_add(1, Ordering::SeqCst);
        let guard = ReleaseGuard(Arc::clone(&self.released));
        let chunks: Vec<Result<Bytes, StoreError>> = self.data[start..end_exclusive]
            .chunks(self.chunk_size)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        futures::stream::iter(chunks)
            .map(move |chunk| {
                let _held = &guard;
                chunk
            })
            .boxed()
    }
}

/// Flags the read handle as released when the body stream is dropped
struct ReleaseGuard(Arc<AtomicBool>);

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl MediaStore for ScriptedStore {
    async fn stat(&self, _bucket: &str, _key: &str) -> Result<ObjectMetadata, StoreError> {
        if let Some(err) = self.stat_error.lock().unwrap().take() {
            return Err(err);
        }
        Ok(ObjectMetadata {
            size: self.data.len() as u64,
            etag: Some("\"scripted\"".to_string()),
            last_modified: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        })
    }

    async fn get(&self, _bucket: &str, _key: &str) -> Result<ByteStream, StoreError> {
        Ok(self.open(0, self.data.len()))
    }

    async fn get_range(
        &self,
        _bucket: &str,
        _key: &str,
        range: ByteRange,
    ) -> Result<ByteStream, StoreError> {
        let start = usize::try_from(range.start).unwrap();
        let end = usize::try_from(range.end).unwrap();
        Ok(self.open(start, end + 1))
    }

    fn list<'a>(&'a self, bucket: &str) -> Result<EntryStream<'a>, StoreError> {
        if self.list_error {
            return Err(StoreError::Backend(format!("cannot reach {bucket}")));
        }
        let items: Vec<Result<ListEntry, StoreError>> = self
            .listing
            .iter()
            .map(|item| item.clone().map_err(StoreError::Backend))
            .collect();
        Ok(futures::stream::iter(items).boxed())
    }
}
