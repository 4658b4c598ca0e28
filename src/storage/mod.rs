//! Object storage module
//!
//! The contract the responders consume from the object store, plus the
//! `object_store`-backed implementation.

mod backend;

pub use backend::ObjectStoreBackend;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use futures::StreamExt;
use thiserror::Error;

use crate::http::range::ByteRange;
use crate::logger;

/// Streamed object body. Dropping it releases the store-side read handle.
pub type ByteStream = BoxStream<'static, Result<Bytes, StoreError>>;

/// Lazily produced listing; each entry can fail on its own.
pub type EntryStream<'a> = BoxStream<'a, Result<ListEntry, StoreError>>;

/// Snapshot of an object's metadata, fetched per request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMetadata {
    /// Size in bytes
    pub size: u64,
    /// Store-assigned version tag, passed through verbatim
    pub etag: Option<String>,
    pub last_modified: DateTime<Utc>,
}

/// One listed object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub key: String,
    pub size: u64,
}

/// Storage errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// The bucket holds no such key
    #[error("object not found: {0}")]
    NotFound(String),

    /// Bucket is not configured for this store
    #[error("unknown bucket: {0}")]
    UnknownBucket(String),

    /// Any other backend failure, connectivity included
    #[error("backend error: {0}")]
    Backend(String),
}

/// Read side of an object store
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Fetch object metadata
    async fn stat(&self, bucket: &str, key: &str) -> Result<ObjectMetadata, StoreError>;

    /// Open the whole object as a stream
    async fn get(&self, bucket: &str, key: &str) -> Result<ByteStream, StoreError>;

    /// Open an inclusive byte interval of the object as a stream
    async fn get_range(
        &self,
        bucket: &str,
        key: &str,
        range: ByteRange,
    ) -> Result<ByteStream, StoreError>;

    /// Enumerate every object in a bucket, recursively
    fn list<'a>(&'a self, bucket: &str) -> Result<EntryStream<'a>, StoreError>;
}

/// Check that a bucket answers a listing call
///
/// Logs the outcome; an unreachable bucket is reported, not fatal.
pub async fn probe_bucket(store: &dyn MediaStore, bucket: &str) -> bool {
    let result = match store.list(bucket) {
        Ok(mut entries) => entries.next().await.transpose().map(|_| ()),
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => {
            logger::log_info(&format!("✓ Bucket reachable: {bucket}"));
            true
        }
        Err(e) => {
            logger::log_warning(&format!("Bucket '{bucket}' check failed: {e}"));
            false
        }
    }
}
