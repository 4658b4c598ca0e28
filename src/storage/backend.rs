//! `object_store`-backed media store.
//!
//! `object_store` clients are bound to one bucket, so the backend keeps one
//! client per configured bucket name.

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::{GetOptions, GetRange, ObjectStore, PutPayload};
use std::collections::HashMap;
use std::sync::Arc;

use super::{ByteStream, EntryStream, ListEntry, MediaStore, ObjectMetadata, StoreError};
use crate::config::{StorageBackendKind, StorageConfig};
use crate::http::range::ByteRange;
use crate::logger;

/// Media store over one `ObjectStore` client per bucket
pub struct ObjectStoreBackend {
    buckets: HashMap<String, Arc<dyn ObjectStore>>,
}

impl ObjectStoreBackend {
    /// Build the backend selected by the storage configuration
    pub fn from_config(config: &StorageConfig) -> Result<Self, StoreError> {
        let names = [config.music_bucket.as_str(), config.image_bucket.as_str()];
        match config.backend {
            StorageBackendKind::S3 => Self::s3(config, &names),
            StorageBackendKind::Memory => Ok(Self::in_memory(&names)),
        }
    }

    /// S3-compatible backend (AWS, `MinIO`, ...)
    pub fn s3(config: &StorageConfig, names: &[&str]) -> Result<Self, StoreError> {
        let mut buckets: HashMap<String, Arc<dyn ObjectStore>> = HashMap::new();

        for name in names {
            let mut builder = AmazonS3Builder::new()
                .with_bucket_name(*name)
                .with_region(&config.region);

            if let Some(endpoint) = &config.endpoint {
                // MinIO and friends use path-style addressing
                builder = builder
                    .with_endpoint(endpoint)
                    .with_virtual_hosted_style_request(false);
            }
            if let Some(access_key) = &config.access_key_id {
                builder = builder.with_access_key_id(access_key);
            }
            if let Some(secret_key) = &config.secret_access_key {
                builder = builder.with_secret_access_key(secret_key);
            }
            if config.allow_http {
                builder = builder.with_allow_http(true);
            }

            let store = builder.build().map_err(|e| {
                StoreError::Backend(format!("Failed to create S3 client for '{name}': {e}"))
            })?;
            buckets.insert((*name).to_string(), Arc::new(store));
        }

        Ok(Self { buckets })
    }

    /// In-memory backend with one empty store per bucket
    pub fn in_memory(names: &[&str]) -> Self {
        let buckets = names
            .iter()
            .map(|name| {
                let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
                ((*name).to_string(), store)
            })
            .collect();
        Self { buckets }
    }

    /// Upload an object
    pub async fn put(&self, bucket: &str, key: &str, data: Bytes) -> Result<(), StoreError> {
        self.bucket(bucket)?
            .put(&Path::from(key), PutPayload::from_bytes(data))
            .await
            .map_err(|e| map_store_error(key, e))?;
        Ok(())
    }

    /// Upload every regular file found in `<dir>/<bucket>/` into its bucket
    ///
    /// Returns the number of uploaded objects. Missing bucket directories are skipped.
    pub async fn seed_from_dir(&self, dir: &str) -> Result<usize, StoreError> {
        let mut uploaded = 0;

        for bucket in self.buckets.keys() {
            let bucket_dir = std::path::Path::new(dir).join(bucket);
            let Ok(mut entries) = tokio::fs::read_dir(&bucket_dir).await else {
                logger::log_warning(&format!(
                    "Seed directory not found: {}",
                    bucket_dir.display()
                ));
                continue;
            };

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| StoreError::Backend(format!("Failed to read seed dir: {e}")))?
            {
                let path = entry.path();
                if !path.is_file() {
                    continue;
                }
                let Some(key) = path.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                let data = tokio::fs::read(&path).await.map_err(|e| {
                    StoreError::Backend(format!("Failed to read '{}': {e}", path.display()))
                })?;
                self.put(bucket, key, Bytes::from(data)).await?;
                uploaded += 1;
            }
        }

        Ok(uploaded)
    }

    fn bucket(&self, name: &str) -> Result<&Arc<dyn ObjectStore>, StoreError> {
        self.buckets
            .get(name)
            .ok_or_else(|| StoreError::UnknownBucket(name.to_string()))
    }
}

#[async_trait]
impl MediaStore for ObjectStoreBackend {
    async fn stat(&self, bucket: &str, key: &str) -> Result<ObjectMetadata, StoreError> {
        let meta = self
            .bucket(bucket)?
            .head(&Path::from(key))
            .await
            .map_err(|e| map_store_error(key, e))?;

        Ok(ObjectMetadata {
            size: meta.size as u64,
            etag: meta.e_tag,
            last_modified: meta.last_modified,
        })
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<ByteStream, StoreError> {
        let result = self
            .bucket(bucket)?
            .get(&Path::from(key))
            .await
            .map_err(|e| map_store_error(key, e))?;

        Ok(into_byte_stream(key, result))
    }

    async fn get_range(
        &self,
        bucket: &str,
        key: &str,
        range: ByteRange,
    ) -> Result<ByteStream, StoreError> {
        let start = to_offset(range.start)?;
        let end = to_offset(range.end)?;
        let options = GetOptions {
            range: Some(GetRange::Bounded(start..end + 1)),
            ..GetOptions::default()
        };

        let result = self
            .bucket(bucket)?
            .get_opts(&Path::from(key), options)
            .await
            .map_err(|e| map_store_error(key, e))?;

        Ok(into_byte_stream(key, result))
    }

    fn list<'a>(&'a self, bucket: &str) -> Result<EntryStream<'a>, StoreError> {
        let store = self.bucket(bucket)?;
        let bucket = bucket.to_string();
        let entries = store.list(None).map(move |item| {
            item.map(|meta| ListEntry {
                key: meta.location.to_string(),
                size: meta.size as u64,
            })
            .map_err(|e| StoreError::Backend(format!("Listing '{bucket}' failed: {e}")))
        });
        Ok(entries.boxed())
    }
}

fn into_byte_stream(key: &str, result: object_store::GetResult) -> ByteStream {
    let key = key.to_string();
    result
        .into_stream()
        .map(move |chunk| chunk.map_err(|e| map_store_error(&key, e)))
        .boxed()
}

fn map_store_error(key: &str, error: object_store::Error) -> StoreError {
    match error {
        object_store::Error::NotFound { .. } => StoreError::NotFound(key.to_string()),
        e => StoreError::Backend(e.to_string()),
    }
}

fn to_offset(value: u64) -> Result<usize, StoreError> {
    usize::try_from(value).map_err(|_| StoreError::Backend(format!("offset {value} too large")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::probe_bucket;
    use futures::TryStreamExt;

    async fn collect(stream: ByteStream) -> Vec<u8> {
        let chunks: Vec<Bytes> = stream.try_collect().await.unwrap();
        chunks.concat()
    }

    async fn seeded() -> ObjectStoreBackend {
        let backend = ObjectStoreBackend::in_memory(&["music", "images"]);
        backend
            .put("music", "song.mp3", Bytes::from_static(b"0123456789"))
            .await
            .unwrap();
        backend
    }

    #[tokio::test]
    async fn test_stat_reports_size_and_etag() {
        let backend = seeded().await;
        let meta = backend.stat("music", "song.mp3").await.unwrap();
        assert_eq!(meta.size, 10);
        assert!(meta.etag.is_some());
    }

    #[tokio::test]
    async fn test_stat_missing_is_not_found() {
        let backend = seeded().await;
        let err = backend.stat("music", "missing.mp3").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(k) if k == "missing.mp3"));
    }

    #[tokio::test]
    async fn test_unknown_bucket() {
        let backend = seeded().await;
        let err = backend.stat("videos", "song.mp3").await.unwrap_err();
        assert!(matches!(err, StoreError::UnknownBucket(_)));
        assert!(backend.list("videos").is_err());
    }

    #[tokio::test]
    async fn test_get_whole_object() {
        let backend = seeded().await;
        let body = collect(backend.get("music", "song.mp3").await.unwrap()).await;
        assert_eq!(body, b"0123456789");
    }

    #[tokio::test]
    async fn test_get_range_is_inclusive() {
        let backend = seeded().await;
        let range = ByteRange { start: 2, end: 5 };
        let body = collect(backend.get_range("music", "song.mp3", range).await.unwrap()).await;
        assert_eq!(body, b"2345");
    }

    #[tokio::test]
    async fn test_list_entries() {
        let backend = seeded().await;
        backend
            .put("music", "albums/a/track.flac", Bytes::from_static(b"abc"))
            .await
            .unwrap();

        let mut entries: Vec<ListEntry> = backend
            .list("music")
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        entries.sort_by(|a, b| a.key.cmp(&b.key));

        assert_eq!(
            entries,
            vec![
                ListEntry {
                    key: "albums/a/track.flac".to_string(),
                    size: 3
                },
                ListEntry {
                    key: "song.mp3".to_string(),
                    size: 10
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_probe_bucket() {
        let backend = seeded().await;
        assert!(probe_bucket(&backend, "music").await);
        assert!(probe_bucket(&backend, "images").await);
        assert!(!probe_bucket(&backend, "videos").await);
    }
}
