//! Bucket listing module
//!
//! `GET {api_prefix}/music` and `GET {api_prefix}/images` return every object in
//! the class's bucket as JSON.

use futures::StreamExt;
use hyper::{Response, StatusCode};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;

use crate::config::AppState;
use crate::error::MediaError;
use crate::http::response::{build_json_response, ResponseBody};
use crate::logger;
use crate::media::MediaClass;
use crate::storage::{ListEntry, MediaStore};

/// Characters left as-is in object URLs; `/` keeps nested keys readable
const PATH_SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// One listed object, rebuilt on every listing request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaFileDescriptor {
    /// Base name, without any key prefix
    pub name: String,
    pub size: u64,
    /// Full object key
    pub path: String,
    pub url: String,
    #[serde(rename = "contentType")]
    pub content_type: String,
}

#[derive(Debug, Serialize)]
pub struct FileList {
    pub files: Vec<MediaFileDescriptor>,
}

pub async fn serve_listing(state: &AppState, class: MediaClass) -> Response<ResponseBody> {
    let bucket = state.bucket_for(class);
    let url_base = format!(
        "{}/{}",
        state.config.routes.public_prefix(),
        class.route_segment()
    );

    match collect_descriptors(state.store.as_ref(), bucket, class, &url_base).await {
        Ok(files) => {
            logger::log_debug(&format!("Listed {} objects in '{bucket}'", files.len()));
            build_json_response(StatusCode::OK, &FileList { files })
        }
        Err(err) => {
            logger::log_error(&format!("Listing of '{bucket}' failed: {err}"));
            err.into_response()
        }
    }
}

/// Drain the bucket listing in store order
///
/// Entries that fail on their own are logged and skipped; only a failure to
/// start the listing fails the call.
pub async fn collect_descriptors(
    store: &dyn MediaStore,
    bucket: &str,
    class: MediaClass,
    url_base: &str,
) -> Result<Vec<MediaFileDescriptor>, MediaError> {
    let mut entries = store.list(bucket)?;
    let mut files = Vec::new();

    while let Some(item) = entries.next().await {
        match item {
            Ok(entry) => files.push(describe(&entry, class, url_base)),
            Err(e) => logger::log_warning(&format!("Skipping entry in '{bucket}': {e}")),
        }
    }

    Ok(files)
}

fn describe(entry: &ListEntry, class: MediaClass, url_base: &str) -> MediaFileDescriptor {
    let name = entry
        .key
        .rsplit('/')
        .next()
        .unwrap_or(&entry.key)
        .to_string();

    MediaFileDescriptor {
        url: format!("{url_base}/{}", utf8_percent_encode(&entry.key, PATH_SAFE)),
        content_type: class.content_type(&name).to_string(),
        size: entry.size,
        path: entry.key.clone(),
        name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::test_support::{body_bytes, seeded_state, state_with, ScriptedStore};
    use std::sync::Arc;

    fn entry(key: &str, size: u64) -> ListEntry {
        ListEntry {
            key: key.to_string(),
            size,
        }
    }

    #[test]
    fn test_describe_nested_key() {
        let d = describe(&entry("albums/My Song.MP3", 42), MediaClass::Audio, "/api/music");
        assert_eq!(d.name, "My Song.MP3");
        assert_eq!(d.path, "albums/My Song.MP3");
        assert_eq!(d.url, "/api/music/albums/My%20Song.MP3");
        assert_eq!(d.content_type, "audio/mpeg");
        assert_eq!(d.size, 42);
    }

    #[tokio::test]
    async fn test_listing_json_shape() {
        let state = seeded_state(&[("images", "a.png", b"12345")]).await;
        let resp = serve_listing(&state, MediaClass::Image).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let value: serde_json::Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"files": [{
                "name": "a.png",
                "size": 5,
                "path": "a.png",
                "url": "/api/images/a.png",
                "contentType": "image/png"
            }]})
        );
    }

    #[tokio::test]
    async fn test_empty_listing_is_empty_array() {
        let state = seeded_state(&[]).await;
        let resp = serve_listing(&state, MediaClass::Audio).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_bytes(resp).await, r#"{"files":[]}"#);
    }

    #[tokio::test]
    async fn test_failed_entries_are_skipped() {
        let mut store = ScriptedStore::new(Vec::new());
        store.listing = vec![
            Ok(entry("one.mp3", 1)),
            Err("transient".to_string()),
            Ok(entry("two.flac", 2)),
        ];

        let files = collect_descriptors(&store, "music", MediaClass::Audio, "/api/music")
            .await
            .unwrap();
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["one.mp3", "two.flac"]);
        assert_eq!(files[1].content_type, "audio/flac");
    }

    #[tokio::test]
    async fn test_listing_failure_is_500() {
        let mut store = ScriptedStore::new(Vec::new());
        store.list_error = true;
        let state = state_with(Arc::new(store));

        let resp = serve_listing(&state, MediaClass::Audio).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_public_prefix_in_urls() {
        let mut store = ScriptedStore::new(Vec::new());
        store.listing = vec![Ok(entry("x.ogg", 3))];
        let mut config = crate::config::test_config();
        config.routes.public_url_prefix = Some("/gomedia/api".to_string());
        let state = AppState::new(config, Arc::new(store));

        let resp = serve_listing(&state, MediaClass::Audio).await;
        let value: serde_json::Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
        assert_eq!(value["files"][0]["url"], "/gomedia/api/music/x.ogg");
    }
}
