//! Object streaming module
//!
//! Turns one stored object plus the request's validators and `Range` header
//! into a 200, 206, 304 or error response. Bodies are forwarded from the store
//! chunk by chunk; nothing is buffered whole.

use bytes::Bytes;
use futures::Stream;
use hyper::header::HeaderValue;
use hyper::http::response::Builder;
use hyper::{Response, StatusCode};
use percent_encoding::percent_decode_str;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::config::AppState;
use crate::error::MediaError;
use crate::handler::router::RequestContext;
use crate::http::cache::{format_http_date, Freshness};
use crate::http::range::{parse_range_header, ByteRange};
use crate::http::response::{build_416_response_from, empty_body, stream_body, ResponseBody};
use crate::logger;
use crate::media::MediaClass;
use crate::storage::{ByteStream, ObjectMetadata, StoreError};

/// What to send once metadata is known
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    NotModified,
    Full,
    Partial(ByteRange),
}

/// Serve one object of `class`; `raw_name` is the still-encoded path tail
pub async fn serve_object(
    ctx: &RequestContext<'_>,
    state: &AppState,
    class: MediaClass,
    raw_name: &str,
) -> Response<ResponseBody> {
    let result = match decode_object_key(raw_name) {
        Ok(key) => deliver(ctx, state, class, &key).await.map_err(|e| (key, e)),
        Err(e) => Err((raw_name.to_string(), e)),
    };

    match result {
        Ok(resp) => resp,
        Err((key, err)) => {
            let message = format!("{} '{key}': {err}", class.route_segment());
            if err.status().is_server_error() {
                logger::log_error(&message);
            } else {
                logger::log_warning(&message);
            }
            err.into_response()
        }
    }
}

/// Percent-decode the object key taken from the request path
pub fn decode_object_key(raw: &str) -> Result<String, MediaError> {
    let key = percent_decode_str(raw)
        .decode_utf8()
        .map_err(|e| MediaError::BadRequest(format!("object name is not UTF-8: {e}")))?;
    if key.is_empty() {
        return Err(MediaError::BadRequest("missing object name".to_string()));
    }
    Ok(key.into_owned())
}

/// Decide between 304, 200 and 206, in that order of precedence
///
/// A `Range` header only counts for classes that support ranges; for the rest
/// the full object is sent.
pub fn plan_delivery(
    ctx: &RequestContext<'_>,
    meta: &ObjectMetadata,
    class: MediaClass,
) -> Result<Delivery, MediaError> {
    if ctx.conditional.evaluate(meta) == Freshness::Fresh {
        return Ok(Delivery::NotModified);
    }

    match ctx.range_header.as_deref() {
        Some(header) if class.supports_ranges() => parse_range_header(header, meta.size)
            .map(Delivery::Partial)
            .map_err(|reason| MediaError::RangeNotSatisfiable {
                size: meta.size,
                reason,
            }),
        _ => Ok(Delivery::Full),
    }
}

async fn deliver(
    ctx: &RequestContext<'_>,
    state: &AppState,
    class: MediaClass,
    key: &str,
) -> Result<Response<ResponseBody>, MediaError> {
    let bucket = state.bucket_for(class);
    let meta = state.store.stat(bucket, key).await?;
    let builder = object_headers(Response::builder(), class, key, &meta);
    let delivery = match plan_delivery(ctx, &meta, class) {
        Ok(delivery) => delivery,
        Err(MediaError::RangeNotSatisfiable { size, reason }) => {
            logger::log_warning(&format!(
                "{} '{key}': range not satisfiable for {size}-byte object: {reason}",
                class.route_segment()
            ));
            return Ok(build_416_response_from(builder, size));
        }
        Err(e) => return Err(e),
    };

    let response = match delivery {
        Delivery::NotModified => {
            logger::log_debug(&format!("{key}: not modified"));
            builder.status(StatusCode::NOT_MODIFIED).body(empty_body())
        }
        Delivery::Full => {
            let body = if ctx.is_head {
                empty_body()
            } else {
                let stream = state.store.get(bucket, key).await?;
                stream_body(TrackedStream::new(stream, key, "full", meta.size))
            };
            builder
                .status(StatusCode::OK)
                .header("Content-Length", meta.size)
                .body(body)
        }
        Delivery::Partial(range) => {
            let body = if ctx.is_head {
                empty_body()
            } else {
                let stream = state.store.get_range(bucket, key, range).await?;
                stream_body(TrackedStream::new(stream, key, "partial", range.len()))
            };
            builder
                .status(StatusCode::PARTIAL_CONTENT)
                .header("Content-Length", range.len())
                .header("Content-Range", range.content_range(meta.size))
                .body(body)
        }
    };

    response.map_err(|e| MediaError::Internal(format!("failed to build response: {e}")))
}

/// Headers sent with every 200/206/304/416 for the object
fn object_headers(
    mut builder: Builder,
    class: MediaClass,
    key: &str,
    meta: &ObjectMetadata,
) -> Builder {
    builder = builder
        .header("Content-Type", class.content_type(key))
        .header("Last-Modified", format_http_date(&meta.last_modified));

    if class.supports_ranges() {
        builder = builder.header("Accept-Ranges", "bytes");
    }
    if let Some(etag) = meta
        .etag
        .as_deref()
        .and_then(|tag| HeaderValue::from_str(tag).ok())
    {
        builder = builder.header("ETag", etag);
    }
    if let Some(policy) = class.cache_policy() {
        builder = builder.header("Cache-Control", policy.to_header_value());
    }
    builder
}

/// Body stream that counts what was forwarded and reports the outcome once
/// dropped. Dropping it drops the store stream, which releases the read handle
/// whether the copy finished, failed or the client went away.
struct TrackedStream {
    inner: ByteStream,
    key: String,
    kind: &'static str,
    expected: u64,
    sent: u64,
    error: Option<String>,
}

impl TrackedStream {
    fn new(inner: ByteStream, key: &str, kind: &'static str, expected: u64) -> Self {
        Self {
            inner,
            key: key.to_string(),
            kind,
            expected,
            sent: 0,
            error: None,
        }
    }
}

impl Stream for TrackedStream {
    type Item = Result<Bytes, io::Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.inner.as_mut().poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                self.sent += chunk.len() as u64;
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(e))) => {
                self.error = Some(e.to_string());
                Poll::Ready(Some(Err(into_io_error(e))))
            }
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for TrackedStream {
    fn drop(&mut self) {
        if let Some(ref cause) = self.error {
            logger::log_error(&format!(
                "Stream of '{}' failed after {} of {} bytes: {cause}",
                self.key, self.sent, self.expected
            ));
        } else if self.sent >= self.expected {
            logger::log_info(&format!(
                "Served '{}' ({}): {} bytes",
                self.key, self.kind, self.sent
            ));
        } else {
            logger::log_info(&format!(
                "Client disconnected from '{}' after {} of {} bytes",
                self.key, self.sent, self.expected
            ));
        }
    }
}

fn into_io_error(err: StoreError) -> io::Error {
    io::Error::other(err)
}
