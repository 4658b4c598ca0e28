//! HTTP response building module
//!
//! Response body type shared by every handler, plus builders for the fixed
//! status responses.

use futures::{Stream, TryStreamExt};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Full, StreamBody};
use hyper::body::{Bytes, Frame};
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::http::response::Builder;
use hyper::{Response, StatusCode};
use serde::Serialize;
use std::io;

/// Body of every response: either buffered bytes or a streamed object
pub type ResponseBody = UnsyncBoxBody<Bytes, io::Error>;

/// Buffered body
pub fn full_body(data: impl Into<Bytes>) -> ResponseBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// Empty body (304, HEAD, 204)
pub fn empty_body() -> ResponseBody {
    full_body(Bytes::new())
}

/// Streamed body; frames are forwarded as they arrive, nothing is buffered
pub fn stream_body<S>(stream: S) -> ResponseBody
where
    S: Stream<Item = Result<Bytes, io::Error>> + Send + 'static,
{
    StreamBody::new(stream.map_ok(Frame::data)).boxed_unsync()
}

/// Build a short plain-text response
pub fn build_text_response(status: StatusCode, message: &'static str) -> Response<ResponseBody> {
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain; charset=utf-8")
        .header("Content-Length", message.len())
        .body(full_body(message))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(full_body(message))
        })
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<ResponseBody> {
    build_text_response(StatusCode::NOT_FOUND, "404 Not Found")
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<ResponseBody> {
    let mut resp = build_text_response(StatusCode::METHOD_NOT_ALLOWED, "405 Method Not Allowed");
    resp.headers_mut()
        .insert("Allow", hyper::header::HeaderValue::from_static(ALLOWED_METHODS));
    resp
}

/// Build health check response
pub fn build_health_response() -> Response<ResponseBody> {
    build_text_response(StatusCode::OK, "OK")
}

/// Build 416 Range Not Satisfiable response
pub fn build_416_response(file_size: u64) -> Response<ResponseBody> {
    build_416_response_from(Response::builder(), file_size)
}

/// Build a 416 on top of a builder that may already carry object headers
///
/// The object's `Content-Type` is replaced, since the body is a text message.
pub fn build_416_response_from(mut builder: Builder, file_size: u64) -> Response<ResponseBody> {
    let message = "Invalid range";
    if let Some(headers) = builder.headers_mut() {
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
    }
    builder
        .status(StatusCode::RANGE_NOT_SATISFIABLE)
        .header("Content-Length", message.len())
        .header("Content-Range", format!("bytes */{file_size}"))
        .body(full_body(message))
        .unwrap_or_else(|e| {
            log_build_error("416", &e);
            Response::new(full_body(message))
        })
}

/// Build OPTIONS response (preflight request)
pub fn build_options_response(enable_cors: bool) -> Response<ResponseBody> {
    let mut builder = Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Allow", ALLOWED_METHODS);

    if enable_cors {
        builder = builder
            .header("Access-Control-Allow-Methods", ALLOWED_METHODS)
            .header(
                "Access-Control-Allow-Headers",
                "Content-Type, Range, If-None-Match, If-Modified-Since",
            )
            .header("Access-Control-Max-Age", "86400");
    }

    builder.body(empty_body()).unwrap_or_else(|e| {
        log_build_error("OPTIONS", &e);
        Response::new(empty_body())
    })
}

/// Build JSON response
pub fn build_json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<ResponseBody> {
    let json = match serde_json::to_vec(body) {
        Ok(j) => j,
        Err(e) => {
            crate::logger::log_error(&format!("Failed to serialize response: {e}"));
            return build_text_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
            );
        }
    };

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Content-Length", json.len())
        .body(full_body(json))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(empty_body())
        })
}

const ALLOWED_METHODS: &str = "GET, HEAD, OPTIONS";

/// Log response build error
pub fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
