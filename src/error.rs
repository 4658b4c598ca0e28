//! Error taxonomy of the media endpoints.

use hyper::{Response, StatusCode};
use thiserror::Error;

use crate::http::range::RangeError;
use crate::http::response::{build_416_response, build_text_response, ResponseBody};
use crate::storage::StoreError;

/// Failure while answering a media request
#[derive(Error, Debug)]
pub enum MediaError {
    /// Missing or undecodable object name
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The store has no such key
    #[error("object not found: {0}")]
    NotFound(String),

    /// Range header failed to parse or lies outside the object
    #[error("range not satisfiable for {size}-byte object: {reason}")]
    RangeNotSatisfiable { size: u64, reason: RangeError },

    /// Any other store failure
    #[error("store error: {0}")]
    Store(StoreError),

    /// Response could not be assembled
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for MediaError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(key) => Self::NotFound(key),
            other => Self::Store(other),
        }
    }
}

impl MediaError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::RangeNotSatisfiable { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
            Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message sent to the client; backend details stay in the log
    pub const fn public_message(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "Filename is required",
            Self::NotFound(_) => "File not found",
            Self::RangeNotSatisfiable { .. } => "Invalid range",
            Self::Store(_) => "Error retrieving file",
            Self::Internal(_) => "Internal server error",
        }
    }

    pub fn into_response(self) -> Response<ResponseBody> {
        match self {
            Self::RangeNotSatisfiable { size, .. } => build_416_response(size),
            other => build_text_response(other.status(), other.public_message()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_not_found_maps_to_404() {
        let err = MediaError::from(StoreError::NotFound("a.mp3".to_string()));
        assert!(matches!(err, MediaError::NotFound(ref k) if k == "a.mp3"));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_other_store_errors_map_to_500() {
        let err = MediaError::from(StoreError::Backend("connection refused".to_string()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "Error retrieving file");

        let err = MediaError::from(StoreError::UnknownBucket("x".to_string()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_range_error_response() {
        let resp = MediaError::RangeNotSatisfiable {
            size: 42,
            reason: RangeError::Unsatisfiable,
        }
        .into_response();
        assert_eq!(resp.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(resp.headers()["Content-Range"], "bytes */42");
    }

    #[test]
    fn test_bad_request_response() {
        let resp = MediaError::BadRequest("empty name".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(resp.headers().get("Content-Range").is_none());
    }
}
