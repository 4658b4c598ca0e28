//! HTTP cache control module
//!
//! Conditional request evaluation, HTTP-date helpers and `Cache-Control` policies.

use chrono::{DateTime, Duration, Utc};

use crate::storage::ObjectMetadata;

/// Client-supplied validators
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditionalContext {
    pub if_none_match: Option<String>,
    pub if_modified_since: Option<String>,
}

/// Outcome of conditional evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Client copy is current, answer 304
    Fresh,
    /// Send the representation
    Stale,
}

impl ConditionalContext {
    /// Decide whether the client's cached copy is still current
    ///
    /// `If-None-Match` is compared by exact string equality and wins over
    /// `If-Modified-Since` whenever it matches. The date check works at whole
    /// seconds since HTTP dates carry no sub-second part.
    pub fn evaluate(&self, meta: &ObjectMetadata) -> Freshness {
        if let (Some(client_etag), Some(etag)) = (self.if_none_match.as_deref(), &meta.etag) {
            if client_etag == etag {
                return Freshness::Fresh;
            }
        }

        if let Some(since) = self.if_modified_since.as_deref().and_then(parse_http_date) {
            if meta.last_modified < since + Duration::seconds(1) {
                return Freshness::Fresh;
            }
        }

        Freshness::Stale
    }
}

/// Parse an IMF-fixdate such as `Sun, 06 Nov 1994 08:49:37 GMT`
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Format a timestamp as an IMF-fixdate for `Last-Modified`
pub fn format_http_date(time: &DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Cache control policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Public cache with specified max-age (seconds)
    Public(u32),
}

impl CachePolicy {
    /// Convert to Cache-Control header value
    pub fn to_header_value(self) -> String {
        match self {
            Self::Public(max_age) => format!("public, max-age={max_age}"),
        }
    }
}
