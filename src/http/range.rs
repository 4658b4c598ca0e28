//! HTTP Range request parsing module
//!
//! Single-range `bytes` parsing for partial content delivery (RFC 7233 subset).

use thiserror::Error;

/// Inclusive byte interval to deliver, `start <= end < total size`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes covered by the range
    #[inline]
    pub const fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` header value for a 206 response
    pub fn content_range(&self, total_size: u64) -> String {
        format!("bytes {}-{}/{total_size}", self.start, self.end)
    }
}

/// Why a Range header was rejected. Every variant is answered with 416.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RangeError {
    #[error("range unit is not `bytes`")]
    MissingUnit,
    #[error("range spec must have exactly one `-`")]
    Malformed,
    #[error("range bound is not a number")]
    InvalidNumber,
    #[error("range falls outside the object")]
    Unsatisfiable,
}

/// Parse an HTTP Range header against the object's total size
///
/// Supported formats:
/// - `bytes=start-end` - Specific range
/// - `bytes=start-` - From start to end
/// - `bytes=-suffix` - Last suffix bytes
///
/// Only the first range of a comma-separated list is honored; the others
/// are ignored rather than rejected.
///
/// # Arguments
/// * `header` - Value of the Range header
/// * `file_size` - Total object size
pub fn parse_range_header(header: &str, file_size: u64) -> Result<ByteRange, RangeError> {
    let spec = header
        .trim()
        .strip_prefix("bytes=")
        .ok_or(RangeError::MissingUnit)?;

    let first = spec.split(',').next().unwrap_or_default().trim();

    let parts: Vec<&str> = first.split('-').collect();
    if parts.len() != 2 {
        return Err(RangeError::Malformed);
    }

    let (start_str, end_str) = (parts[0].trim(), parts[1].trim());

    let range = if start_str.is_empty() {
        parse_suffix_range(end_str, file_size)?
    } else {
        parse_standard_range(start_str, end_str, file_size)?
    };

    if range.start > range.end || range.end >= file_size {
        return Err(RangeError::Unsatisfiable);
    }
    Ok(range)
}

/// Suffix range, e.g. "-500" for the last 500 bytes
fn parse_suffix_range(suffix_str: &str, file_size: u64) -> Result<ByteRange, RangeError> {
    let suffix = parse_bound(suffix_str)?;
    if file_size == 0 {
        return Err(RangeError::Unsatisfiable);
    }

    // A suffix longer than the object selects the whole object
    Ok(ByteRange {
        start: file_size.saturating_sub(suffix),
        end: file_size - 1,
    })
}

/// Standard range, e.g. "0-99" or "100-"
fn parse_standard_range(
    start_str: &str,
    end_str: &str,
    file_size: u64,
) -> Result<ByteRange, RangeError> {
    let start = parse_bound(start_str)?;
    let end = if end_str.is_empty() {
        file_size.checked_sub(1).ok_or(RangeError::Unsatisfiable)?
    } else {
        parse_bound(end_str)?
    };
    Ok(ByteRange { start, end })
}

fn parse_bound(s: &str) -> Result<u64, RangeError> {
    // u64::from_str accepts a leading '+', which is not valid in a byte range
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RangeError::InvalidNumber);
    }
    s.parse::<u64>().map_err(|_| RangeError::InvalidNumber)
}
