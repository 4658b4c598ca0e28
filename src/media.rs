//! Media classes served by the gateway and their delivery policy.

use crate::config::StorageConfig;
use crate::http::cache::CachePolicy;
use crate::http::mime;

/// Images rarely change once uploaded; let browsers keep them for a day
const IMAGE_MAX_AGE: u32 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaClass {
    Audio,
    Image,
}

impl MediaClass {
    pub const ALL: [Self; 2] = [Self::Audio, Self::Image];

    /// Path segment under the API prefix, e.g. `/api/music/...`
    pub const fn route_segment(self) -> &'static str {
        match self {
            Self::Audio => "music",
            Self::Image => "images",
        }
    }

    pub fn bucket(self, storage: &StorageConfig) -> &str {
        match self {
            Self::Audio => &storage.music_bucket,
            Self::Image => &storage.image_bucket,
        }
    }

    pub fn content_type(self, filename: &str) -> &'static str {
        match self {
            Self::Audio => mime::audio_content_type(filename),
            Self::Image => mime::image_content_type(filename),
        }
    }

    /// Whether byte-range requests are honored (and `Accept-Ranges` advertised)
    pub const fn supports_ranges(self) -> bool {
        matches!(self, Self::Audio)
    }

    /// Explicit freshness lifetime; audio relies on validators alone
    pub const fn cache_policy(self) -> Option<CachePolicy> {
        match self {
            Self::Audio => None,
            Self::Image => Some(CachePolicy::Public(IMAGE_MAX_AGE)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_table() {
        assert!(MediaClass::Audio.supports_ranges());
        assert!(!MediaClass::Image.supports_ranges());
        assert_eq!(MediaClass::Audio.cache_policy(), None);
        assert_eq!(
            MediaClass::Image.cache_policy(),
            Some(CachePolicy::Public(86_400))
        );
    }

    #[test]
    fn test_content_type_uses_class_table() {
        assert_eq!(MediaClass::Audio.content_type("a.MP3"), "audio/mpeg");
        assert_eq!(MediaClass::Image.content_type("a.png"), "image/png");
        assert_eq!(MediaClass::Image.content_type("a.mp3"), mime::OCTET_STREAM);
    }

    #[test]
    fn test_bucket_selection() {
        let storage = StorageConfig {
            music_bucket: "tunes".to_string(),
            image_bucket: "pics".to_string(),
            ..StorageConfig::default()
        };
        assert_eq!(MediaClass::Audio.bucket(&storage), "tunes");
        assert_eq!(MediaClass::Image.bucket(&storage), "pics");
    }
}
