//! MIME type detection module
//!
//! Returns the Content-Type of a media file from its extension. Audio and
//! image files have separate tables; anything unknown is served as
//! `application/octet-stream`.

pub const OCTET_STREAM: &str = "application/octet-stream";

/// Lower-cased extension of a file name, if it has one
///
/// Everything after the last `.` of the base name counts, so a bare `.mp3`
/// still has the extension `mp3`.
pub fn extension_of(filename: &str) -> Option<String> {
    let base = filename.rsplit('/').next().unwrap_or(filename);
    base.rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
}

/// Get audio Content-Type based on file name
///
/// # Examples
/// ```ignore
/// assert_eq!(audio_content_type("Track.MP3"), "audio/mpeg");
/// assert_eq!(audio_content_type("notes"), "application/octet-stream");
/// ```
pub fn audio_content_type(filename: &str) -> &'static str {
    match extension_of(filename).as_deref() {
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("ogg") => "audio/ogg",
        Some("m4a") => "audio/mp4",
        Some("flac") => "audio/flac",
        _ => OCTET_STREAM,
    }
}

/// Get image Content-Type based on file name
pub fn image_content_type(filename: &str) -> &'static str {
    match extension_of(filename).as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("bmp") => "image/bmp",
        Some("ico") => "image/x-icon",
        _ => OCTET_STREAM,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_types() {
        assert_eq!(audio_content_type("a.mp3"), "audio/mpeg");
        assert_eq!(audio_content_type("a.wav"), "audio/wav");
        assert_eq!(audio_content_type("a.ogg"), "audio/ogg");
        assert_eq!(audio_content_type("a.m4a"), "audio/mp4");
        assert_eq!(audio_content_type("a.flac"), "audio/flac");
    }

    #[test]
    fn test_image_types() {
        assert_eq!(image_content_type("a.jpg"), "image/jpeg");
        assert_eq!(image_content_type("a.jpeg"), "image/jpeg");
        assert_eq!(image_content_type("a.png"), "image/png");
        assert_eq!(image_content_type("a.gif"), "image/gif");
        assert_eq!(image_content_type("a.webp"), "image/webp");
        assert_eq!(image_content_type("a.svg"), "image/svg+xml");
        assert_eq!(image_content_type("a.bmp"), "image/bmp");
        assert_eq!(image_content_type("a.ico"), "image/x-icon");
    }

    #[test]
    fn test_extension_edge_cases() {
        assert_eq!(extension_of(".mp3").as_deref(), Some("mp3"));
        assert_eq!(audio_content_type(".mp3"), "audio/mpeg");
        assert_eq!(extension_of("album.v2/track").as_deref(), None);
        assert_eq!(extension_of("notes"), None);
        assert_eq!(audio_content_type("trailing."), OCTET_STREAM);
        assert_eq!(image_content_type("a/b/c.tar.PNG"), "image/png");
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(audio_content_type("LOUD.MP3"), "audio/mpeg");
        assert_eq!(audio_content_type("mixed.Mp3"), "audio/mpeg");
        assert_eq!(image_content_type("PHOTO.JPEG"), "image/jpeg");
    }

    #[test]
    fn test_tables_are_independent() {
        assert_eq!(audio_content_type("cover.png"), OCTET_STREAM);
        assert_eq!(image_content_type("song.mp3"), OCTET_STREAM);
    }

    #[test]
    fn test_unknown_extension() {
        assert_eq!(audio_content_type("a.xyz"), OCTET_STREAM);
        assert_eq!(audio_content_type("no_extension"), OCTET_STREAM);
        assert_eq!(image_content_type("dir/.hidden"), OCTET_STREAM);
        assert_eq!(image_content_type(""), OCTET_STREAM);
    }

    #[test]
    fn test_nested_key() {
        assert_eq!(audio_content_type("albums/2024/intro.flac"), "audio/flac");
    }
}
