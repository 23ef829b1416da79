//! Path utilities for detecting candidate media files by extension.

use std::path::Path;

/// Extensions the Scanner treats as candidate media files.
const MEDIA_EXTENSIONS: &[&str] = &["mkv", "mp4", "avi", "mov", "m4v", "ts", "wmv"];

/// Check if a path has a recognised media file extension.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use spacesaver_common::paths::is_media_file;
///
/// assert!(is_media_file(Path::new("movie.mkv")));
/// assert!(!is_media_file(Path::new("subtitle.srt")));
/// ```
pub fn is_media_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| MEDIA_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Get the list of recognised media file extensions.
#[must_use]
pub fn media_extensions() -> &'static [&'static str] {
    MEDIA_EXTENSIONS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_media_file() {
        assert!(is_media_file(Path::new("movie.mkv")));
        assert!(is_media_file(Path::new("movie.mp4")));
        assert!(is_media_file(Path::new("movie.avi")));
        assert!(is_media_file(Path::new("movie.mov")));
        assert!(is_media_file(Path::new("movie.m4v")));
        assert!(is_media_file(Path::new("movie.ts")));
        assert!(is_media_file(Path::new("movie.wmv")));

        assert!(is_media_file(Path::new("movie.MKV")));

        assert!(!is_media_file(Path::new("subtitle.srt")));
        assert!(!is_media_file(Path::new("image.jpg")));
        assert!(!is_media_file(Path::new("no_extension")));
        assert!(!is_media_file(Path::new("")));

        // webm is in the richer extension set of other media tools but is
        // not one of the seven extensions this scanner recognises.
        assert!(!is_media_file(Path::new("clip.webm")));
    }

    #[test]
    fn test_media_extensions() {
        let exts = media_extensions();
        assert_eq!(exts.len(), 7);
        assert!(exts.contains(&"mkv"));
    }
}
