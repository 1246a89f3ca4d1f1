//! MIME type detection module
//!
//! Maps a file extension to its media type and, where one is registered,
//! the charset that should be advertised alongside it.

use std::path::Path;

/// Fallback type for unknown or missing extensions
pub const OCTET_STREAM: &str = "application/octet-stream";

const UTF_8: &str = "UTF-8";

/// Look up the media type for an extension (case-insensitive, no leading dot)
///
/// # Examples
/// ```
/// use buildserve::http::mime::lookup;
/// assert_eq!(lookup(Some("html")), ("text/html", Some("UTF-8")));
/// assert_eq!(lookup(Some("mp4")), ("video/mp4", None));
/// assert_eq!(lookup(None), ("application/octet-stream", None));
/// ```
pub fn lookup(extension: Option<&str>) -> (&'static str, Option<&'static str>) {
    let media_type = extension.map_or(OCTET_STREAM, |ext| media_type(&ext.to_ascii_lowercase()));
    (media_type, charset_for(media_type))
}

/// Charset registered for a media type, if any
pub fn charset_for(media_type: &str) -> Option<&'static str> {
    if media_type.starts_with("text/")
        || media_type == "application/javascript"
        || media_type == "application/json"
    {
        Some(UTF_8)
    } else {
        None
    }
}

/// Full `Content-Type` header value for a file path
pub fn content_type(path: &Path) -> String {
    let (media_type, charset) = lookup(path.extension().and_then(|e| e.to_str()));
    match charset {
        Some(charset) => format!("{media_type}; charset={charset}"),
        None => media_type.to_string(),
    }
}

fn media_type(extension: &str) -> &'static str {
    match extension {
        // Text
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "txt" | "text" => "text/plain",
        "md" | "markdown" => "text/markdown",
        "csv" => "text/csv",
        "tsv" => "text/tab-separated-values",
        "ics" => "text/calendar",
        "vtt" => "text/vtt",
        "xml" => "application/xml",
        "xhtml" | "xht" => "application/xhtml+xml",
        "rss" => "application/rss+xml",
        "atom" => "application/atom+xml",

        // Scripts and data
        "js" | "mjs" => "application/javascript",
        "json" | "map" => "application/json",
        "jsonld" => "application/ld+json",
        "webmanifest" => "application/manifest+json",
        "wasm" => "application/wasm",

        // Images
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "apng" => "image/apng",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",

        // Video
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "ogv" => "video/ogg",
        "mov" => "video/quicktime",
        "m4v" => "video/x-m4v",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "ts" => "video/mp2t",
        "m3u8" => "application/vnd.apple.mpegurl",

        // Audio
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" | "oga" => "audio/ogg",
        "m4a" => "audio/mp4",
        "flac" => "audio/flac",
        "aac" => "audio/aac",
        "opus" => "audio/opus",
        "weba" => "audio/webm",
        "mid" | "midi" => "audio/midi",

        // Fonts
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "eot" => "application/vnd.ms-fontobject",

        // Archives and documents
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" => "application/gzip",
        "tar" => "application/x-tar",
        "bz2" => "application/x-bzip2",
        "7z" => "application/x-7z-compressed",
        "epub" => "application/epub+zip",

        _ => OCTET_STREAM,
    }
}
