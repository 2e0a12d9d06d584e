/*!
 * Mime Inference
 * Static extension table and the bad-mime classifier
 */

use crate::core::limits::OCTET_STREAM;

/// Guess a mime type from a file name's extension
///
/// Matching is case-insensitive. Names without an extension, or ending
/// in a dot, yield `None`.
pub fn guess_from_name(name: &str) -> Option<&'static str> {
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    guess_from_extension(&ext.to_ascii_lowercase())
}

/// Look up a lowercase extension
pub fn guess_from_extension(ext: &str) -> Option<&'static str> {
    let mime = match ext {
        // Documents
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "odt" => "application/vnd.oasis.opendocument.text",
        "ods" => "application/vnd.oasis.opendocument.spreadsheet",
        "rtf" => "application/rtf",
        "epub" => "application/epub+zip",

        // Text
        "txt" | "log" | "ini" | "conf" => "text/plain",
        "csv" => "text/csv",
        "htm" | "html" => "text/html",
        "xml" => "text/xml",
        "md" => "text/markdown",
        "json" => "application/json",

        // Images
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "heic" => "image/heic",
        "heif" => "image/heif",
        "ico" => "image/x-icon",

        // Audio
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "aac" => "audio/aac",
        "ogg" | "oga" => "audio/ogg",
        "opus" => "audio/opus",
        "wav" => "audio/x-wav",
        "flac" => "audio/flac",
        "amr" => "audio/amr",

        // Video
        "mp4" | "m4v" => "video/mp4",
        "mkv" => "video/x-matroska",
        "webm" => "video/webm",
        "avi" => "video/x-msvideo",
        "mov" => "video/quicktime",
        "3gp" => "video/3gpp",
        "ts" => "video/mp2ts",

        // Archives and packages
        "zip" => "application/zip",
        "rar" => "application/x-rar-compressed",
        "7z" => "application/x-7z-compressed",
        "gz" => "application/gzip",
        "tar" => "application/x-tar",
        "apk" => "application/vnd.android.package-archive",

        _ => return None,
    };
    Some(mime)
}

/// Whether a declared type is too generic (or too often wrong) to route on
///
/// Bad: missing, empty, `*/*`, `application/octet-stream`, and anything
/// under `text/`.
pub fn is_bad_mime(mime: Option<&str>) -> bool {
    match mime {
        None => true,
        Some(t) => t.is_empty() || t == "*/*" || t == OCTET_STREAM || t.starts_with("text/"),
    }
}
