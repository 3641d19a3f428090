//! Attachment filename and content-type derivation from URLs.

use url::Url;

/// Returns the last non-empty path segment of `url`, or its host when the
/// path is empty.
///
/// The segment is returned as it appears in the URL (not percent-decoded),
/// matching the inline attachment references already present in bodies.
#[must_use]
pub fn filename_from_url(url: &Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.filter(|segment| !segment.is_empty()).next_back())
        .map(str::to_string)
        .or_else(|| url.host_str().map(str::to_string))
        .unwrap_or_default()
}

/// Lowercased extension of `filename` including the dot, if it has one.
pub(crate) fn extension_from_filename(filename: &str) -> Option<String> {
    let dot_index = filename.rfind('.')?;
    let ext = &filename[dot_index..];
    if ext.len() <= 1 || ext.len() > 12 {
        return None;
    }
    Some(ext.to_lowercase())
}

/// Guesses a MIME type from the filename extension.
#[must_use]
pub fn content_type_for_filename(filename: &str) -> Option<&'static str> {
    let extension = extension_from_filename(filename)?;
    let mime = match extension.as_str() {
        ".pdf" => "application/pdf",
        ".doc" => "application/msword",
        ".docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        ".xls" => "application/vnd.ms-excel",
        ".xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        ".ppt" => "application/vnd.ms-powerpoint",
        ".pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        ".rtf" => "application/rtf",
        ".odt" => "application/vnd.oasis.opendocument.text",
        ".html" | ".htm" => "text/html",
        ".txt" => "text/plain",
        ".csv" => "text/csv",
        ".json" => "application/json",
        ".xml" => "application/xml",
        ".jpg" | ".jpeg" => "image/jpeg",
        ".png" => "image/png",
        ".gif" => "image/gif",
        ".svg" => "image/svg+xml",
        ".zip" => "application/zip",
        ".gz" => "application/gzip",
        ".mp4" => "video/mp4",
        ".mp3" => "audio/mpeg",
        _ => return None,
    };
    Some(mime)
}
