use std::path::Path;

use url::Url;

use crate::name::{last_segment, split_extension};

/// Raster suffixes taken straight from an image URL and accepted by the resizer.
pub const RASTER_EXTENSIONS: [&str; 8] = [
    ".jpg", ".jpeg", ".jpe", ".gif", ".png", ".tga", ".tiff", ".webp",
];

/// Suffixes only reached through the MIME table that still decode.
const CONTENT_TYPE_RASTER_EXTENSIONS: [&str; 2] = [".bmp", ".ico"];

/// Extension of the URL path when it is one of [`RASTER_EXTENSIONS`].
///
/// Matching is case-sensitive; `.JPG` needs a content-type probe.
pub fn whitelisted_extension(url: &Url) -> Option<&'static str> {
    let (_, ext) = split_extension(last_segment(url.path()));
    RASTER_EXTENSIONS.iter().copied().find(|known| *known == ext)
}

/// Maps a `Content-Type` header value to a file extension.
///
/// Every extension returned is either `.svg` or accepted by [`is_raster_path`].
pub fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_ascii_lowercase();
    let ext = match essence.as_str() {
        "image/jpeg" | "image/pjpeg" => ".jpg",
        "image/png" => ".png",
        "image/gif" => ".gif",
        "image/svg+xml" => ".svg",
        "image/webp" => ".webp",
        "image/tiff" => ".tiff",
        "image/bmp" | "image/x-ms-bmp" => ".bmp",
        "image/x-icon" | "image/vnd.microsoft.icon" => ".ico",
        "image/x-tga" | "image/x-targa" => ".tga",
        _ => return None,
    };
    Some(ext)
}

/// True when `path` carries one of the raster suffixes the resizer handles.
pub fn is_raster_path(path: &Path) -> bool {
    dotted_extension(path).is_some_and(|ext| {
        RASTER_EXTENSIONS
            .iter()
            .chain(CONTENT_TYPE_RASTER_EXTENSIONS.iter())
            .any(|known| *known == ext)
    })
}

fn dotted_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
}
