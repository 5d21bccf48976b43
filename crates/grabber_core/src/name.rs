use percent_encoding::percent_decode_str;
use url::Url;

/// Name used when sanitizing leaves nothing behind.
pub const FALLBACK_NAME: &str = "image";

/// Turns alt text or a URL file stem into a file-system friendly base name.
///
/// The steps run in a fixed order: lowercase, drop ASCII punctuation, drop
/// apostrophes, turn each double space into one underscore, then turn the
/// remaining spaces into underscores.
pub fn sanitize_name(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let stripped: String = lowered
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect();
    stripped
        .replace('\'', "")
        .replace("  ", "_")
        .replace(' ', "_")
}

/// Splits `segment` into stem and extension (with its dot).
///
/// Leading dots belong to the stem, so `.hidden` has no extension.
pub fn split_extension(segment: &str) -> (&str, &str) {
    let leading = segment.len() - segment.trim_start_matches('.').len();
    match segment[leading..].rfind('.') {
        Some(idx) => segment.split_at(leading + idx),
        None => (segment, ""),
    }
}

/// Last path segment of `url`, percent-decoded, with its extension removed.
///
/// Invalid UTF-8 after decoding is replaced rather than rejected.
pub fn file_stem_from_url(url: &Url) -> String {
    let segment = percent_decode_str(last_segment(url.path())).decode_utf8_lossy();
    split_extension(&segment).0.to_string()
}

pub(crate) fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
