use chardetng::EncodingDetector;
use encoding_rs::Encoding;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPage {
    pub html: String,
    pub encoding_label: &'static str,
    /// Some bytes were replaced with U+FFFD.
    pub lossy: bool,
}

/// Turns page bytes into text.
///
/// Encoding is picked from the byte order mark, then the `charset` parameter
/// of `content_type`, then by statistical detection over the whole body.
/// Malformed sequences are replaced rather than rejected.
pub fn decode_page(bytes: &[u8], content_type: Option<&str>) -> DecodedPage {
    let encoding = Encoding::for_bom(bytes)
        .map(|(encoding, _)| encoding)
        .or_else(|| {
            content_type
                .and_then(charset_param)
                .and_then(|label| Encoding::for_label(label.as_bytes()))
        })
        .unwrap_or_else(|| detect(bytes));

    let (text, used, had_errors) = encoding.decode(bytes);
    DecodedPage {
        html: text.into_owned(),
        encoding_label: used.name(),
        lossy: had_errors,
    }
}

fn charset_param(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(['"', '\'']).to_string())
    })
}

fn detect(bytes: &[u8]) -> &'static Encoding {
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    detector.guess(None, true)
}
