use grabber_core::{resolve_base_url, ImageCandidate};
use scraper::{Html, Selector};
use url::Url;

/// What the pipeline needs from the fetched page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLinks {
    /// URL relative image links resolve against.
    pub base_url: Url,
    /// `true` when the page had no usable `<base href>`.
    pub base_fell_back: bool,
    /// Elements matched by the user's selector, in document order.
    pub candidates: Vec<ImageCandidate>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid CSS selector {selector:?}: {message}")]
pub struct SelectorError {
    pub selector: String,
    pub message: String,
}

/// Parses `html` once and pulls out the base URL and the selected elements.
///
/// The parsed document is dropped before returning so callers can hold the
/// result across `.await` points.
pub fn collect_image_candidates(
    html: &str,
    page_url: &Url,
    css_selector: &str,
) -> Result<PageLinks, SelectorError> {
    let selector = Selector::parse(css_selector).map_err(|err| SelectorError {
        selector: css_selector.to_string(),
        message: err.to_string(),
    })?;

    let document = Html::parse_document(html);
    let (base_url, base_fell_back) = resolve_base_url(base_href(&document), page_url);

    let candidates = document
        .select(&selector)
        .map(|element| {
            let attrs = element.value();
            ImageCandidate::new(attrs.attr("src"), attrs.attr("alt"))
        })
        .collect();

    Ok(PageLinks {
        base_url,
        base_fell_back,
        candidates,
    })
}

fn base_href(document: &Html) -> Option<&str> {
    let base_sel = Selector::parse("base").ok()?;
    document
        .select(&base_sel)
        .next()
        .and_then(|element| element.value().attr("href"))
}
