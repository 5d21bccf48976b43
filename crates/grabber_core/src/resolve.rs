use url::Url;

/// True when `reference` names a host, i.e. it does not need a base URL.
///
/// Scheme-relative references (`//cdn.example.com/a.png`) count as absolute.
pub fn is_absolute(reference: &str) -> bool {
    let trimmed = reference.trim();
    if trimmed.starts_with("//") {
        return true;
    }
    Url::parse(trimmed).is_ok_and(|url| url.has_host())
}

/// Makes an image `src` absolute.
///
/// References with a host are kept as written (scheme-relative ones borrow
/// the base's scheme); everything else is joined onto `base`.
pub fn resolve_image_url(src: &str, base: &Url) -> Result<Url, url::ParseError> {
    let trimmed = src.trim();
    if is_absolute(trimmed) && !trimmed.starts_with("//") {
        return Url::parse(trimmed);
    }
    base.join(trimmed)
}

/// Picks the URL relative links resolve against.
///
/// Uses the `<base href>` value when present and parseable (resolving a
/// relative value against the page URL). The `bool` is `true` when the page
/// URL was used instead.
pub fn resolve_base_url(base_href: Option<&str>, page_url: &Url) -> (Url, bool) {
    base_href
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .and_then(|href| page_url.join(href).ok())
        .map(|base| (base, false))
        .unwrap_or_else(|| (page_url.clone(), true))
}
