use std::fmt;
use std::path::PathBuf;

/// An element matched by the user's selector. Only the attributes the
/// resolver reads are kept.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImageCandidate {
    pub src: Option<String>,
    pub alt: Option<String>,
}

impl ImageCandidate {
    pub fn new(src: Option<&str>, alt: Option<&str>) -> Self {
        Self {
            src: src.map(str::to_string),
            alt: alt.map(str::to_string),
        }
    }
}

/// A candidate with an absolute URL, an extension and a sanitized name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    pub url: url::Url,
    /// Includes the leading dot, e.g. `.jpg`.
    pub extension: String,
    pub base_name: String,
}

impl ResolvedImage {
    pub fn file_name(&self) -> String {
        format!("{}{}", self.base_name, self.extension)
    }
}

/// A non-fatal fallback taken during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fallback {
    /// The page has no usable `<base href>`; links resolve against the page URL.
    MissingBase { page_url: String },
    /// Alt-text naming was requested but the element has no `alt`.
    MissingAlt { image_url: String },
    /// Sanitizing removed every character of the chosen name.
    EmptyName { image_url: String },
}

impl fmt::Display for Fallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fallback::MissingBase { page_url } => {
                write!(f, "no <base> tag on {page_url}; resolved links against the page URL")
            }
            Fallback::MissingAlt { image_url } => {
                write!(f, "no alt text for {image_url}; used the original filename")
            }
            Fallback::EmptyName { image_url } => {
                write!(f, "name for {image_url} was empty after cleanup; saved as \"image\"")
            }
        }
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunReport {
    /// Every PNG thumbnail written, in processing order.
    pub thumbnails: Vec<PathBuf>,
    pub rasterized_svgs: usize,
    pub fallbacks: Vec<Fallback>,
}

impl RunReport {
    /// Fallbacks worth telling the user about. A missing `<base>` is routine.
    pub fn notable_fallbacks(&self) -> impl Iterator<Item = &Fallback> {
        self.fallbacks
            .iter()
            .filter(|fallback| !matches!(fallback, Fallback::MissingBase { .. }))
    }
}
