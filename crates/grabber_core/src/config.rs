use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use url::Url;

/// Longest side, in pixels, a thumbnail may have.
pub const DEFAULT_MAX_SIDE: u32 = 500;

/// Where the saved file name comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NamingMode {
    /// The image element's `alt` attribute, falling back to the URL file name.
    #[default]
    AltText,
    /// The last path segment of the image URL without its extension.
    OriginalFilename,
}

impl NamingMode {
    /// Label shown to users, matching the choices of the original form.
    pub fn label(self) -> &'static str {
        match self {
            NamingMode::AltText => "Alt text",
            NamingMode::OriginalFilename => "Original filename",
        }
    }
}

impl fmt::Display for NamingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown naming mode {0:?} (expected \"Alt text\" or \"Original filename\")")]
pub struct ParseNamingModeError(pub String);

impl FromStr for NamingMode {
    type Err = ParseNamingModeError;

    /// Accepts the form labels (`Alt text`) as well as CLI spellings (`alt-text`, `filename`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .map(|c| match c {
                ' ' | '_' => '-',
                other => other.to_ascii_lowercase(),
            })
            .collect();
        match normalized.as_str() {
            "alt-text" | "alt" => Ok(NamingMode::AltText),
            "original-filename" | "filename" | "original" => Ok(NamingMode::OriginalFilename),
            _ => Err(ParseNamingModeError(s.to_string())),
        }
    }
}

/// Inputs for a single run. Immutable once the pipeline starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub output_dir: PathBuf,
    pub source_url: Url,
    pub css_selector: String,
    pub naming: NamingMode,
    pub max_side: u32,
}

impl RunConfig {
    pub fn new(
        output_dir: impl Into<PathBuf>,
        source_url: Url,
        css_selector: impl Into<String>,
        naming: NamingMode,
    ) -> Self {
        Self {
            output_dir: output_dir.into(),
            source_url,
            css_selector: css_selector.into(),
            naming,
            max_side: DEFAULT_MAX_SIDE,
        }
    }

    pub fn with_max_side(mut self, max_side: u32) -> Self {
        self.max_side = max_side;
        self
    }
}
