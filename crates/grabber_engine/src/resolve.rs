use grabber_core::{
    extension_for_content_type, file_stem_from_url, resolve_image_url, sanitize_name,
    whitelisted_extension, Fallback, ImageCandidate, NamingMode, ResolvedImage, FALLBACK_NAME,
};
use grabber_logging::grab_debug;
use url::Url;

use crate::pipeline::FallbackLog;
use crate::{BlockReason, Fetcher, PipelineError};

/// Turns selector matches into downloadable images.
pub(crate) struct ImageResolver<'a> {
    fetcher: &'a dyn Fetcher,
    base_url: &'a Url,
    naming: NamingMode,
}

impl<'a> ImageResolver<'a> {
    pub(crate) fn new(fetcher: &'a dyn Fetcher, base_url: &'a Url, naming: NamingMode) -> Self {
        Self {
            fetcher,
            base_url,
            naming,
        }
    }

    pub(crate) async fn resolve(
        &self,
        index: usize,
        candidate: &ImageCandidate,
        fallbacks: &mut FallbackLog<'_>,
    ) -> Result<ResolvedImage, PipelineError> {
        // Sites that hide `src` from scrapers get the same treatment as a 403.
        let src = candidate
            .src
            .as_deref()
            .ok_or(PipelineError::SourceBlocked(BlockReason::MissingSource { index }))?;

        let url = resolve_image_url(src, self.base_url).map_err(|err| {
            PipelineError::InvalidImageUrl {
                src: src.to_string(),
                message: err.to_string(),
            }
        })?;

        let raw_name = match (self.naming, candidate.alt.as_deref()) {
            (NamingMode::AltText, Some(alt)) => alt.to_string(),
            (NamingMode::AltText, None) => {
                fallbacks.record(Fallback::MissingAlt {
                    image_url: url.to_string(),
                });
                file_stem_from_url(&url)
            }
            (NamingMode::OriginalFilename, _) => file_stem_from_url(&url),
        };

        let extension = self.extension_for(&url).await?;

        let mut base_name = sanitize_name(&raw_name);
        if base_name.is_empty() {
            fallbacks.record(Fallback::EmptyName {
                image_url: url.to_string(),
            });
            base_name = FALLBACK_NAME.to_string();
        }

        grab_debug!("resolved image #{} {} -> {}{}", index, url, base_name, extension);
        Ok(ResolvedImage {
            url,
            extension,
            base_name,
        })
    }

    /// Extension from the URL when whitelisted, otherwise from a content-type probe.
    async fn extension_for(&self, url: &Url) -> Result<String, PipelineError> {
        if let Some(ext) = whitelisted_extension(url) {
            return Ok(ext.to_string());
        }

        let content_type = self
            .fetcher
            .probe_content_type(url)
            .await
            .map_err(|source| PipelineError::Probe {
                url: url.to_string(),
                source,
            })?;

        content_type
            .as_deref()
            .and_then(extension_for_content_type)
            .map(str::to_string)
            .ok_or_else(|| PipelineError::UnknownContentType {
                url: url.to_string(),
                content_type,
            })
    }
}
