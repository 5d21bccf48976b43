use std::path::PathBuf;

use grabber_core::ResolvedImage;
use grabber_logging::grab_info;

use crate::{AtomicFileWriter, BlockReason, Fetcher, PipelineError};

/// Fetches `image` and stores it as `{base_name}{extension}` in the writer's directory.
///
/// Any HTTP error status is read as the site refusing scrapers.
pub(crate) async fn download_image(
    fetcher: &dyn Fetcher,
    writer: &AtomicFileWriter,
    image: &ResolvedImage,
) -> Result<PathBuf, PipelineError> {
    let output = fetcher
        .fetch_image(&image.url)
        .await
        .map_err(|err| match err.http_status() {
            Some(status) => PipelineError::SourceBlocked(BlockReason::HttpStatus {
                url: image.url.to_string(),
                status,
            }),
            None => PipelineError::Download {
                url: image.url.to_string(),
                source: err,
            },
        })?;

    let path = writer.write(&image.file_name(), &output.bytes)?;
    grab_info!(
        "saved {} ({} bytes) to {:?}",
        output.metadata.final_url,
        output.metadata.byte_len,
        path
    );
    Ok(path)
}
