use std::fmt;
use std::io;
use std::path::PathBuf;

use grabber_core::{is_raster_path, Fallback, RunConfig, RunReport};
use grabber_logging::{grab_debug, grab_info, grab_warn};
use thiserror::Error;

use crate::decode::decode_page;
use crate::download::download_image;
use crate::links::{collect_image_candidates, SelectorError};
use crate::raster::{rasterize_svgs, remove_svgs};
use crate::resolve::ImageResolver;
use crate::thumbnail::make_thumbnail;
use crate::{
    AtomicFileWriter, FetchError, FetchSettings, Fetcher, PersistError, PipelineEvent,
    ReqwestFetcher, Stage,
};

/// Why a run decided the site is refusing automated downloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockReason {
    /// The `index`-th matched element has no `src` attribute.
    MissingSource { index: usize },
    /// The image request came back with an error status.
    HttpStatus { url: String, status: u16 },
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockReason::MissingSource { index } => {
                write!(f, "matched element #{} has no src attribute", index + 1)
            }
            BlockReason::HttpStatus { url, status } => write!(f, "{url} answered {status}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no images matched the selector")]
    NoImagesFound,
    #[error("source is blocking downloads: {0}")]
    SourceBlocked(BlockReason),
    #[error(transparent)]
    InvalidSelector(#[from] SelectorError),
    #[error("could not fetch page {url}: {source}")]
    PageFetch {
        url: String,
        #[source]
        source: FetchError,
    },
    #[error("image source {src:?} is not a valid URL: {message}")]
    InvalidImageUrl { src: String, message: String },
    #[error("could not probe content type of {url}: {source}")]
    Probe {
        url: String,
        #[source]
        source: FetchError,
    },
    #[error("cannot pick a file extension for {url} (content type {content_type:?})")]
    UnknownContentType {
        url: String,
        content_type: Option<String>,
    },
    #[error("could not download {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: FetchError,
    },
    #[error("could not rasterize {path:?}: {message}")]
    Svg { path: PathBuf, message: String },
    #[error("could not process image {path:?}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("image {path:?} has no pixels")]
    EmptyImage { path: PathBuf },
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl PipelineError {
    /// Failures the user can act on, as opposed to bugs or broken environments.
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            PipelineError::NoImagesFound | PipelineError::SourceBlocked(_)
        )
    }
}

/// Receives progress of a run.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: PipelineEvent);
}

/// Sink that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&self, _event: PipelineEvent) {}
}

/// Fallbacks taken during a run: reported as they happen, kept for the summary.
pub(crate) struct FallbackLog<'a> {
    sink: &'a dyn ProgressSink,
    taken: Vec<Fallback>,
}

impl<'a> FallbackLog<'a> {
    fn new(sink: &'a dyn ProgressSink) -> Self {
        Self {
            sink,
            taken: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, fallback: Fallback) {
        grab_warn!("{}", fallback);
        self.sink.emit(PipelineEvent::Fallback(fallback.clone()));
        self.taken.push(fallback);
    }

    fn into_inner(self) -> Vec<Fallback> {
        self.taken
    }
}

/// One scrape-download-thumbnail run over a single page.
pub struct Pipeline<'a> {
    fetcher: &'a dyn Fetcher,
    sink: &'a dyn ProgressSink,
}

impl<'a> Pipeline<'a> {
    pub fn new(fetcher: &'a dyn Fetcher, sink: &'a dyn ProgressSink) -> Self {
        Self { fetcher, sink }
    }

    /// Runs every stage in order. The output directory must already exist.
    pub async fn run(&self, config: &RunConfig) -> Result<RunReport, PipelineError> {
        let mut fallbacks = FallbackLog::new(self.sink);
        let writer = AtomicFileWriter::new(config.output_dir.clone());

        self.sink.emit(PipelineEvent::Stage(Stage::CollectingLinks));
        let page = self
            .fetcher
            .fetch_page(&config.source_url)
            .await
            .map_err(|source| PipelineError::PageFetch {
                url: config.source_url.to_string(),
                source,
            })?;
        let decoded = decode_page(&page.bytes, page.metadata.content_type.as_deref());
        grab_debug!(
            "page {} decoded as {} (lossy: {})",
            page.metadata.final_url,
            decoded.encoding_label,
            decoded.lossy
        );

        let links = collect_image_candidates(&decoded.html, &config.source_url, &config.css_selector)?;
        if links.base_fell_back {
            fallbacks.record(Fallback::MissingBase {
                page_url: config.source_url.to_string(),
            });
        }
        grab_info!(
            "{} element(s) matched {:?}, base {}",
            links.candidates.len(),
            config.css_selector,
            links.base_url
        );
        if links.candidates.is_empty() {
            return Err(PipelineError::NoImagesFound);
        }

        self.sink.emit(PipelineEvent::Stage(Stage::Downloading));
        let resolver = ImageResolver::new(self.fetcher, &links.base_url, config.naming);
        let mut downloaded: Vec<PathBuf> = Vec::with_capacity(links.candidates.len());
        for (index, candidate) in links.candidates.iter().enumerate() {
            let image = resolver.resolve(index, candidate, &mut fallbacks).await?;
            downloaded.push(config.output_dir.join(image.file_name()));
            let path = download_image(self.fetcher, &writer, &image).await?;
            self.sink.emit(PipelineEvent::Saved { path });
        }

        self.sink.emit(PipelineEvent::Stage(Stage::Resizing));
        let rasterized = rasterize_svgs(&writer)?;
        let rasterized_svgs = rasterized.len();
        downloaded.extend(rasterized);

        let mut thumbnails = Vec::new();
        for path in &downloaded {
            if !path.is_file() || !is_raster_path(path) {
                grab_debug!("skipping {:?}", path);
                continue;
            }
            let saved = make_thumbnail(path, config.max_side, &writer)?;
            self.sink.emit(PipelineEvent::Saved {
                path: saved.clone(),
            });
            thumbnails.push(saved);
        }
        let removed = remove_svgs(&config.output_dir)?;
        grab_debug!("removed {} svg file(s)", removed);

        self.sink.emit(PipelineEvent::Stage(Stage::Finished));
        Ok(RunReport {
            thumbnails,
            rasterized_svgs,
            fallbacks: fallbacks.into_inner(),
        })
    }
}

/// Runs the pipeline with a reqwest fetcher on a current-thread runtime.
///
/// Blocks until the run finishes.
pub fn run_blocking(
    config: &RunConfig,
    settings: FetchSettings,
    sink: &dyn ProgressSink,
) -> Result<RunReport, PipelineError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let fetcher = ReqwestFetcher::new(settings);
    runtime.block_on(Pipeline::new(&fetcher, sink).run(config))
}
