//! Grabber engine: page fetching, image resolution, downloads and thumbnailing.
mod decode;
mod download;
mod fetch;
mod links;
mod persist;
mod pipeline;
mod raster;
mod resolve;
mod thumbnail;
mod types;

pub use decode::{decode_page, DecodedPage};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher};
pub use links::{collect_image_candidates, PageLinks, SelectorError};
pub use persist::{ensure_output_dir, files_with_suffix, AtomicFileWriter, PersistError};
pub use pipeline::{run_blocking, BlockReason, NullSink, Pipeline, PipelineError, ProgressSink};
pub use raster::{rasterize_svgs, remove_svgs, render_svg};
pub use thumbnail::make_thumbnail;
pub use types::{FailureKind, FetchError, FetchMetadata, FetchOutput, PipelineEvent, Stage};
