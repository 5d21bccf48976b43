//! Grabber core: run configuration and the pure naming, format and geometry rules.
mod config;
mod format;
mod geometry;
mod image;
mod name;
mod resolve;

pub use config::{NamingMode, ParseNamingModeError, RunConfig, DEFAULT_MAX_SIDE};
pub use format::{
    extension_for_content_type, is_raster_path, whitelisted_extension,
    RASTER_EXTENSIONS,
};
pub use geometry::ThumbnailGeometry;
pub use image::{Fallback, ImageCandidate, ResolvedImage, RunReport};
pub use name::{file_stem_from_url, sanitize_name, split_extension, FALLBACK_NAME};
pub use resolve::{is_absolute, resolve_base_url, resolve_image_url};
