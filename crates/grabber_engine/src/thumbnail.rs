use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use grabber_core::ThumbnailGeometry;
use grabber_logging::grab_debug;
use image::imageops::{self, FilterType};
use image::{ImageFormat, ImageReader, Rgba, RgbaImage};

use crate::persist::file_stem;
use crate::{AtomicFileWriter, PipelineError};

const TRANSPARENT: Rgba<u8> = Rgba([255, 255, 255, 0]);

/// Shrinks the raster at `path` onto a transparent square and saves it as
/// `{stem}.png` next to the writer's other files.
///
/// A non-PNG source is deleted once its PNG exists.
pub fn make_thumbnail(
    path: &Path,
    max_side: u32,
    writer: &AtomicFileWriter,
) -> Result<PathBuf, PipelineError> {
    let image_error = |source: image::ImageError| PipelineError::Image {
        path: path.to_path_buf(),
        source,
    };

    let source = ImageReader::open(path)
        .map_err(|err| image_error(err.into()))?
        .with_guessed_format()
        .map_err(|err| image_error(err.into()))?
        .decode()
        .map_err(image_error)?;

    let (width, height) = (source.width(), source.height());
    let geometry = ThumbnailGeometry::fit(width, height, max_side).ok_or_else(|| {
        PipelineError::EmptyImage {
            path: path.to_path_buf(),
        }
    })?;
    grab_debug!("{:?}: {}x{} -> {:?}", path, width, height, geometry);

    let shrunk = if geometry.is_identity(width, height) {
        source.to_rgba8()
    } else {
        source
            .resize_exact(geometry.width, geometry.height, FilterType::Lanczos3)
            .to_rgba8()
    };

    let mut canvas = RgbaImage::from_pixel(geometry.side, geometry.side, TRANSPARENT);
    imageops::replace(
        &mut canvas,
        &shrunk,
        i64::from(geometry.offset_x),
        i64::from(geometry.offset_y),
    );

    let mut png = Vec::new();
    canvas
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(image_error)?;

    let saved = writer.write(&format!("{}.png", file_stem(path)), &png)?;

    if path.extension().and_then(|ext| ext.to_str()) != Some("png") {
        fs::remove_file(path)?;
    }
    Ok(saved)
}
