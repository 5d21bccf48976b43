use std::fs;
use std::path::{Path, PathBuf};

use grabber_logging::grab_info;
use resvg::{tiny_skia, usvg};

use crate::persist::{file_stem, files_with_suffix};
use crate::{AtomicFileWriter, PipelineError};

/// Renders every `.svg` in the writer's directory to a PNG of the same stem.
///
/// Works from the directory listing, not from what this run downloaded.
/// Returns the PNGs written, in file name order.
pub fn rasterize_svgs(writer: &AtomicFileWriter) -> Result<Vec<PathBuf>, PipelineError> {
    let svgs = files_with_suffix(writer.dir(), ".svg")?;
    let mut written = Vec::with_capacity(svgs.len());
    for svg in svgs {
        let png = render_svg(&svg)?;
        let target = format!("{}.png", file_stem(&svg));
        let path = writer.write(&target, &png)?;
        grab_info!("rasterized {:?} -> {:?}", svg, path);
        written.push(path);
    }
    Ok(written)
}

/// Deletes every `.svg` left in `dir`. Returns how many were removed.
pub fn remove_svgs(dir: &Path) -> Result<usize, PipelineError> {
    let svgs = files_with_suffix(dir, ".svg")?;
    for svg in &svgs {
        fs::remove_file(svg)?;
    }
    Ok(svgs.len())
}

/// PNG bytes for the SVG at `path`, drawn at its intrinsic size.
pub fn render_svg(path: &Path) -> Result<Vec<u8>, PipelineError> {
    let svg_error = |message: String| PipelineError::Svg {
        path: path.to_path_buf(),
        message,
    };

    let data = fs::read(path)?;
    let mut options = usvg::Options {
        resources_dir: path.parent().map(Path::to_path_buf),
        ..usvg::Options::default()
    };
    options.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_data(&data, &options).map_err(|err| svg_error(err.to_string()))?;
    let size = tree.size().to_int_size();
    let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| svg_error(format!("cannot draw a {}x{} canvas", size.width(), size.height())))?;
    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

    pixmap.encode_png().map_err(|err| svg_error(err.to_string()))
}
