use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory {path:?} is unusable: {reason}")]
    OutputDir { path: PathBuf, reason: String },
    #[error("could not write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Ensure output directory exists, creating parents as needed.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    let unusable = |reason: String| PersistError::OutputDir {
        path: dir.to_path_buf(),
        reason,
    };
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| unusable(e.to_string()))?;
        if !meta.is_dir() {
            return Err(unusable("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| unusable(e.to_string()))?;
    }
    Ok(())
}

/// Writes whole files into one directory via a temp file and a rename, so a
/// reader never sees half an image.
#[derive(Debug, Clone)]
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `content` to `{dir}/{filename}`, replacing any existing file.
    pub fn write(&self, filename: &str, content: &[u8]) -> Result<PathBuf, PersistError> {
        let target = self.dir.join(filename);
        let failed = |source: io::Error| PersistError::Write {
            path: target.clone(),
            source,
        };

        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(failed)?;
        tmp.write_all(content).map_err(failed)?;
        tmp.flush().map_err(failed)?;
        tmp.as_file_mut().sync_all().map_err(failed)?;

        // `persist` does not replace on every platform.
        if target.exists() {
            fs::remove_file(&target).map_err(failed)?;
        }
        tmp.persist(&target).map_err(|e| failed(e.error))?;
        Ok(target)
    }
}

/// Regular files in `dir` whose name ends in `suffix` (e.g. `.svg`), sorted.
pub fn files_with_suffix(dir: &Path, suffix: &str) -> io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| suffix.strip_prefix('.') == Some(ext));
        if matches && entry.file_type()?.is_file() {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}

/// File name of `path` without its extension; empty when there is none.
pub(crate) fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}
