//! Private image storage and the image collaborators used by the archive.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Error, Result};

const DEFAULT_EXTENSION: &str = "jpg";

/// Resolves an image reference to its bytes.
///
/// The filesystem implementation is [`FsImageSource`]; other embedders can
/// plug in their own content resolution.
pub trait ImageSource {
    fn read_image(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// Writes image bytes to a locally owned file and returns its path.
pub trait ImageSink {
    fn write_image(&self, stem: &str, ext: &str, bytes: &[u8]) -> io::Result<PathBuf>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FsImageSource;

impl ImageSource for FsImageSource {
    fn read_image(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }
}

/// The app's private image directory. Files here belong to exactly one record
/// and are deleted with it.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| Error::io_at("create image directory", &dir, e))?;
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// True only for files directly inside the image directory.
    #[must_use]
    pub fn owns(&self, path: &Path) -> bool {
        if path.parent() == Some(self.dir.as_path()) {
            return true;
        }
        match (path.canonicalize(), self.dir.canonicalize()) {
            (Ok(p), Ok(d)) => p.parent() == Some(d.as_path()),
            _ => false,
        }
    }

    /// First free path of the form `<stem>.<ext>`, `<stem>-1.<ext>`, ...
    #[must_use]
    pub fn allocate(&self, stem: &str, ext: &str) -> PathBuf {
        let stem = sanitize_stem(stem);
        let ext = sanitize_extension(ext);
        let mut candidate = self.dir.join(format!("{stem}.{ext}"));
        let mut n = 1;
        while candidate.exists() {
            candidate = self.dir.join(format!("{stem}-{n}.{ext}"));
            n += 1;
        }
        candidate
    }

    /// Copy an external image into private storage under the record's id.
    pub fn adopt(&self, id: &str, source_path: &Path, source: &dyn ImageSource) -> Result<PathBuf> {
        let bytes = source
            .read_image(source_path)
            .map_err(|e| Error::io_at("read image", source_path, e))?;
        let dest = self
            .write_image(id, &image_extension(source_path), &bytes)
            .map_err(|e| Error::io(format!("failed to store image for recipe {id}"), e))?;
        debug!(
            "copied image {} -> {}",
            source_path.display(),
            dest.display()
        );
        Ok(dest)
    }

    /// Delete an owned image. Paths outside private storage are never touched.
    /// Returns whether a file was removed.
    pub fn release(&self, path: &Path) -> Result<bool> {
        if !self.owns(path) {
            return Ok(false);
        }
        match fs::remove_file(path) {
            Ok(()) => {
                debug!("released image {}", path.display());
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!("owned image {} was already gone", path.display());
                Ok(false)
            }
            Err(e) => Err(Error::io_at("delete image", path, e)),
        }
    }
}

impl ImageSink for ImageStore {
    fn write_image(&self, stem: &str, ext: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        let dest = self.allocate(stem, ext);
        fs::write(&dest, bytes)?;
        Ok(dest)
    }
}

/// Lower-cased ASCII extension of `path`, or `jpg` when there is none.
#[must_use]
pub fn image_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or_else(|| DEFAULT_EXTENSION.to_string(), sanitize_extension)
}

fn sanitize_extension(ext: &str) -> String {
    let ext: String = ext
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if ext.is_empty() {
        DEFAULT_EXTENSION.to_string()
    } else {
        ext
    }
}

/// Keep a file stem to `[A-Za-z0-9_-]` so it can't escape the directory.
#[must_use]
pub fn sanitize_stem(stem: &str) -> String {
    let stem: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "image".to_string()
    } else {
        stem
    }
}
