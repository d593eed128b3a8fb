//! Collaborator interfaces: document codec, persistence and page images.
//!
//! The engine never touches files itself. An [`Annotator`](crate::Annotator)
//! is handed one implementation of each trait; the file-system adapters here
//! are the reference implementations used by the command-line shell and the
//! tests.

use std::fs;
use std::path::{Path, PathBuf};

use layoutkit_core::{IoFailure, ParseError, Result};

use crate::model::Document;

/// Turns serialized documents into realized trees and back.
pub trait DocumentCodec {
    /// Parses `input` into a document. Never yields a partial tree.
    fn parse(&self, input: &str) -> std::result::Result<Document, ParseError>;

    /// Serializes `document`, dropping derived-shape tags.
    fn serialize(&self, document: &Document) -> Result<String>;
}

/// Reads and writes serialized documents.
pub trait Persistence {
    fn load(&self, path: &Path) -> std::result::Result<String, IoFailure>;

    fn save(&self, path: &Path, contents: &str) -> std::result::Result<(), IoFailure>;
}

/// Persistence on the local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsPersistence;

impl Persistence for FsPersistence {
    fn load(&self, path: &Path) -> std::result::Result<String, IoFailure> {
        fs::read_to_string(path).map_err(|e| IoFailure::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    fn save(&self, path: &Path, contents: &str) -> std::result::Result<(), IoFailure> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| IoFailure::Write {
                path: dir.display().to_string(),
                reason: e.to_string(),
            })?;
        }
        fs::write(path, contents).map_err(|e| IoFailure::Write {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        tracing::debug!("Wrote {} bytes to {}", contents.len(), path.display());
        Ok(())
    }
}

/// Pixel dimensions of a resolved page image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
}

/// Resolves a page's image reference to its dimensions.
pub trait ImageProvider {
    /// `frame` selects a page inside multi-frame sources.
    fn resolve(&self, source: &str, frame: usize) -> std::result::Result<ImageInfo, IoFailure>;
}

/// Reads image headers from disk, relative to `base_dir`.
///
/// Only single-frame sources are supported; asking for a later frame is an
/// [`IoFailure::Image`].
#[derive(Debug, Clone, Default)]
pub struct FileImageProvider {
    base_dir: PathBuf,
}

impl FileImageProvider {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

impl ImageProvider for FileImageProvider {
    fn resolve(&self, source: &str, frame: usize) -> std::result::Result<ImageInfo, IoFailure> {
        let path = self.base_dir.join(source);
        if frame > 0 {
            return Err(IoFailure::Image {
                path: path.display().to_string(),
                frame,
                reason: "multi-frame sources are not supported".to_string(),
            });
        }
        let (width, height) = image::image_dimensions(&path).map_err(|e| IoFailure::Image {
            path: path.display().to_string(),
            frame,
            reason: e.to_string(),
        })?;
        Ok(ImageInfo { width, height })
    }
}

/// A page whose declared size disagrees with its image.
#[derive(Debug, Clone, PartialEq)]
pub struct SizeMismatch {
    pub page: String,
    pub declared: (f64, f64),
    pub actual: ImageInfo,
}

impl SizeMismatch {
    /// Checks `declared` against `actual`, allowing half a pixel of rounding.
    pub fn check(page: &str, declared: (f64, f64), actual: ImageInfo) -> Option<Self> {
        let same = (declared.0 - f64::from(actual.width)).abs() <= 0.5
            && (declared.1 - f64::from(actual.height)).abs() <= 0.5;
        (!same).then(|| Self {
            page: page.to_string(),
            declared,
            actual,
        })
    }
}

/// Decides whether a size mismatch is worth a warning.
pub type SizeMismatchPolicy = Box<dyn FnMut(&SizeMismatch) -> bool>;

/// The default policy: always warn.
pub fn warn_always() -> SizeMismatchPolicy {
    Box::new(|_| true)
}
