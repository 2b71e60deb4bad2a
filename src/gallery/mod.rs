//! Photo listing and the full-screen preview carousel.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub const DEFAULT_UPLOADS_PREFIX: &str = "/uploads";
const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "webp", "gif", "bmp"];

#[derive(Debug, Error)]
pub enum GalleryError {
    #[error("failed to read gallery listing {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("gallery manifest {path} is not a list of urls: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type GalleryResult<T> = std::result::Result<T, GalleryError>;

/// Ordered photo URLs, from a remote listing or a static manifest alike.
pub trait GalleryListing {
    fn list(&self) -> GalleryResult<Vec<String>>;
}

/// A JSON array of URL strings on disk.
#[derive(Debug, Clone)]
pub struct ManifestGallery {
    path: PathBuf,
}

impl ManifestGallery {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl GalleryListing for ManifestGallery {
    fn list(&self) -> GalleryResult<Vec<String>> {
        let contents = fs::read_to_string(&self.path).map_err(|source| GalleryError::Read {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| GalleryError::Parse {
            path: self.path.clone(),
            source,
        })
    }
}

/// Image files in an uploads directory, sorted by name and exposed as
/// `<url_prefix>/<file name>`.
#[derive(Debug, Clone)]
pub struct DirectoryGallery {
    dir: PathBuf,
    url_prefix: String,
}

impl DirectoryGallery {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            url_prefix: DEFAULT_UPLOADS_PREFIX.to_string(),
        }
    }

    pub fn with_url_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.url_prefix = prefix.into().trim_end_matches('/').to_string();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl GalleryListing for DirectoryGallery {
    fn list(&self) -> GalleryResult<Vec<String>> {
        let read_error = |source| GalleryError::Read {
            path: self.dir.clone(),
            source,
        };
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(read_error)? {
            let path = entry.map_err(read_error)?.path();
            if !path.is_file() || !is_image_file(&path) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                names.push(name.to_string());
            }
        }
        names.sort();

        Ok(names
            .into_iter()
            .map(|name| format!("{}/{name}", self.url_prefix))
            .collect())
    }
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(extension))
        })
}

/// Absolute URLs pass through; anything else is served by the backend.
pub fn normalize_photo_url(backend_base: &str, entry: &str) -> String {
    if entry.starts_with("http") {
        entry.to_string()
    } else {
        format!("{}{entry}", backend_base.trim_end_matches('/'))
    }
}

/// Photo grid plus the photo currently open in the preview overlay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GalleryBrowser {
    photos: Vec<String>,
    preview: Option<String>,
}

impl GalleryBrowser {
    pub fn new(photos: Vec<String>) -> Self {
        Self {
            photos,
            preview: None,
        }
    }

    /// Lists through `listing` and normalizes every entry against `backend_base`.
    /// A failed listing leaves the gallery empty.
    pub fn load(listing: &dyn GalleryListing, backend_base: &str) -> Self {
        let photos = match listing.list() {
            Ok(entries) => entries
                .iter()
                .map(|entry| normalize_photo_url(backend_base, entry))
                .collect(),
            Err(err) => {
                tracing::warn!(%err, "failed to load gallery listing");
                Vec::new()
            }
        };
        tracing::debug!(photos = photos.len(), "gallery loaded");
        Self::new(photos)
    }

    pub fn photos(&self) -> &[String] {
        &self.photos
    }

    pub fn preview(&self) -> Option<&str> {
        self.preview.as_deref()
    }

    pub fn open_preview(&mut self, photo: impl Into<String>) {
        self.preview = Some(photo.into());
    }

    pub fn close_preview(&mut self) {
        self.preview = None;
    }

    /// Position of the previewed photo, `None` when nothing (or an unknown photo)
    /// is open.
    pub fn current_index(&self) -> Option<usize> {
        let preview = self.preview.as_deref()?;
        self.photos.iter().position(|photo| photo == preview)
    }

    pub fn next_photo(&mut self) -> Option<&str> {
        let index = self.current_index()?;
        let next = self.photos.get(index + 1)?.clone();
        self.preview = Some(next);
        self.preview()
    }

    pub fn prev_photo(&mut self) -> Option<&str> {
        let index = self.current_index()?.checked_sub(1)?;
        let previous = self.photos.get(index)?.clone();
        self.preview = Some(previous);
        self.preview()
    }
}
