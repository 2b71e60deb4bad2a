//! Resolves photo URLs to decoded rasters.

use std::path::{Component, Path, PathBuf};

use image::RgbaImage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("photo url has no path: {url}")]
    EmptyPath { url: String },
    #[error("failed to load {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

pub type SourceResult<T> = std::result::Result<T, SourceError>;

/// Collaborator that turns a photo URL into pixels.
pub trait ImageSource {
    fn load(&self, url: &str) -> SourceResult<RgbaImage>;
}

/// Serves photos from a local directory. The path component of a URL is looked up
/// under `root`; plain filesystem paths are used as given.
#[derive(Debug, Clone)]
pub struct FileImageSource {
    root: PathBuf,
}

impl FileImageSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, url: &str) -> SourceResult<PathBuf> {
        let Some(path) = url_path(url) else {
            let direct = Path::new(url);
            if direct.is_absolute() {
                return Ok(direct.to_path_buf());
            }
            return Ok(self.root.join(safe_relative(direct)));
        };

        let relative = safe_relative(Path::new(path.trim_start_matches('/')));
        if relative.as_os_str().is_empty() {
            return Err(SourceError::EmptyPath {
                url: url.to_string(),
            });
        }
        Ok(self.root.join(relative))
    }
}

impl ImageSource for FileImageSource {
    fn load(&self, url: &str) -> SourceResult<RgbaImage> {
        let path = self.resolve(url)?;
        let image = image::open(&path).map_err(|source| SourceError::Decode {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(
            path = %path.display(),
            width = image.width(),
            height = image.height(),
            "photo loaded"
        );
        Ok(image.into_rgba8())
    }
}

/// Path part of an `http(s)://host/path?query` URL; `None` for anything else.
fn url_path(url: &str) -> Option<&str> {
    let rest = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"))?;
    let path = rest.find('/').map_or("", |index| &rest[index..]);
    Some(path.split(['?', '#']).next().unwrap_or_default())
}

/// Drops root, prefix and `..` components so a URL cannot escape the served root.
fn safe_relative(path: &Path) -> PathBuf {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect()
}
