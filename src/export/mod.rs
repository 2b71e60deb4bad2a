//! Flattening at native resolution, encoding and persistence of finished drawings.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, RgbaImage};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::editor::tools::Stroke;
use crate::render::{render_stroke, Surface};
use crate::viewport::ViewportGeometry;

pub const DEFAULT_EXPORT_QUALITY: u8 = 92;
const FILE_NAME_PREFIX: &str = "drawing";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("cannot allocate a {width}x{height} export surface")]
    Allocation { width: u32, height: u32 },
    #[error("failed to encode {format}: {source}")]
    Encode {
        format: ExportFormat,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type ExportResult<T> = std::result::Result<T, ExportError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported export format: {0:?}")]
pub struct ExportFormatParseError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg,
    Webp,
}

impl ExportFormat {
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Webp => "webp",
        }
    }

    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportFormatParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "webp" => Ok(Self::Webp),
            _ => Err(ExportFormatParseError(value.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime_type())
    }
}

/// An encoded drawing ready to be handed to a save or download mechanism.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub format: ExportFormat,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

/// Rasterizes the source photo and `strokes` (display-space) at export size.
pub fn flatten<'a>(
    background: Option<&RgbaImage>,
    strokes: impl IntoIterator<Item = &'a Stroke>,
    geometry: &ViewportGeometry,
) -> ExportResult<RgbaImage> {
    let size = geometry.export_size().at_least_one();
    let mut surface = Surface::new(size, 1.0).ok_or(ExportError::Allocation {
        width: size.width,
        height: size.height,
    })?;

    if let Some(image) = background {
        surface.draw_image(image);
    }

    let scale = geometry.export_scale();
    let mut count = 0usize;
    for stroke in strokes {
        render_stroke(&mut surface, stroke, scale);
        count += 1;
    }
    tracing::debug!(?size, scale, strokes = count, "flattened drawing");
    Ok(surface.to_rgba_image())
}

/// `quality` is a percentage and only applies to JPEG; WebP is written lossless.
pub fn encode(image: &RgbaImage, format: ExportFormat, quality: u8) -> ExportResult<EncodedImage> {
    let (width, height) = image.dimensions();
    let mut bytes = Vec::new();
    let result = match format {
        ExportFormat::Png => PngEncoder::new(&mut bytes).write_image(
            image.as_raw(),
            width,
            height,
            ExtendedColorType::Rgba8,
        ),
        ExportFormat::Jpeg => {
            let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100)).write_image(
                rgb.as_raw(),
                width,
                height,
                ExtendedColorType::Rgb8,
            )
        }
        ExportFormat::Webp => WebPEncoder::new_lossless(&mut bytes).write_image(
            image.as_raw(),
            width,
            height,
            ExtendedColorType::Rgba8,
        ),
    };
    result.map_err(|source| ExportError::Encode { format, source })?;

    Ok(EncodedImage {
        format,
        width,
        height,
        bytes,
    })
}

pub fn suggested_file_name(format: ExportFormat, now: SystemTime) -> String {
    let millis = now
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();
    format!("{FILE_NAME_PREFIX}-{millis}.{}", format.extension())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved(PathBuf),
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SaveDialogError {
    #[error("save dialog is not available")]
    Unavailable,
    #[error("save dialog failed: {0}")]
    Failed(String),
}

/// Interactive "save to chosen location" flow.
pub trait SaveDialog {
    fn save(
        &mut self,
        suggested_name: &str,
        image: &EncodedImage,
    ) -> Result<SaveOutcome, SaveDialogError>;
}

/// Fallback used whenever the save dialog is unavailable or fails.
pub trait DownloadSink {
    fn download(&mut self, file_name: &str, image: &EncodedImage) -> ExportResult<PathBuf>;
}

/// Save dialog with a location chosen up front. Without one it reports itself
/// unavailable so the download fallback takes over.
#[derive(Debug, Clone, Default)]
pub struct PathSaveDialog {
    target: Option<PathBuf>,
}

impl PathSaveDialog {
    pub fn new(target: Option<PathBuf>) -> Self {
        Self { target }
    }
}

impl SaveDialog for PathSaveDialog {
    fn save(
        &mut self,
        _suggested_name: &str,
        image: &EncodedImage,
    ) -> Result<SaveOutcome, SaveDialogError> {
        let Some(target) = self.target.as_deref() else {
            return Err(SaveDialogError::Unavailable);
        };
        write_file(target, &image.bytes)
            .map_err(|err| SaveDialogError::Failed(err.to_string()))?;
        Ok(SaveOutcome::Saved(target.to_path_buf()))
    }
}

/// Writes downloads into a directory, never overwriting an existing file.
#[derive(Debug, Clone)]
pub struct DirectoryDownload {
    dir: PathBuf,
}

impl DirectoryDownload {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn available_path(&self, file_name: &str) -> PathBuf {
        let candidate = self.dir.join(file_name);
        if !candidate.exists() {
            return candidate;
        }

        let (stem, extension) = match file_name.rsplit_once('.') {
            Some((stem, extension)) => (stem, Some(extension)),
            None => (file_name, None),
        };
        (1u32..)
            .map(|index| {
                let name = match extension {
                    Some(extension) => format!("{stem} ({index}).{extension}"),
                    None => format!("{stem} ({index})"),
                };
                self.dir.join(name)
            })
            .find(|path| !path.exists())
            .unwrap_or(candidate)
    }
}

impl DownloadSink for DirectoryDownload {
    fn download(&mut self, file_name: &str, image: &EncodedImage) -> ExportResult<PathBuf> {
        let path = self.available_path(file_name);
        write_file(&path, &image.bytes).map_err(|source| ExportError::Write {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Saved(PathBuf),
    Downloaded(PathBuf),
    Cancelled,
}

/// Encodes and persists drawings: save dialog first, download as the fallback.
#[derive(Debug)]
pub struct Exporter<D, S> {
    dialog: D,
    download: S,
    quality: u8,
}

impl<D: SaveDialog, S: DownloadSink> Exporter<D, S> {
    pub fn new(dialog: D, download: S) -> Self {
        Self {
            dialog,
            download,
            quality: DEFAULT_EXPORT_QUALITY,
        }
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality.clamp(1, 100);
        self
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn dialog(&self) -> &D {
        &self.dialog
    }

    pub fn download(&self) -> &S {
        &self.download
    }

    /// Encoding happens before anything is written, so an encode failure never
    /// leaves a partial file behind.
    pub fn export(&mut self, image: &RgbaImage, format: ExportFormat) -> ExportResult<ExportOutcome> {
        let encoded = encode(image, format, self.quality)?;
        let file_name = suggested_file_name(format, SystemTime::now());
        self.persist(&file_name, &encoded)
    }

    pub fn persist(
        &mut self,
        file_name: &str,
        encoded: &EncodedImage,
    ) -> ExportResult<ExportOutcome> {
        match self.dialog.save(file_name, encoded) {
            Ok(SaveOutcome::Saved(path)) => {
                tracing::debug!(path = %path.display(), "drawing saved");
                return Ok(ExportOutcome::Saved(path));
            }
            Ok(SaveOutcome::Cancelled) => {
                tracing::debug!("save dialog cancelled");
                return Ok(ExportOutcome::Cancelled);
            }
            Err(SaveDialogError::Unavailable) => {
                tracing::debug!("save dialog unavailable; downloading");
            }
            Err(err) => {
                tracing::warn!(%err, "save dialog failed; downloading instead");
            }
        }

        let path = self.download.download(file_name, encoded)?;
        tracing::debug!(path = %path.display(), "drawing downloaded");
        Ok(ExportOutcome::Downloaded(path))
    }
}
