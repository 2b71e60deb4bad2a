pub mod config;
pub mod editor;
pub mod error;
pub mod export;
pub mod gallery;
pub mod geometry;
pub mod input;
pub mod layers;
pub mod logging;
pub mod page;
pub mod render;
pub mod script;
pub mod session;
pub mod source;
pub mod state;
pub mod viewport;

use std::path::{Path, PathBuf};

pub use error::{AppError, AppResult};

use crate::export::{DirectoryDownload, ExportFormat, ExportOutcome, Exporter, PathSaveDialog};
use crate::gallery::{DirectoryGallery, GalleryBrowser, GalleryListing, ManifestGallery};
use crate::input::NullPointerTarget;
use crate::page::PhotoPage;
use crate::source::FileImageSource;

/// Replays a gesture script over one photo and exports the result.
#[derive(Debug, Clone)]
pub struct DrawOptions {
    pub image: PathBuf,
    pub script: PathBuf,
    pub format: ExportFormat,
    pub out: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub enum Command {
    Draw(DrawOptions),
    /// Lists a gallery from an uploads directory or a JSON manifest.
    Gallery { listing: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunReport {
    Exported(ExportOutcome),
    Listed(Vec<String>),
}

/// Entrypoint used by the CLI binary.
pub fn run(command: Command) -> AppResult<RunReport> {
    logging::init();
    tracing::info!("starting okol-canvas");
    let config = config::load_app_config();

    let report = match command {
        Command::Draw(options) => RunReport::Exported(draw(&options, &config)?),
        Command::Gallery { listing } => RunReport::Listed(list_gallery(&listing, &config)?),
    };
    tracing::info!(?report, "run complete");
    Ok(report)
}

fn draw(options: &DrawOptions, config: &config::AppConfig) -> AppResult<ExportOutcome> {
    let script = script::load_script(&options.script)?;
    let photo = options.image.to_string_lossy().into_owned();
    let source = FileImageSource::new(".");
    let device_pixel_ratio = script
        .device_pixel_ratio
        .unwrap_or(config.device_pixel_ratio);

    let mut page = PhotoPage::new(
        GalleryBrowser::new(vec![photo.clone()]),
        config.tool_style(),
        device_pixel_ratio,
    );
    let mut target = NullPointerTarget;
    page.open_editor(&photo, &source, script.available)?;
    script.replay(&mut page, &mut target)?;

    let mut exporter = Exporter::new(
        PathSaveDialog::new(options.out.clone()),
        DirectoryDownload::new(config.download_dir()),
    )
    .with_quality(config.export_quality());
    let outcome = match page.editor() {
        Some(editor) => editor.export(options.format, &mut exporter)?,
        None => ExportOutcome::Cancelled,
    };
    page.close_editor(&mut target)?;
    Ok(outcome)
}

fn list_gallery(path: &Path, config: &config::AppConfig) -> AppResult<Vec<String>> {
    let listing: Box<dyn GalleryListing> = if path.is_dir() {
        Box::new(DirectoryGallery::new(path))
    } else {
        Box::new(ManifestGallery::new(path))
    };
    Ok(listing
        .list()?
        .iter()
        .map(|entry| gallery::normalize_photo_url(&config.backend_base, entry))
        .collect())
}
