use crate::export::ExportError;
use crate::gallery::GalleryError;
use crate::geometry::ColorParseError;
use crate::script::ScriptError;
use crate::source::SourceError;
use crate::state::StateError;
use thiserror::Error;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Gallery(#[from] GalleryError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Color(#[from] ColorParseError),
    #[error(transparent)]
    Script(#[from] ScriptError),
}
