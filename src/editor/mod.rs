//! Tool styles, stroke recording and undo history for the annotation editor.

pub mod history;
pub mod recorder;
pub mod tools;

pub use history::{History, HistoryAction};
pub use recorder::{RecorderOutcome, RecorderState, RecordingContext, StrokeRecorder};
pub use tools::{Stroke, StrokePoint, ToolKind, ToolStyle};
