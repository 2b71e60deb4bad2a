//! One open photo in the annotation editor: geometry, surfaces, history and the
//! stroke being drawn.

use image::RgbaImage;

use crate::editor::history::rescale_factors;
use crate::editor::tools::{Stroke, ToolStyle};
use crate::editor::{History, HistoryAction, RecorderOutcome, RecordingContext, StrokeRecorder};
use crate::export::{
    flatten, DownloadSink, ExportFormat, ExportOutcome, ExportResult, Exporter, SaveDialog,
};
use crate::geometry::DisplaySize;
use crate::input::{PointerEvent, PointerTarget};
use crate::layers::LayerStack;
use crate::source::ImageSource;
use crate::viewport::ViewportGeometry;

#[derive(Debug)]
pub struct EditorSession {
    photo_url: String,
    source_image: Option<RgbaImage>,
    geometry: ViewportGeometry,
    layers: LayerStack,
    history: History,
    recorder: StrokeRecorder,
    style: ToolStyle,
}

impl EditorSession {
    /// Loads `url` and sizes the surfaces to fit `available`. A photo that fails to
    /// load leaves the editor usable on a blank background.
    pub fn open(
        url: &str,
        source: &dyn ImageSource,
        available: DisplaySize,
        device_pixel_ratio: f64,
        style: ToolStyle,
    ) -> Self {
        let source_image = match source.load(url) {
            Ok(image) => Some(image),
            Err(err) => {
                tracing::warn!(url, %err, "photo failed to load; editing a blank canvas");
                None
            }
        };
        let original = source_image
            .as_ref()
            .map_or(DisplaySize::new(0, 0), |image| {
                DisplaySize::new(image.width(), image.height())
            });
        let geometry = ViewportGeometry::new(original, available, device_pixel_ratio);

        let mut session = Self {
            photo_url: url.to_string(),
            source_image,
            geometry,
            layers: LayerStack::new(),
            history: History::new(),
            recorder: StrokeRecorder::new(),
            style,
        };
        session.rebuild_surfaces();
        tracing::debug!(
            url,
            ?original,
            display = ?session.geometry.display(),
            "editor session opened"
        );
        session
    }

    pub fn photo_url(&self) -> &str {
        &self.photo_url
    }

    pub fn source_image(&self) -> Option<&RgbaImage> {
        self.source_image.as_ref()
    }

    pub fn geometry(&self) -> &ViewportGeometry {
        &self.geometry
    }

    pub fn layers(&self) -> &LayerStack {
        &self.layers
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn style(&self) -> &ToolStyle {
        &self.style
    }

    /// Takes effect from the next pointer-down; a stroke in progress keeps its style.
    pub fn set_style(&mut self, style: ToolStyle) {
        self.style = style;
    }

    pub fn style_mut(&mut self) -> &mut ToolStyle {
        &mut self.style
    }

    pub fn in_flight(&self) -> Option<&Stroke> {
        self.recorder.in_flight()
    }

    pub fn is_drawing(&self) -> bool {
        self.recorder.is_recording()
    }

    pub fn handle_pointer(
        &mut self,
        event: &PointerEvent,
        target: &mut dyn PointerTarget,
    ) -> RecorderOutcome {
        let context = RecordingContext {
            style: &self.style,
            geometry: &self.geometry,
            history: &mut self.history,
            layers: &mut self.layers,
        };
        self.recorder.handle(event, context, target)
    }

    /// Refits the photo to a new available box. Recorded strokes are rescaled
    /// before the repaint so they stay on the same spot of the photo.
    pub fn resize(&mut self, available: DisplaySize) -> bool {
        let Some(previous) = self.geometry.refit(available) else {
            return false;
        };
        let current = self.geometry.display();
        if !self.history.is_empty() || self.recorder.is_recording() {
            self.history.rescale(previous, current);
            if let Some((scale_x, scale_y)) = rescale_factors(previous, current) {
                self.recorder.rescale(scale_x, scale_y);
            }
        }
        self.rebuild_surfaces();
        tracing::debug!(from = ?previous, to = ?current, "editor resized");
        true
    }

    pub fn set_device_pixel_ratio(&mut self, device_pixel_ratio: f64) -> bool {
        if !self.geometry.set_device_pixel_ratio(device_pixel_ratio) {
            return false;
        }
        self.rebuild_surfaces();
        true
    }

    pub fn undo(&mut self) -> bool {
        self.apply_history(HistoryAction::Undo)
    }

    pub fn redo(&mut self) -> bool {
        self.apply_history(HistoryAction::Redo)
    }

    fn apply_history(&mut self, action: HistoryAction) -> bool {
        if !self.history.apply(action) {
            return false;
        }
        self.layers.repaint_committed(self.history.committed());
        true
    }

    /// Drops every stroke, including redo history. Not undoable.
    pub fn clear_all(&mut self) {
        self.history.clear();
        if self.recorder.discard().is_some() {
            tracing::debug!("discarded stroke in progress");
        }
        self.layers.clear_committed();
        self.layers.clear_preview();
        tracing::debug!(url = %self.photo_url, "drawing cleared");
    }

    /// Strokes in paint order, the one being drawn last.
    pub fn strokes(&self) -> impl Iterator<Item = &Stroke> {
        self.history
            .committed()
            .iter()
            .chain(self.recorder.in_flight())
    }

    /// The photo with every stroke at its native resolution.
    pub fn flatten(&self) -> ExportResult<RgbaImage> {
        flatten(self.source_image.as_ref(), self.strokes(), &self.geometry)
    }

    pub fn export<D: SaveDialog, S: DownloadSink>(
        &self,
        format: ExportFormat,
        exporter: &mut Exporter<D, S>,
    ) -> ExportResult<ExportOutcome> {
        let image = self.flatten()?;
        let outcome = exporter.export(&image, format)?;
        tracing::debug!(url = %self.photo_url, ?format, ?outcome, "export finished");
        Ok(outcome)
    }

    /// On-screen composite at buffer resolution.
    pub fn composite(&self) -> Option<RgbaImage> {
        self.layers.composite()
    }

    /// Tears the session down. Listener removal is best effort: a failure is
    /// logged and the session is discarded anyway.
    pub fn close(mut self, target: &mut dyn PointerTarget) {
        if let Err(err) = target.detach_listeners() {
            tracing::warn!(%err, "failed to detach editor input listeners");
        }
        self.recorder.discard();
        self.history.clear();
        self.layers.release();
        tracing::debug!(url = %self.photo_url, "editor session closed");
    }

    fn rebuild_surfaces(&mut self) {
        self.layers.resize(&self.geometry);
        self.layers.draw_background(self.source_image.as_ref());
        self.layers.repaint_committed(self.history.committed());
        if let Some(stroke) = self.recorder.in_flight() {
            self.layers.draw_preview(stroke);
        }
    }
}
