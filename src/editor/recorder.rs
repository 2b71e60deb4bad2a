use super::history::History;
use super::tools::{Stroke, StrokePoint, ToolStyle};
use crate::input::{PointerEvent, PointerEventKind, PointerTarget};
use crate::layers::LayerStack;
use crate::viewport::ViewportGeometry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecorderState {
    #[default]
    Idle,
    Recording,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderOutcome {
    Ignored,
    Started,
    Extended,
    Committed,
}

/// Everything a pointer event may touch while it is being recorded.
pub struct RecordingContext<'a> {
    pub style: &'a ToolStyle,
    pub geometry: &'a ViewportGeometry,
    pub history: &'a mut History,
    pub layers: &'a mut LayerStack,
}

/// Turns one pointer gesture into one stroke.
///
/// `Idle -> Recording` on pointer-down, `Recording -> Idle` on up, cancel or
/// leave. Gestures cannot be resumed once they end.
#[derive(Debug, Default)]
pub struct StrokeRecorder {
    in_flight: Option<Stroke>,
}

impl StrokeRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RecorderState {
        if self.in_flight.is_some() {
            RecorderState::Recording
        } else {
            RecorderState::Idle
        }
    }

    pub fn is_recording(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_flight(&self) -> Option<&Stroke> {
        self.in_flight.as_ref()
    }

    pub fn handle(
        &mut self,
        event: &PointerEvent,
        context: RecordingContext<'_>,
        target: &mut dyn PointerTarget,
    ) -> RecorderOutcome {
        match event.kind {
            PointerEventKind::Down => self.begin(event, context, target),
            PointerEventKind::Move => self.extend(event, context),
            PointerEventKind::Up | PointerEventKind::Cancel | PointerEventKind::Leave => {
                self.finish(event, context)
            }
        }
    }

    fn begin(
        &mut self,
        event: &PointerEvent,
        context: RecordingContext<'_>,
        target: &mut dyn PointerTarget,
    ) -> RecorderOutcome {
        if let Some(abandoned) = self.in_flight.take() {
            tracing::debug!(
                points = abandoned.points.len(),
                "pointer down while recording; discarding unfinished stroke"
            );
        }

        let mut stroke = Stroke::begin(context.style);
        context.history.clear_redo();

        if let Err(err) = target.set_pointer_capture(event.pointer_id) {
            tracing::debug!(%err, "recording without pointer capture");
        }

        stroke.append_point(clamped_point(event, context.geometry));
        context.layers.draw_preview(&stroke);
        tracing::debug!(tool = %stroke.tool, pointer = event.pointer_id, "stroke started");
        self.in_flight = Some(stroke);
        RecorderOutcome::Started
    }

    fn extend(&mut self, event: &PointerEvent, context: RecordingContext<'_>) -> RecorderOutcome {
        let Some(stroke) = self.in_flight.as_mut() else {
            return RecorderOutcome::Ignored;
        };
        stroke.append_point(clamped_point(event, context.geometry));
        context.layers.draw_preview(stroke);
        RecorderOutcome::Extended
    }

    fn finish(&mut self, event: &PointerEvent, context: RecordingContext<'_>) -> RecorderOutcome {
        let Some(mut stroke) = self.in_flight.take() else {
            return RecorderOutcome::Ignored;
        };
        stroke.append_point(clamped_point(event, context.geometry));
        tracing::debug!(
            tool = %stroke.tool,
            points = stroke.points.len(),
            ended_by = ?event.kind,
            "stroke finished"
        );
        context.history.commit(stroke);
        context.layers.clear_preview();
        context.layers.repaint_committed(context.history.committed());
        RecorderOutcome::Committed
    }

    /// Drops the in-flight stroke without committing it.
    pub fn discard(&mut self) -> Option<Stroke> {
        self.in_flight.take()
    }

    /// Keeps the in-flight stroke aligned with a rescaled history.
    pub fn rescale(&mut self, scale_x: f64, scale_y: f64) {
        if let Some(stroke) = self.in_flight.as_mut() {
            stroke.scale_points(scale_x, scale_y);
        }
    }
}

fn clamped_point(event: &PointerEvent, geometry: &ViewportGeometry) -> StrokePoint {
    let (x, y) = geometry.clamp_point(event.x, event.y);
    StrokePoint::with_pressure(x, y, event.pressure)
}
