//! Three co-registered drawing surfaces: background photo, live preview, committed ink.

use image::RgbaImage;

use crate::editor::tools::Stroke;
use crate::geometry::DisplaySize;
use crate::render::{render_stroke, Surface};
use crate::viewport::ViewportGeometry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Background,
    Preview,
    Committed,
}

impl Layer {
    /// Bottom to top.
    pub const Z_ORDER: [Self; 3] = [Self::Background, Self::Preview, Self::Committed];

    pub const fn accepts_pointer_input(self) -> bool {
        !matches!(self, Self::Background)
    }
}

/// Owns the drawing surfaces of one editor session. Callers never touch raw
/// pixmaps; every entry point is a no-op until the surfaces exist.
#[derive(Debug, Default)]
pub struct LayerStack {
    background: Option<Surface>,
    preview: Option<Surface>,
    committed: Option<Surface>,
}

impl LayerStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_geometry(geometry: &ViewportGeometry) -> Self {
        let mut layers = Self::new();
        layers.resize(geometry);
        layers
    }

    /// Reallocates all three surfaces for the geometry. Everything is cleared; the
    /// caller redraws the background and repaints committed ink afterwards.
    pub fn resize(&mut self, geometry: &ViewportGeometry) {
        let logical = geometry.display();
        let ratio = geometry.device_pixel_ratio();
        self.background = Surface::new(logical, ratio);
        self.preview = Surface::new(logical, ratio);
        self.committed = Surface::new(logical, ratio);
        if !self.is_ready() {
            tracing::warn!(display = ?logical, ratio, "could not allocate layer surfaces");
        }
        tracing::debug!(display = ?logical, ratio, "layer stack resized");
    }

    pub fn release(&mut self) {
        self.background = None;
        self.preview = None;
        self.committed = None;
    }

    pub fn is_ready(&self) -> bool {
        self.background.is_some() && self.preview.is_some() && self.committed.is_some()
    }

    pub fn display_size(&self) -> Option<DisplaySize> {
        self.background.as_ref().map(Surface::logical_size)
    }

    pub fn layer(&self, layer: Layer) -> Option<&Surface> {
        match layer {
            Layer::Background => self.background.as_ref(),
            Layer::Preview => self.preview.as_ref(),
            Layer::Committed => self.committed.as_ref(),
        }
    }

    /// Redraws the photo stretched over the display area; `None` leaves it blank.
    pub fn draw_background(&mut self, image: Option<&RgbaImage>) {
        let Some(surface) = self.background.as_mut() else {
            return;
        };
        surface.clear();
        if let Some(image) = image {
            surface.draw_image(image);
        }
    }

    /// Shows only the in-progress stroke on the preview surface.
    pub fn draw_preview(&mut self, stroke: &Stroke) {
        let Some(surface) = self.preview.as_mut() else {
            return;
        };
        surface.clear();
        render_stroke(surface, stroke, 1.0);
    }

    pub fn clear_preview(&mut self) {
        if let Some(surface) = self.preview.as_mut() {
            surface.clear();
        }
    }

    /// Clears committed ink and paints `strokes` in order; later strokes land on top.
    pub fn repaint_committed(&mut self, strokes: &[Stroke]) {
        let Some(surface) = self.committed.as_mut() else {
            return;
        };
        surface.clear();
        for stroke in strokes {
            render_stroke(surface, stroke, 1.0);
        }
        tracing::debug!(strokes = strokes.len(), "committed layer repainted");
    }

    pub fn clear_committed(&mut self) {
        if let Some(surface) = self.committed.as_mut() {
            surface.clear();
        }
    }

    /// Flattens the stack bottom to top at buffer resolution.
    pub fn composite(&self) -> Option<RgbaImage> {
        let mut flattened = self.background.clone()?;
        for layer in &Layer::Z_ORDER[1..] {
            flattened.draw_surface(self.layer(*layer)?);
        }
        Some(flattened.to_rgba_image())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::tools::{StrokePoint, ToolKind, ToolStyle};
    use crate::geometry::{Color, PixelSize};
    use image::Rgba;

    fn geometry() -> ViewportGeometry {
        ViewportGeometry::new(DisplaySize::new(200, 100), DisplaySize::new(100, 100), 2.0)
    }

    fn pen_stroke(color: Color, points: &[(f64, f64)]) -> Stroke {
        let style = ToolStyle::clamped(ToolKind::Pen, color, 6.0, 1.0);
        let mut stroke = Stroke::begin(&style);
        for &(x, y) in points {
            stroke.append_point(StrokePoint::new(x, y));
        }
        stroke
    }

    #[test]
    fn uninitialized_stack_ignores_every_draw() {
        let mut layers = LayerStack::new();
        layers.draw_background(None);
        layers.draw_preview(&pen_stroke(Color::BLACK, &[(1.0, 1.0)]));
        layers.repaint_committed(&[]);
        layers.clear_preview();
        assert!(!layers.is_ready());
        assert!(layers.composite().is_none());
    }

    #[test]
    fn surfaces_share_display_size_and_device_buffer() {
        let layers = LayerStack::with_geometry(&geometry());
        assert_eq!(layers.display_size(), Some(DisplaySize::new(100, 50)));
        for layer in Layer::Z_ORDER {
            assert_eq!(
                layers.layer(layer).unwrap().pixel_size(),
                PixelSize::new(200, 100)
            );
        }
    }

    #[test]
    fn only_background_is_inert() {
        assert!(!Layer::Background.accepts_pointer_input());
        assert!(Layer::Preview.accepts_pointer_input());
        assert!(Layer::Committed.accepts_pointer_input());
    }

    #[test]
    fn resize_discards_stale_pixels() {
        let mut layers = LayerStack::with_geometry(&geometry());
        layers.repaint_committed(&[pen_stroke(Color::BLACK, &[(10.0, 10.0), (90.0, 10.0)])]);
        assert!(layers.layer(Layer::Committed).unwrap().has_ink());

        layers.resize(&geometry());
        assert!(!layers.layer(Layer::Committed).unwrap().has_ink());
    }

    #[test]
    fn later_strokes_paint_over_earlier_ones() {
        let mut layers = LayerStack::with_geometry(&geometry());
        let red = pen_stroke(Color::new(255, 0, 0), &[(10.0, 25.0), (90.0, 25.0)]);
        let blue = pen_stroke(Color::new(0, 0, 255), &[(50.0, 5.0), (50.0, 45.0)]);
        layers.repaint_committed(&[red.clone(), blue.clone()]);
        assert_eq!(
            layers.layer(Layer::Committed).unwrap().pixel(100, 50),
            Some([0, 0, 255, 255])
        );

        layers.repaint_committed(&[blue, red]);
        assert_eq!(
            layers.layer(Layer::Committed).unwrap().pixel(100, 50),
            Some([255, 0, 0, 255])
        );
    }

    #[test]
    fn composite_stacks_committed_ink_over_background() {
        let mut layers = LayerStack::with_geometry(&geometry());
        layers.draw_background(Some(&RgbaImage::from_pixel(
            20,
            10,
            Rgba([255, 255, 255, 255]),
        )));
        layers.draw_preview(&pen_stroke(Color::new(0, 255, 0), &[(10.0, 40.0), (90.0, 40.0)]));
        layers.repaint_committed(&[pen_stroke(Color::BLACK, &[(10.0, 10.0), (90.0, 10.0)])]);

        let flattened = layers.composite().unwrap();
        assert_eq!(flattened.get_pixel(100, 20).0, [0, 0, 0, 255]);
        assert_eq!(flattened.get_pixel(100, 80).0, [0, 255, 0, 255]);
        assert_eq!(flattened.get_pixel(100, 50).0, [255, 255, 255, 255]);

        layers.clear_preview();
        let flattened = layers.composite().unwrap();
        assert_eq!(flattened.get_pixel(100, 80).0, [255, 255, 255, 255]);
    }
}
