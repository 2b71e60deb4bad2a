use std::collections::hash_map::DefaultHasher;
use std::f64::consts::TAU;
use std::hash::{Hash, Hasher};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tiny_skia::{
    BlendMode, FillRule, FilterQuality, LineCap, LineJoin, Paint, Path, PathBuilder, Pixmap,
    PixmapPaint, Rect, Transform,
};

use super::surface::{blur_pixmap, Surface};
use crate::editor::tools::{Stroke, ToolKind};
use crate::geometry::Color;

const MARKER_WIDTH_FACTOR: f64 = 2.5;
const MARKER_ALPHA_FACTOR: f64 = 0.6;
const MARKER_ALPHA_FLOOR: f64 = 0.12;
const BRUSH_WIDTH_FACTOR: f64 = 1.8;
const SHADOW_WIDTH_FACTOR: f64 = 1.6;
const SHADOW_OFFSET_FACTOR: f64 = 0.4;
const SHADOW_MIN_BLUR: f64 = 4.0;
const SHADOW_GLOW_ALPHA: f64 = 0.6;
const SPRAY_STEP: f64 = 2.0;
const SPRAY_MIN_DENSITY: f64 = 10.0;
const SPRAY_DENSITY_FACTOR: f64 = 2.5;
const SPRAY_RADIUS_FACTOR: f64 = 0.6;
const SPRAY_DOT_SIZE: f32 = 1.0;

/// Blurred copy of the stroke drawn underneath it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glow {
    /// Canvas-style blur radius in target units; the Gaussian sigma is half of it.
    pub blur: f64,
    pub color: Color,
    pub alpha: f64,
}

/// Resolved paint parameters for one stroke at one target scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolPaint {
    pub width: f64,
    pub alpha: f64,
    pub blend_mode: BlendMode,
    pub glow: Option<Glow>,
    /// Downward shift applied to every point, in target units.
    pub offset_y: f64,
}

/// `max(1, size × scale)`: the base width every tool derives its own width from.
pub fn effective_width(stroke: &Stroke, scale: f64) -> f64 {
    (stroke.size * scale).max(1.0)
}

pub fn tool_paint(stroke: &Stroke, scale: f64) -> ToolPaint {
    let base = effective_width(stroke, scale);
    let opacity = stroke.opacity.clamp(0.0, 1.0);
    match stroke.tool {
        ToolKind::Pen => ToolPaint {
            width: base,
            alpha: opacity,
            blend_mode: BlendMode::SourceOver,
            glow: None,
            offset_y: 0.0,
        },
        ToolKind::Marker => ToolPaint {
            width: base * MARKER_WIDTH_FACTOR,
            alpha: (opacity * MARKER_ALPHA_FACTOR).max(MARKER_ALPHA_FLOOR),
            blend_mode: BlendMode::SourceOver,
            glow: None,
            offset_y: 0.0,
        },
        ToolKind::Brush => ToolPaint {
            width: base * BRUSH_WIDTH_FACTOR,
            alpha: opacity,
            blend_mode: BlendMode::SourceOver,
            glow: Some(Glow {
                blur: base / 2.0,
                color: stroke.color,
                alpha: 1.0,
            }),
            offset_y: 0.0,
        },
        ToolKind::Shadow => ToolPaint {
            width: base * SHADOW_WIDTH_FACTOR,
            alpha: opacity,
            blend_mode: BlendMode::Multiply,
            glow: Some(Glow {
                blur: base.max(SHADOW_MIN_BLUR),
                color: Color::BLACK,
                alpha: SHADOW_GLOW_ALPHA,
            }),
            offset_y: (base * SHADOW_OFFSET_FACTOR).max(1.0),
        },
        ToolKind::Spray => ToolPaint {
            width: base,
            alpha: opacity,
            blend_mode: BlendMode::SourceOver,
            glow: None,
            offset_y: 0.0,
        },
    }
}

/// Paints `stroke` onto `surface`, mapping its display-space points by `scale`.
///
/// Every call builds its own paint, so nothing it sets (blend mode, alpha, blur)
/// outlives the call or leaks into later draws on the same surface.
pub fn render_stroke(surface: &mut Surface, stroke: &Stroke, scale: f64) {
    if stroke.is_empty() || !scale.is_finite() || scale <= 0.0 {
        return;
    }

    let paint = tool_paint(stroke, scale);
    if stroke.tool.strokes_path() {
        render_path(surface, stroke, scale, &paint);
    } else {
        render_spray(surface, stroke, scale, &paint);
    }
}

enum Shape {
    Dot(Path),
    Line(Path),
}

impl Shape {
    fn build(stroke: &Stroke, scale: f64, paint: &ToolPaint) -> Option<Self> {
        let project = |x: f64, y: f64| ((x * scale) as f32, (y * scale + paint.offset_y) as f32);

        if stroke.is_single_point() {
            let first = stroke.points.first()?;
            let (cx, cy) = project(first.x, first.y);
            let radius = (paint.width / 2.0).max(0.5) as f32;
            return PathBuilder::from_circle(cx, cy, radius).map(Self::Dot);
        }

        let mut builder = PathBuilder::new();
        for (index, point) in stroke.points.iter().enumerate() {
            let (x, y) = project(point.x, point.y);
            if index == 0 {
                builder.move_to(x, y);
            } else {
                builder.line_to(x, y);
            }
        }
        builder.finish().map(Self::Line)
    }

    fn path(&self) -> &Path {
        match self {
            Self::Dot(path) | Self::Line(path) => path,
        }
    }

    fn draw(&self, pixmap: &mut Pixmap, paint: &Paint<'_>, width: f64, transform: Transform) {
        match self {
            Self::Dot(path) => {
                pixmap.fill_path(path, paint, FillRule::Winding, transform, None);
            }
            Self::Line(path) => {
                let line = tiny_skia::Stroke {
                    width: width as f32,
                    line_cap: LineCap::Round,
                    line_join: LineJoin::Round,
                    ..tiny_skia::Stroke::default()
                };
                pixmap.stroke_path(path, paint, &line, transform, None);
            }
        }
    }
}

fn solid_paint(color: Color, alpha: f64, blend_mode: BlendMode) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(skia_color(color, alpha));
    paint.blend_mode = blend_mode;
    paint.anti_alias = true;
    paint
}

fn skia_color(color: Color, alpha: f64) -> tiny_skia::Color {
    let (r, g, b) = color.rgb();
    tiny_skia::Color::from_rgba(
        f32::from(r) / 255.0,
        f32::from(g) / 255.0,
        f32::from(b) / 255.0,
        alpha.clamp(0.0, 1.0) as f32,
    )
    .unwrap_or(tiny_skia::Color::TRANSPARENT)
}

fn render_path(surface: &mut Surface, stroke: &Stroke, scale: f64, paint: &ToolPaint) {
    let Some(shape) = Shape::build(stroke, scale, paint) else {
        tracing::debug!(tool = %stroke.tool, "stroke produced no drawable path");
        return;
    };

    if let Some(glow) = paint.glow {
        render_glow(surface, &shape, paint, glow);
    }

    let main = solid_paint(stroke.color, paint.alpha, paint.blend_mode);
    let transform = surface.transform();
    shape.draw(surface.pixmap_mut(), &main, paint.width, transform);
}

/// Draws the shape into a scratch region, blurs it and composites the result
/// under the current blend mode and stroke alpha.
fn render_glow(surface: &mut Surface, shape: &Shape, paint: &ToolPaint, glow: Glow) {
    let ratio = surface.device_pixel_ratio();
    let sigma = (glow.blur / 2.0 * ratio).max(0.0);
    let padding = paint.width / 2.0 * ratio + sigma * 3.0 + 2.0;

    let bounds = shape.path().bounds();
    let pixels = surface.pixel_size();
    let left = (f64::from(bounds.left()) * ratio - padding).floor().max(0.0);
    let top = (f64::from(bounds.top()) * ratio - padding).floor().max(0.0);
    let right = (f64::from(bounds.right()) * ratio + padding)
        .ceil()
        .min(f64::from(pixels.width));
    let bottom = (f64::from(bounds.bottom()) * ratio + padding)
        .ceil()
        .min(f64::from(pixels.height));
    if right <= left || bottom <= top {
        return;
    }

    let Some(mut scratch) = Pixmap::new((right - left) as u32, (bottom - top) as u32) else {
        return;
    };
    let transform = surface
        .transform()
        .post_translate(-(left as f32), -(top as f32));
    let glow_paint = solid_paint(glow.color, glow.alpha, BlendMode::SourceOver);
    shape.draw(&mut scratch, &glow_paint, paint.width, transform);

    let Some(blurred) = blur_pixmap(&scratch, sigma as f32) else {
        tracing::debug!("glow blur failed; drawing stroke without glow");
        return;
    };
    let composite = PixmapPaint {
        opacity: paint.alpha.clamp(0.0, 1.0) as f32,
        blend_mode: paint.blend_mode,
        quality: FilterQuality::Nearest,
    };
    surface.pixmap_mut().draw_pixmap(
        left as i32,
        top as i32,
        blurred.as_ref(),
        &composite,
        Transform::identity(),
        None,
    );
}

/// Burst centres of a spray stroke in display units, one every ~2 units along each
/// segment, and the number of dots each burst scatters at `scale`.
pub fn spray_bursts(stroke: &Stroke, scale: f64) -> (Vec<(f64, f64)>, usize) {
    let density = (effective_width(stroke, scale) * SPRAY_DENSITY_FACTOR)
        .round()
        .max(SPRAY_MIN_DENSITY) as usize;

    if stroke.is_single_point() {
        let centers = stroke.points.first().map(|point| (point.x, point.y));
        return (centers.into_iter().collect(), density);
    }

    let mut centers = Vec::new();
    for pair in stroke.points.windows(2) {
        let (start, end) = (pair[0], pair[1]);
        let dx = end.x - start.x;
        let dy = end.y - start.y;
        let length = dx.hypot(dy);
        let length = if length > 0.0 { length } else { 1.0 };
        let steps = (length / SPRAY_STEP).round().max(1.0) as usize;
        for step in 0..steps {
            let t = step as f64 / steps as f64;
            centers.push((start.x + dx * t, start.y + dy * t));
        }
    }
    (centers, density)
}

fn render_spray(surface: &mut Surface, stroke: &Stroke, scale: f64, paint: &ToolPaint) {
    let (centers, density) = spray_bursts(stroke, scale);
    let radius = paint.width * SPRAY_RADIUS_FACTOR;
    let dot = solid_paint(stroke.color, paint.alpha, paint.blend_mode);
    let transform = surface.transform();
    let mut rng = StdRng::seed_from_u64(spray_seed(stroke));

    for (center_x, center_y) in centers {
        let (cx, cy) = (center_x * scale, center_y * scale);
        for _ in 0..density {
            let distance = rng.gen::<f64>() * radius;
            let angle = rng.gen::<f64>() * TAU;
            let x = (cx + angle.cos() * distance) as f32;
            let y = (cy + angle.sin() * distance) as f32;
            if let Some(rect) = Rect::from_xywh(x, y, SPRAY_DOT_SIZE, SPRAY_DOT_SIZE) {
                surface
                    .pixmap_mut()
                    .fill_rect(rect, &dot, transform, None);
            }
        }
    }
}

/// Seed derived from the stroke itself, so repaints and exports scatter the same cloud.
fn spray_seed(stroke: &Stroke) -> u64 {
    let mut hasher = DefaultHasher::new();
    stroke.color.hash(&mut hasher);
    stroke.size.to_bits().hash(&mut hasher);
    stroke.opacity.to_bits().hash(&mut hasher);
    for point in &stroke.points {
        point.x.to_bits().hash(&mut hasher);
        point.y.to_bits().hash(&mut hasher);
    }
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::tools::{StrokePoint, ToolStyle};
    use crate::geometry::DisplaySize;

    fn stroke(tool: ToolKind, points: &[(f64, f64)]) -> Stroke {
        let style = ToolStyle::clamped(tool, Color::new(0, 0, 255), 4.0, 1.0);
        let mut stroke = Stroke::begin(&style);
        for &(x, y) in points {
            stroke.append_point(StrokePoint::new(x, y));
        }
        stroke
    }

    fn surface(width: u32, height: u32) -> Surface {
        Surface::new(DisplaySize::new(width, height), 1.0).unwrap()
    }

    fn alpha_at(surface: &Surface, x: u32, y: u32) -> u8 {
        surface.pixel(x, y).map_or(0, |pixel| pixel[3])
    }

    #[test]
    fn paint_table_matches_each_tool() {
        let scale = 2.0;
        let pen = tool_paint(&stroke(ToolKind::Pen, &[]), scale);
        assert_eq!(pen.width, 8.0);
        assert_eq!(pen.blend_mode, BlendMode::SourceOver);
        assert!(pen.glow.is_none());

        let marker = tool_paint(&stroke(ToolKind::Marker, &[]), scale);
        assert_eq!(marker.width, 20.0);
        assert!((marker.alpha - 0.6).abs() < 1e-12);

        let brush = tool_paint(&stroke(ToolKind::Brush, &[]), scale);
        assert!((brush.width - 14.4).abs() < 1e-9);
        let glow = brush.glow.unwrap();
        assert_eq!(glow.blur, 4.0);
        assert_eq!(glow.color, Color::new(0, 0, 255));

        let shadow = tool_paint(&stroke(ToolKind::Shadow, &[]), scale);
        assert_eq!(shadow.blend_mode, BlendMode::Multiply);
        assert!((shadow.width - 12.8).abs() < 1e-9);
        assert!((shadow.offset_y - 3.2).abs() < 1e-9);
        let glow = shadow.glow.unwrap();
        assert_eq!(glow.blur, 8.0);
        assert_eq!(glow.color, Color::BLACK);
        assert_eq!(glow.alpha, 0.6);
    }

    #[test]
    fn effective_width_never_drops_below_one() {
        let mut tiny = stroke(ToolKind::Pen, &[]);
        tiny.size = 1.0;
        assert_eq!(effective_width(&tiny, 0.1), 1.0);
        let shadow = tool_paint(&stroke(ToolKind::Shadow, &[]), 0.1);
        assert_eq!(shadow.offset_y, 1.0);
        assert_eq!(shadow.glow.unwrap().blur, 4.0);
    }

    #[test]
    fn marker_alpha_is_floored() {
        let mut marker = stroke(ToolKind::Marker, &[(10.0, 10.0), (90.0, 10.0)]);
        marker.opacity = 0.05;
        assert!((tool_paint(&marker, 1.0).alpha - 0.12).abs() < 1e-12);

        let mut target = surface(100, 20);
        render_stroke(&mut target, &marker, 1.0);
        let alpha = i32::from(alpha_at(&target, 50, 10));
        assert!((alpha - 31).abs() <= 2, "alpha was {alpha}");
    }

    #[test]
    fn pen_inks_along_the_polyline_only() {
        let mut target = surface(100, 40);
        render_stroke(
            &mut target,
            &stroke(ToolKind::Pen, &[(10.0, 20.0), (90.0, 20.0)]),
            1.0,
        );
        assert_eq!(target.pixel(50, 20), Some([0, 0, 255, 255]));
        assert_eq!(alpha_at(&target, 50, 30), 0);
        // Round caps extend past the end points.
        assert!(alpha_at(&target, 8, 20) > 0);
    }

    #[test]
    fn single_point_stroke_leaves_a_visible_dot() {
        for tool in ToolKind::ALL {
            let mut target = surface(40, 40);
            render_stroke(&mut target, &stroke(tool, &[(20.0, 20.0)]), 1.0);
            assert!(target.has_ink(), "{tool} dropped a single-point stroke");
        }
    }

    #[test]
    fn empty_stroke_draws_nothing() {
        let mut target = surface(10, 10);
        render_stroke(&mut target, &stroke(ToolKind::Pen, &[]), 1.0);
        assert!(!target.has_ink());
    }

    #[test]
    fn render_does_not_mutate_the_stroke() {
        let original = stroke(ToolKind::Shadow, &[(5.0, 5.0), (30.0, 12.0)]);
        let copy = original.clone();
        render_stroke(&mut surface(40, 40), &copy, 3.0);
        assert_eq!(copy, original);
    }

    #[test]
    fn brush_glow_bleeds_past_the_stroke_edge() {
        let mut brush = stroke(ToolKind::Brush, &[(10.0, 30.0), (90.0, 30.0)]);
        brush.size = 8.0;
        let mut target = surface(100, 60);
        render_stroke(&mut target, &brush, 1.0);
        // Stroke half-width is 7.2; the glow reaches further out.
        assert!(alpha_at(&target, 50, 39) > 0);
        assert_eq!(alpha_at(&target, 50, 55), 0);
    }

    #[test]
    fn shadow_is_shifted_down_and_multiplies_with_the_background() {
        let mut target = surface(100, 60);
        target.draw_image(&image::RgbaImage::from_pixel(
            100,
            60,
            image::Rgba([255, 255, 0, 255]),
        ));
        render_stroke(
            &mut target,
            &stroke(ToolKind::Shadow, &[(10.0, 20.0), (90.0, 20.0)]),
            1.0,
        );
        // Offset is max(1, 4 × 0.4) = 1.6; multiply of blue over yellow darkens.
        let [r, g, b, a] = target.pixel(50, 21).unwrap();
        assert_eq!(a, 255);
        assert!(r < 40 && g < 40 && b < 40, "got {r},{g},{b}");
        // Far from the stroke the background is untouched.
        assert_eq!(target.pixel(50, 55), Some([255, 255, 0, 255]));
    }

    #[test]
    fn spray_is_deterministic_and_stays_within_radius() {
        let spray = stroke(ToolKind::Spray, &[(20.0, 20.0), (60.0, 20.0)]);
        let mut first = surface(80, 40);
        let mut second = surface(80, 40);
        render_stroke(&mut first, &spray, 1.0);
        render_stroke(&mut second, &spray, 1.0);
        assert!(first.has_ink());
        assert_eq!(first.to_rgba_image(), second.to_rgba_image());

        // Radius is 4 × 0.6 = 2.4 around y = 20, plus the one-unit dot.
        for x in 0..80 {
            for y in (0..15).chain(25..40) {
                assert_eq!(alpha_at(&first, x, y), 0, "dot outside radius at {x},{y}");
            }
        }
    }

    #[test]
    fn spray_density_follows_effective_width() {
        let small = stroke(ToolKind::Spray, &[(0.0, 0.0), (10.0, 0.0)]);
        // 4 × 2.5 = 10, the floor.
        assert_eq!(spray_bursts(&small, 1.0).1, 10);
        // At export scale 0.5 the floor still holds.
        assert_eq!(spray_bursts(&small, 0.5).1, 10);

        let mut wide = small.clone();
        wide.size = 12.0;
        assert_eq!(spray_bursts(&wide, 1.0).1, 30);
        // Effective width 12 × 3 = 36 gives round(90).
        assert_eq!(spray_bursts(&wide, 3.0).1, 90);
        wide.size = 4.3;
        assert_eq!(spray_bursts(&wide, 1.0).1, 11);
    }

    #[test]
    fn spray_bursts_every_two_units_along_each_segment() {
        let spray = stroke(ToolKind::Spray, &[(10.0, 5.0), (50.0, 5.0)]);
        let (centers, _) = spray_bursts(&spray, 1.0);
        assert_eq!(centers.len(), 20);
        assert_eq!(centers[0], (10.0, 5.0));
        for pair in centers.windows(2) {
            assert!((pair[1].0 - pair[0].0 - 2.0).abs() < 1e-9);
            assert_eq!(pair[1].1, 5.0);
        }

        // Centres stay in display units whatever the render scale.
        let (scaled, _) = spray_bursts(&spray, 4.0);
        assert_eq!(scaled, centers);
    }

    #[test]
    fn spray_single_point_and_short_segment_burst_once() {
        let dot = stroke(ToolKind::Spray, &[(7.0, 8.0)]);
        assert_eq!(spray_bursts(&dot, 1.0).0, vec![(7.0, 8.0)]);

        let short = stroke(ToolKind::Spray, &[(0.0, 0.0), (0.5, 0.0)]);
        assert_eq!(spray_bursts(&short, 1.0).0, vec![(0.0, 0.0)]);
    }

    #[test]
    fn surface_scale_keeps_logical_coordinates() {
        let mut target = Surface::new(DisplaySize::new(50, 20), 2.0).unwrap();
        render_stroke(
            &mut target,
            &stroke(ToolKind::Pen, &[(5.0, 10.0), (45.0, 10.0)]),
            1.0,
        );
        // Logical y = 10 is device row 20; the line is 8 device pixels thick.
        assert!(alpha_at(&target, 50, 20) > 0);
        assert!(alpha_at(&target, 50, 23) > 0);
        assert_eq!(alpha_at(&target, 50, 30), 0);
    }
}
