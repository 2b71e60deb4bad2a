use serde::{Deserialize, Serialize};

use super::{ToolKind, ToolStyle};
use crate::geometry::Color;

const fn default_pressure() -> f64 {
    1.0
}

/// One recorded pointer sample in display-space coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokePoint {
    pub x: f64,
    pub y: f64,
    #[serde(default = "default_pressure")]
    pub pressure: f64,
}

impl StrokePoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            pressure: 1.0,
        }
    }

    /// Devices that report `0` (or nothing) are recorded as full pressure.
    pub fn with_pressure(x: f64, y: f64, pressure: Option<f64>) -> Self {
        let pressure = pressure
            .filter(|value| *value > 0.0 && value.is_finite())
            .map_or(1.0, |value| value.min(1.0));
        Self { x, y, pressure }
    }
}

/// One continuous gesture: the style it was drawn with plus its ordered samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub tool: ToolKind,
    pub color: Color,
    pub size: f64,
    pub opacity: f64,
    pub points: Vec<StrokePoint>,
}

impl Stroke {
    pub fn begin(style: &ToolStyle) -> Self {
        Self {
            tool: style.tool,
            color: style.color,
            size: style.size,
            opacity: style.opacity,
            points: Vec::new(),
        }
    }

    pub fn append_point(&mut self, point: StrokePoint) {
        self.points.push(point);
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// True when the gesture never moved: one sample, or every sample at the same spot.
    pub fn is_single_point(&self) -> bool {
        match self.points.split_first() {
            Some((first, rest)) => rest
                .iter()
                .all(|point| point.x == first.x && point.y == first.y),
            None => false,
        }
    }

    pub fn scale_points(&mut self, scale_x: f64, scale_y: f64) {
        for point in &mut self.points {
            point.x *= scale_x;
            point.y *= scale_y;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_or_missing_pressure_defaults_to_full() {
        assert_eq!(StrokePoint::with_pressure(1.0, 2.0, None).pressure, 1.0);
        assert_eq!(StrokePoint::with_pressure(1.0, 2.0, Some(0.0)).pressure, 1.0);
        assert_eq!(StrokePoint::with_pressure(1.0, 2.0, Some(0.4)).pressure, 0.4);
    }

    #[test]
    fn begin_copies_style_and_starts_without_points() {
        let style = ToolStyle::default();
        let stroke = Stroke::begin(&style);
        assert_eq!(stroke.tool, style.tool);
        assert_eq!(stroke.color, style.color);
        assert!(stroke.is_empty());
        assert!(!stroke.is_single_point());
    }

    #[test]
    fn repeated_samples_at_one_spot_count_as_single_point() {
        let mut stroke = Stroke::begin(&ToolStyle::default());
        stroke.append_point(StrokePoint::new(5.0, 5.0));
        assert!(stroke.is_single_point());
        stroke.append_point(StrokePoint::new(5.0, 5.0));
        assert!(stroke.is_single_point());
        stroke.append_point(StrokePoint::new(6.0, 5.0));
        assert!(!stroke.is_single_point());
    }

    #[test]
    fn scale_points_multiplies_each_axis_independently() {
        let mut stroke = Stroke::begin(&ToolStyle::default());
        stroke.append_point(StrokePoint::new(10.0, 20.0));
        stroke.scale_points(2.0, 0.5);
        assert_eq!(stroke.points[0], StrokePoint::new(20.0, 10.0));
    }
}
