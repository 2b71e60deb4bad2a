mod stroke;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use crate::geometry::Color;
pub use stroke::{Stroke, StrokePoint};

pub const MIN_STROKE_SIZE: f64 = 1.0;
pub const MAX_STROKE_SIZE: f64 = 200.0;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown tool: {0:?}")]
pub struct ToolParseError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    #[default]
    Pen,
    Marker,
    Brush,
    Shadow,
    Spray,
}

impl ToolKind {
    pub const ALL: [Self; 5] = [
        Self::Pen,
        Self::Marker,
        Self::Brush,
        Self::Shadow,
        Self::Spray,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pen => "pen",
            Self::Marker => "marker",
            Self::Brush => "brush",
            Self::Shadow => "shadow",
            Self::Spray => "spray",
        }
    }

    /// Spray paints a point cloud; every other tool strokes a path.
    pub const fn strokes_path(self) -> bool {
        !matches!(self, Self::Spray)
    }
}

impl FromStr for ToolKind {
    type Err = ToolParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tool| tool.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| ToolParseError(value.to_string()))
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The currently selected drawing style; every new stroke snapshots it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToolStyle {
    pub tool: ToolKind,
    pub color: Color,
    pub size: f64,
    pub opacity: f64,
}

impl Default for ToolStyle {
    fn default() -> Self {
        Self {
            tool: ToolKind::Pen,
            color: Color::new(0xff, 0x2d, 0x55),
            size: 4.0,
            opacity: 1.0,
        }
    }
}

impl ToolStyle {
    pub fn select_tool(&mut self, tool: ToolKind) {
        self.tool = tool;
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn set_size(&mut self, size: f64) {
        if size.is_finite() {
            self.size = size.clamp(MIN_STROKE_SIZE, MAX_STROKE_SIZE);
        }
    }

    pub fn set_opacity(&mut self, opacity: f64) {
        if opacity.is_finite() {
            self.opacity = opacity.clamp(0.0, 1.0);
        }
    }

    /// Builds a style from raw values, clamping them the same way the setters do.
    pub fn clamped(tool: ToolKind, color: Color, size: f64, opacity: f64) -> Self {
        let mut style = Self {
            tool,
            color,
            ..Self::default()
        };
        style.set_size(size);
        style.set_opacity(opacity);
        style
    }
}
