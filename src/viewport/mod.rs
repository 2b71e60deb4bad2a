//! Aspect-fit sizing of the source image into the space the host gives the editor.

use crate::geometry::{DisplaySize, PixelSize};

/// Largest uniformly scaled size of `natural` that fits inside `available`.
///
/// The short side is rounded first and the long side derived from it, so the
/// rounding error on the aspect ratio stays under one pixel of the short side.
/// Zero sizes are treated as one pixel and the result is never smaller than 1×1.
pub fn fit_display_size(natural: DisplaySize, available: DisplaySize) -> DisplaySize {
    let natural = natural.at_least_one();
    let available = available.at_least_one();
    let scale = (f64::from(available.width) / f64::from(natural.width))
        .min(f64::from(available.height) / f64::from(natural.height));

    if natural.width >= natural.height {
        let (height, width) = fit_axes(
            natural.height,
            natural.width,
            available.height,
            available.width,
            scale,
        );
        DisplaySize::new(width, height)
    } else {
        let (width, height) = fit_axes(
            natural.width,
            natural.height,
            available.width,
            available.height,
            scale,
        );
        DisplaySize::new(width, height)
    }
}

/// Returns `(short, long)` for a uniform `scale`, shrinking the short side until
/// the long side derived from it fits `long_limit`.
fn fit_axes(short: u32, long: u32, short_limit: u32, long_limit: u32, scale: f64) -> (u32, u32) {
    let ratio = f64::from(long) / f64::from(short);
    let mut fitted_short = round_to_pixels(f64::from(short) * scale).min(short_limit);
    let mut fitted_long = round_to_pixels(ratio * f64::from(fitted_short));
    while fitted_long > long_limit && fitted_short > 1 {
        fitted_short -= 1;
        fitted_long = round_to_pixels(ratio * f64::from(fitted_short));
    }
    (fitted_short, fitted_long.min(long_limit))
}

/// Backing-buffer size for a surface shown at `display` on a screen with `device_pixel_ratio`.
pub fn buffer_size(display: DisplaySize, device_pixel_ratio: f64) -> PixelSize {
    let ratio = normalize_device_pixel_ratio(device_pixel_ratio);
    PixelSize::new(
        round_to_pixels(f64::from(display.width) * ratio),
        round_to_pixels(f64::from(display.height) * ratio),
    )
}

pub fn normalize_device_pixel_ratio(device_pixel_ratio: f64) -> f64 {
    if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
        device_pixel_ratio
    } else {
        1.0
    }
}

fn round_to_pixels(value: f64) -> u32 {
    if !value.is_finite() {
        return 1;
    }
    value.round().clamp(1.0, f64::from(u32::MAX)) as u32
}

/// Display, original and device-pixel geometry of one editor session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportGeometry {
    display: DisplaySize,
    original: DisplaySize,
    device_pixel_ratio: f64,
}

impl ViewportGeometry {
    /// `original` may be 0×0 when the source image failed to load.
    pub fn new(original: DisplaySize, available: DisplaySize, device_pixel_ratio: f64) -> Self {
        Self {
            display: fit_display_size(original, available),
            original,
            device_pixel_ratio: normalize_device_pixel_ratio(device_pixel_ratio),
        }
    }

    pub const fn display(&self) -> DisplaySize {
        self.display
    }

    pub const fn original(&self) -> DisplaySize {
        self.original
    }

    pub const fn device_pixel_ratio(&self) -> f64 {
        self.device_pixel_ratio
    }

    pub fn buffer_size(&self) -> PixelSize {
        buffer_size(self.display, self.device_pixel_ratio)
    }

    /// Recomputes the display size for a new available box. Returns the previous
    /// display size when it changed.
    pub fn refit(&mut self, available: DisplaySize) -> Option<DisplaySize> {
        let next = fit_display_size(self.original, available);
        if next == self.display {
            return None;
        }
        let previous = self.display;
        self.display = next;
        Some(previous)
    }

    pub fn set_device_pixel_ratio(&mut self, device_pixel_ratio: f64) -> bool {
        let ratio = normalize_device_pixel_ratio(device_pixel_ratio);
        if (ratio - self.device_pixel_ratio).abs() < f64::EPSILON {
            return false;
        }
        self.device_pixel_ratio = ratio;
        true
    }

    /// Size of the flattened export: the native size, or the display size when the
    /// source has no known dimensions.
    pub fn export_size(&self) -> DisplaySize {
        DisplaySize::new(
            if self.original.width > 0 {
                self.original.width
            } else {
                self.display.width
            },
            if self.original.height > 0 {
                self.original.height
            } else {
                self.display.height
            },
        )
    }

    /// Uniform factor from display space to export space (mean of both axes).
    pub fn export_scale(&self) -> f64 {
        let export = self.export_size();
        let display = self.display.at_least_one();
        let scale_x = f64::from(export.width) / f64::from(display.width);
        let scale_y = f64::from(export.height) / f64::from(display.height);
        (scale_x + scale_y) / 2.0
    }

    /// Clamps a display-space coordinate onto the surface.
    pub fn clamp_point(&self, x: f64, y: f64) -> (f64, f64) {
        let x = if x.is_finite() { x } else { 0.0 };
        let y = if y.is_finite() { y } else { 0.0 };
        (
            x.clamp(0.0, f64::from(self.display.width)),
            y.clamp(0.0, f64::from(self.display.height)),
        )
    }
}
