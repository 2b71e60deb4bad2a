use image::{imageops, Rgba, RgbaImage};
use tiny_skia::{ColorU8, IntSize, Pixmap, PixmapPaint, Transform};

use crate::geometry::{DisplaySize, PixelSize};
use crate::viewport::{buffer_size, normalize_device_pixel_ratio};

/// A drawable raster with a logical (CSS pixel) coordinate space.
///
/// The backing pixmap is `logical × device_pixel_ratio` pixels; every draw goes
/// through [`Surface::transform`] so callers only ever see logical coordinates.
#[derive(Debug, Clone)]
pub struct Surface {
    pixmap: Pixmap,
    logical: DisplaySize,
    device_pixel_ratio: f64,
}

impl Surface {
    /// Returns `None` when the buffer cannot be allocated.
    pub fn new(logical: DisplaySize, device_pixel_ratio: f64) -> Option<Self> {
        let device_pixel_ratio = normalize_device_pixel_ratio(device_pixel_ratio);
        let logical = logical.at_least_one();
        let pixels = buffer_size(logical, device_pixel_ratio);
        let pixmap = Pixmap::new(pixels.width, pixels.height)?;
        Some(Self {
            pixmap,
            logical,
            device_pixel_ratio,
        })
    }

    pub fn logical_size(&self) -> DisplaySize {
        self.logical
    }

    pub fn pixel_size(&self) -> PixelSize {
        PixelSize::new(self.pixmap.width(), self.pixmap.height())
    }

    pub fn device_pixel_ratio(&self) -> f64 {
        self.device_pixel_ratio
    }

    /// Logical-to-device transform applied to every draw call.
    pub fn transform(&self) -> Transform {
        let ratio = self.device_pixel_ratio as f32;
        Transform::from_scale(ratio, ratio)
    }

    pub fn clear(&mut self) {
        self.pixmap.fill(tiny_skia::Color::TRANSPARENT);
    }

    pub(crate) fn pixmap_mut(&mut self) -> &mut Pixmap {
        &mut self.pixmap
    }

    /// Draws `image` stretched over the whole surface, source-over.
    pub fn draw_image(&mut self, image: &RgbaImage) {
        if image.width() == 0 || image.height() == 0 {
            return;
        }
        let (width, height) = (self.pixmap.width(), self.pixmap.height());
        let resized;
        let source = if image.dimensions() == (width, height) {
            image
        } else {
            resized = imageops::resize(image, width, height, imageops::FilterType::Triangle);
            &resized
        };

        let Some(layer) = pixmap_from_rgba(source) else {
            tracing::warn!(width, height, "could not allocate image layer");
            return;
        };
        self.pixmap.draw_pixmap(
            0,
            0,
            layer.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }

    /// Composites another surface of the same buffer size on top of this one.
    pub fn draw_surface(&mut self, other: &Surface) {
        self.pixmap.draw_pixmap(
            0,
            0,
            other.pixmap.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }

    /// Straight-alpha RGBA of one device pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let color = self.pixmap.pixel(x, y)?.demultiply();
        Some([color.red(), color.green(), color.blue(), color.alpha()])
    }

    /// True when any pixel has non-zero alpha.
    pub fn has_ink(&self) -> bool {
        self.pixmap.pixels().iter().any(|pixel| pixel.alpha() > 0)
    }

    pub fn to_rgba_image(&self) -> RgbaImage {
        rgba_from_pixmap(&self.pixmap)
    }
}

pub(crate) fn pixmap_from_rgba(image: &RgbaImage) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(image.width(), image.height())?;
    for (target, source) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
        let [r, g, b, a] = source.0;
        *target = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Some(pixmap)
}

pub(crate) fn rgba_from_pixmap(pixmap: &Pixmap) -> RgbaImage {
    let mut image = RgbaImage::new(pixmap.width(), pixmap.height());
    for (target, source) in image.pixels_mut().zip(pixmap.pixels()) {
        let color = source.demultiply();
        *target = Rgba([color.red(), color.green(), color.blue(), color.alpha()]);
    }
    image
}

/// Gaussian blur over premultiplied pixels. Blurring premultiplied data keeps
/// colour from bleeding out of transparent regions.
pub(crate) fn blur_pixmap(pixmap: &Pixmap, sigma: f32) -> Option<Pixmap> {
    if sigma <= 0.0 {
        return Some(pixmap.clone());
    }
    let raw = RgbaImage::from_raw(pixmap.width(), pixmap.height(), pixmap.data().to_vec())?;
    let mut data = imageops::blur(&raw, sigma).into_raw();
    for pixel in data.chunks_exact_mut(4) {
        let alpha = pixel[3];
        for channel in &mut pixel[..3] {
            *channel = (*channel).min(alpha);
        }
    }
    Pixmap::from_vec(data, IntSize::from_wh(pixmap.width(), pixmap.height())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_follows_device_pixel_ratio() {
        let surface = Surface::new(DisplaySize::new(100, 50), 2.0).unwrap();
        assert_eq!(surface.logical_size(), DisplaySize::new(100, 50));
        assert_eq!(surface.pixel_size(), PixelSize::new(200, 100));
    }

    #[test]
    fn zero_sized_surface_is_raised_to_one_pixel() {
        let surface = Surface::new(DisplaySize::new(0, 0), 1.0).unwrap();
        assert_eq!(surface.pixel_size(), PixelSize::new(1, 1));
    }

    #[test]
    fn draw_image_stretches_to_the_buffer() {
        let mut surface = Surface::new(DisplaySize::new(20, 10), 2.0).unwrap();
        let image = RgbaImage::from_pixel(4, 2, Rgba([10, 20, 30, 255]));
        surface.draw_image(&image);
        assert_eq!(surface.pixel(0, 0), Some([10, 20, 30, 255]));
        assert_eq!(surface.pixel(39, 19), Some([10, 20, 30, 255]));
    }

    #[test]
    fn clear_removes_all_ink() {
        let mut surface = Surface::new(DisplaySize::new(8, 8), 1.0).unwrap();
        surface.draw_image(&RgbaImage::from_pixel(8, 8, Rgba([255, 0, 0, 255])));
        assert!(surface.has_ink());
        surface.clear();
        assert!(!surface.has_ink());
    }

    #[test]
    fn rgba_conversion_preserves_opaque_pixels() {
        let image = RgbaImage::from_pixel(3, 3, Rgba([200, 100, 50, 255]));
        let pixmap = pixmap_from_rgba(&image).unwrap();
        assert_eq!(rgba_from_pixmap(&pixmap), image);
    }

    #[test]
    fn blur_spreads_alpha_to_neighbours() {
        let mut image = RgbaImage::new(21, 21);
        image.put_pixel(10, 10, Rgba([255, 255, 255, 255]));
        let pixmap = pixmap_from_rgba(&image).unwrap();
        let blurred = blur_pixmap(&pixmap, 2.0).unwrap();
        assert!(blurred.pixel(12, 10).unwrap().alpha() > 0);
        assert!(blurred.pixel(10, 10).unwrap().alpha() < 255);
    }
}
