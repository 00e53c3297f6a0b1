//! Offscreen rasterization used by export and by blur capture.

pub mod blur;
pub mod compositor;
pub mod text;

use egui::Color32;
use image::{Rgba, RgbaImage};
use tiny_skia::{ColorU8, Paint, Pixmap};

pub use blur::{placeholder_patch, process_patch};
pub use compositor::Compositor;
pub use text::FontCache;

/// Anti-aliased solid paint, alpha scaled by `opacity`
pub(crate) fn paint(color: Color32, opacity: f32) -> Paint<'static> {
    let [r, g, b, a] = color.to_srgba_unmultiplied();
    let alpha = (f32::from(a) * opacity.clamp(0.0, 1.0)).round() as u8;
    let mut paint = Paint::default();
    paint.set_color_rgba8(r, g, b, alpha);
    paint.anti_alias = true;
    paint
}

pub fn image_to_pixmap(image: &RgbaImage) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(image.width(), image.height())?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Some(pixmap)
}

pub fn pixmap_to_image(pixmap: &Pixmap) -> RgbaImage {
    let mut image = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in image.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    image
}

/// Gaussian blur in place. Works on the premultiplied data directly, which
/// keeps soft edges free of dark fringes.
pub(crate) fn blur_pixmap(pixmap: &mut Pixmap, sigma: f32) {
    let Some(image) = RgbaImage::from_raw(pixmap.width(), pixmap.height(), pixmap.data().to_vec()) else {
        return;
    };
    let blurred = image::imageops::blur(&image, sigma);
    pixmap.data_mut().copy_from_slice(blurred.as_raw());
}
