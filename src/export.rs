//! Flattening a scene into a PNG.

use base64::{Engine as _, engine::general_purpose};
use egui::Rect;
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;
use std::path::PathBuf;
use thiserror::Error;
use tiny_skia::Transform;

use crate::capture::Background;
use crate::overlay::CropRect;
use crate::raster::{Compositor, FontCache};
use crate::scene::Scene;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Nothing to export: the export area is empty")]
    EmptyArea,

    #[error("Failed to allocate a {width}x{height} raster")]
    Allocation { width: u32, height: u32 },

    #[error("Failed to encode PNG: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Failed to save export: {0}")]
    Sink(#[from] std::io::Error),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExportOptions {
    /// Composite the screen capture or opened image under the annotations
    pub include_background: bool,
    /// Output pixels per logical pixel in screen mode
    pub pixel_ratio: f32,
    /// Overwrite this file instead of picking a fresh name
    pub overwrite_path: Option<PathBuf>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_background: true,
            pixel_ratio: 1.0,
            overwrite_path: None,
        }
    }
}

/// Encoded PNG plus its dimensions
#[derive(Clone, PartialEq, Eq)]
pub struct ExportedRaster {
    png: Vec<u8>,
    width: u32,
    height: u32,
}

impl std::fmt::Debug for ExportedRaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportedRaster")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("png_len", &self.png.len())
            .finish()
    }
}

impl ExportedRaster {
    pub fn encode(image: &RgbaImage) -> Result<Self, ExportError> {
        let mut png = Vec::new();
        image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        Ok(Self {
            png,
            width: image.width(),
            height: image.height(),
        })
    }

    pub fn png(&self) -> &[u8] {
        &self.png
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn to_data_url(&self) -> String {
        format!("data:image/png;base64,{}", general_purpose::STANDARD.encode(&self.png))
    }
}

/// Where a successful export ended up
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportOutcome {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Output raster size and the canvas → output pixel mapping.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExportPlan {
    pub width: u32,
    pub height: u32,
    pub view: Transform,
    /// Canvas rect the background image is stretched over
    pub background_dest: Rect,
}

impl ExportPlan {
    /// Screen mode renders the crop (or the whole canvas) at `pixel_ratio`.
    /// Image mode renders at the opened image's own resolution, undoing the
    /// letterbox fit.
    pub fn new(canvas: Rect, crop: Option<CropRect>, background: &Background, options: &ExportOptions) -> Result<Self, ExportError> {
        let plan = match background {
            Background::Screen { .. } => {
                let region = crop.map_or(canvas, |c| c.to_rect());
                let r = options.pixel_ratio.max(f32::EPSILON);
                Self {
                    width: (region.width() * r).round().max(0.0) as u32,
                    height: (region.height() * r).round().max(0.0) as u32,
                    view: Transform::from_row(r, 0.0, 0.0, r, -region.min.x * r, -region.min.y * r),
                    background_dest: canvas,
                }
            }
            Background::Image { fit, .. } => {
                let display = crop.map_or_else(|| fit.display_rect(), |c| c.to_rect());
                let region = fit.rect_to_original(display);
                let s = fit.scale.max(f32::EPSILON);
                Self {
                    width: region.width().round().max(0.0) as u32,
                    height: region.height().round().max(0.0) as u32,
                    view: Transform::from_row(
                        1.0 / s,
                        0.0,
                        0.0,
                        1.0 / s,
                        -fit.offset.x / s - region.min.x,
                        -fit.offset.y / s - region.min.y,
                    ),
                    background_dest: fit.display_rect(),
                }
            }
        };
        if plan.width == 0 || plan.height == 0 {
            return Err(ExportError::EmptyArea);
        }
        Ok(plan)
    }

    /// Composite `background` (if any) and the scene into one raster.
    pub fn render(&self, scene: &Scene, background: Option<&RgbaImage>, fonts: FontCache) -> Result<RgbaImage, ExportError> {
        let mut compositor = Compositor::new(self.width, self.height, self.view, fonts).ok_or(ExportError::Allocation {
            width: self.width,
            height: self.height,
        })?;
        if let Some(image) = background {
            compositor.draw_background(image, self.background_dest);
        }
        compositor.draw_scene(scene);
        Ok(compositor.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::{Pos2, vec2};

    fn canvas() -> Rect {
        Rect::from_min_size(Pos2::ZERO, vec2(800.0, 600.0))
    }

    #[test]
    fn crop_sets_output_size() {
        let crop = CropRect::new(10.0, 10.0, 100.0, 50.0);
        let plan = ExportPlan::new(canvas(), Some(crop), &Background::Screen { scale_factor: 1.0 }, &ExportOptions::default()).unwrap();
        assert_eq!((plan.width, plan.height), (100, 50));
    }

    #[test]
    fn pixel_ratio_scales_output() {
        let options = ExportOptions { pixel_ratio: 2.0, ..ExportOptions::default() };
        let plan = ExportPlan::new(canvas(), None, &Background::Screen { scale_factor: 2.0 }, &options).unwrap();
        assert_eq!((plan.width, plan.height), (1600, 1200));
    }

    #[test]
    fn image_mode_uses_original_resolution() {
        let background = Background::image(RgbaImage::new(1600, 1200), vec2(800.0, 600.0));
        let plan = ExportPlan::new(canvas(), None, &background, &ExportOptions::default()).unwrap();
        assert_eq!((plan.width, plan.height), (1600, 1200));
        // Display (400, 300) is the image centre
        let mut p = [tiny_skia::Point::from_xy(400.0, 300.0)];
        plan.view.map_points(&mut p);
        assert!((p[0].x - 800.0).abs() < 1e-3 && (p[0].y - 600.0).abs() < 1e-3);
    }

    #[test]
    fn degenerate_crop_is_rejected() {
        let crop = CropRect::new(10.0, 10.0, 0.2, 50.0);
        let result = ExportPlan::new(canvas(), Some(crop), &Background::Screen { scale_factor: 1.0 }, &ExportOptions::default());
        assert!(matches!(result, Err(ExportError::EmptyArea)));
    }

    #[test]
    fn data_url_has_png_prefix() {
        let raster = ExportedRaster::encode(&RgbaImage::new(2, 2)).unwrap();
        assert!(raster.to_data_url().starts_with("data:image/png;base64,"));
        assert_eq!(raster.width(), 2);
    }
}
