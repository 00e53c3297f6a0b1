use image::{Rgba, RgbaImage};

use crate::presets::{self, BlurStyle};

/// Bake a blur or mosaic of `source` at the given intensity.
pub fn process_patch(source: &RgbaImage, style: BlurStyle, intensity: u8) -> RgbaImage {
    match style {
        BlurStyle::Gaussian => image::imageops::blur(source, presets::gaussian_sigma(intensity)),
        BlurStyle::Mosaic => mosaic(source, presets::mosaic_block_size(intensity)),
    }
}

/// Flat semi-transparent fill used when the region could not be captured.
pub fn placeholder_patch(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width.max(1), height.max(1), Rgba(presets::BLUR_PLACEHOLDER))
}

/// Replace every `block` x `block` cell with its average colour.
fn mosaic(source: &RgbaImage, block: u32) -> RgbaImage {
    let block = block.max(1);
    let (width, height) = source.dimensions();
    let mut out = RgbaImage::new(width, height);
    for by in (0..height).step_by(block as usize) {
        for bx in (0..width).step_by(block as usize) {
            let x_end = (bx + block).min(width);
            let y_end = (by + block).min(height);
            let mut sum = [0u64; 4];
            for y in by..y_end {
                for x in bx..x_end {
                    let p = source.get_pixel(x, y);
                    for (acc, channel) in sum.iter_mut().zip(p.0) {
                        *acc += u64::from(channel);
                    }
                }
            }
            let count = u64::from((x_end - bx) * (y_end - by));
            let avg = Rgba(sum.map(|s| (s / count) as u8));
            for y in by..y_end {
                for x in bx..x_end {
                    out.put_pixel(x, y, avg);
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mosaic_averages_blocks() {
        let mut img = RgbaImage::new(4, 4);
        img.put_pixel(0, 0, Rgba([255, 255, 255, 255]));
        let out = mosaic(&img, 2);
        assert_eq!(out.get_pixel(1, 1).0, [63, 63, 63, 63]);
        assert_eq!(out.get_pixel(3, 3).0, [0, 0, 0, 0]);
    }

    #[test]
    fn processing_keeps_dimensions() {
        let img = RgbaImage::from_pixel(30, 20, Rgba([10, 20, 30, 255]));
        for style in [BlurStyle::Gaussian, BlurStyle::Mosaic] {
            assert_eq!(process_patch(&img, style, 60).dimensions(), (30, 20));
        }
    }

    #[test]
    fn placeholder_is_never_empty() {
        let patch = placeholder_patch(0, 0);
        assert_eq!(patch.dimensions(), (1, 1));
        assert_eq!(patch.get_pixel(0, 0).0, presets::BLUR_PLACEHOLDER);
    }
}
