//! Contracts for the platform collaborators the engine depends on: screen
//! capture, export destinations and the system font list.

use egui::{Pos2, Rect, Vec2, pos2, vec2};
use futures::future::{self, BoxFuture, FutureExt};
use image::RgbaImage;
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::export::ExportedRaster;
use crate::util::time;

/// Source of background pixels. Any call may yield `None` (permission
/// denied, capture raced with a window change); callers fall back instead of
/// failing.
pub trait CaptureProvider: Send + Sync {
    /// The whole screen behind the overlay, in physical pixels
    fn capture_full_background(&self) -> BoxFuture<'_, Option<RgbaImage>>;

    /// A region of the screen in physical pixels
    fn capture_region(&self, x: u32, y: u32, width: u32, height: u32) -> BoxFuture<'_, Option<RgbaImage>>;
}

/// Provider that never has anything to offer
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCapture;

impl CaptureProvider for NoCapture {
    fn capture_full_background(&self) -> BoxFuture<'_, Option<RgbaImage>> {
        future::ready(None).boxed()
    }

    fn capture_region(&self, _x: u32, _y: u32, _width: u32, _height: u32) -> BoxFuture<'_, Option<RgbaImage>> {
        future::ready(None).boxed()
    }
}

/// Provider backed by a frame grabbed up front
#[derive(Debug, Clone)]
pub struct FrameCapture {
    frame: Arc<RgbaImage>,
}

impl FrameCapture {
    pub fn new(frame: RgbaImage) -> Self {
        Self { frame: Arc::new(frame) }
    }
}

impl CaptureProvider for FrameCapture {
    fn capture_full_background(&self) -> BoxFuture<'_, Option<RgbaImage>> {
        future::ready(Some(self.frame.as_ref().clone())).boxed()
    }

    fn capture_region(&self, x: u32, y: u32, width: u32, height: u32) -> BoxFuture<'_, Option<RgbaImage>> {
        future::ready(crop_image(&self.frame, x, y, width, height)).boxed()
    }
}

/// Copy a region out of `image`, clipped to its bounds. `None` if nothing is left.
pub fn crop_image(image: &RgbaImage, x: u32, y: u32, width: u32, height: u32) -> Option<RgbaImage> {
    if x >= image.width() || y >= image.height() {
        return None;
    }
    let width = width.min(image.width() - x);
    let height = height.min(image.height() - y);
    if width == 0 || height == 0 {
        return None;
    }
    Some(image::imageops::crop_imm(image, x, y, width, height).to_image())
}

/// Where an exported raster ends up
pub trait ExportSink {
    /// Store `raster`, at `overwrite_path` when given. Returns the saved path.
    fn save_raster(&self, raster: &ExportedRaster, overwrite_path: Option<&Path>) -> std::io::Result<PathBuf>;
}

/// Writes timestamped PNG files into a directory
#[derive(Debug, Clone)]
pub struct FileExportSink {
    dir: PathBuf,
}

impl FileExportSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory from `ANNOTATION_OVERLAY_EXPORT_DIR`, or the working directory
    pub fn from_env() -> Self {
        let dir = std::env::var_os("ANNOTATION_OVERLAY_EXPORT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(dir)
    }

    fn next_path(&self) -> PathBuf {
        let stamp = time::timestamp_millis();
        let mut path = self.dir.join(format!("annotation-{stamp}.png"));
        let mut n = 1;
        while path.exists() {
            path = self.dir.join(format!("annotation-{stamp}-{n}.png"));
            n += 1;
        }
        path
    }
}

impl ExportSink for FileExportSink {
    fn save_raster(&self, raster: &ExportedRaster, overwrite_path: Option<&Path>) -> std::io::Result<PathBuf> {
        let path = match overwrite_path {
            Some(path) => path.to_path_buf(),
            None => {
                fs::create_dir_all(&self.dir)?;
                self.next_path()
            }
        };
        fs::write(&path, raster.png())?;
        debug!("Wrote {}x{} export to {}", raster.width(), raster.height(), path.display());
        Ok(path)
    }
}

/// System font lookup used by the text style picker and the text rasterizer
pub trait FontProvider: Send + Sync {
    fn list_fonts(&self) -> Vec<String>;

    /// Raw TrueType/OpenType bytes for a family name
    fn load_font(&self, family: &str) -> Option<Vec<u8>>;
}

/// Fonts found by scanning directories for `.ttf` / `.otf` files.
///
/// The family name is the file stem, so `DejaVuSans.ttf` answers to
/// "DejaVuSans".
#[derive(Debug, Clone, Default)]
pub struct DirectoryFonts {
    dirs: Vec<PathBuf>,
}

impl DirectoryFonts {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    /// The usual font directories of the current platform
    pub fn system() -> Self {
        let mut dirs = Vec::new();
        if cfg!(target_os = "windows") {
            if let Some(windir) = std::env::var_os("WINDIR") {
                dirs.push(PathBuf::from(windir).join("Fonts"));
            }
        } else if cfg!(target_os = "macos") {
            dirs.push(PathBuf::from("/System/Library/Fonts"));
            dirs.push(PathBuf::from("/Library/Fonts"));
        } else {
            dirs.push(PathBuf::from("/usr/share/fonts"));
            dirs.push(PathBuf::from("/usr/local/share/fonts"));
        }
        if let Some(home) = std::env::var_os("HOME") {
            dirs.push(PathBuf::from(home).join(".fonts"));
        }
        Self::new(dirs)
    }

    fn font_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        let mut pending: Vec<PathBuf> = self.dirs.clone();
        while let Some(dir) = pending.pop() {
            let Ok(entries) = fs::read_dir(&dir) else {
                continue;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    pending.push(path);
                } else if is_font_file(&path) {
                    files.push(path);
                }
            }
        }
        files.sort();
        files
    }
}

fn is_font_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("ttf") || ext.eq_ignore_ascii_case("otf"))
}

fn family_of(path: &Path) -> Option<String> {
    path.file_stem().and_then(|s| s.to_str()).map(str::to_owned)
}

impl FontProvider for DirectoryFonts {
    fn list_fonts(&self) -> Vec<String> {
        let mut names: Vec<String> = self.font_files().iter().filter_map(|p| family_of(p)).collect();
        names.dedup();
        names
    }

    fn load_font(&self, family: &str) -> Option<Vec<u8>> {
        let files = self.font_files();
        let wanted = family.to_ascii_lowercase();
        let matches = |p: &PathBuf| {
            family_of(p).is_some_and(|name| {
                let name = name.to_ascii_lowercase();
                name == wanted || name == format!("{wanted}-regular")
            })
        };
        let path = files.iter().find(|p| matches(p))?;
        match fs::read(path) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!("Failed to read font {}: {e}", path.display());
                None
            }
        }
    }
}

/// What sits behind the annotations
#[derive(Clone, Debug)]
pub enum Background {
    /// Live screen behind the overlay, captured through the capture provider
    Screen { scale_factor: f32 },
    /// An opened image letterboxed into the canvas
    Image { image: Arc<RgbaImage>, fit: ImageFit },
}

impl Background {
    pub fn image(image: RgbaImage, canvas_size: Vec2) -> Self {
        let fit = ImageFit::contain(image.width(), image.height(), canvas_size);
        Background::Image { image: Arc::new(image), fit }
    }
}

/// Uniform "contain" letterbox fit of a source image into the canvas.
///
/// Only uniform scaling is supported; the transform is one scale plus an offset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImageFit {
    pub scale: f32,
    pub offset: Vec2,
    pub original_width: u32,
    pub original_height: u32,
}

impl ImageFit {
    /// Fit `width` x `height` inside `canvas`, centered. Images are never upscaled.
    pub fn contain(width: u32, height: u32, canvas: Vec2) -> Self {
        let (w, h) = (width.max(1) as f32, height.max(1) as f32);
        let scale = (canvas.x / w).min(canvas.y / h).min(1.0);
        let offset = vec2((canvas.x - w * scale) / 2.0, (canvas.y - h * scale) / 2.0);
        Self {
            scale,
            offset,
            original_width: width,
            original_height: height,
        }
    }

    /// Where the image is shown on the canvas
    pub fn display_rect(&self) -> Rect {
        Rect::from_min_size(
            self.offset.to_pos2(),
            vec2(self.original_width as f32, self.original_height as f32) * self.scale,
        )
    }

    pub fn to_display(&self, p: Pos2) -> Pos2 {
        pos2(p.x * self.scale, p.y * self.scale) + self.offset
    }

    pub fn to_original(&self, p: Pos2) -> Pos2 {
        let d = p - self.offset;
        pos2(d.x / self.scale, d.y / self.scale)
    }

    pub fn rect_to_original(&self, r: Rect) -> Rect {
        Rect::from_min_max(self.to_original(r.min), self.to_original(r.max))
    }
}
