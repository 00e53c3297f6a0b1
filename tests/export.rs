use annotation_overlay::capture::{Background, CaptureProvider, ExportSink, FrameCapture, NoCapture};
use annotation_overlay::command::Command;
use annotation_overlay::element::{BlurPatch, Element, ElementType};
use annotation_overlay::export::{ExportError, ExportOptions, ExportedRaster};
use annotation_overlay::overlay::CropRect;
use annotation_overlay::presets::{BLUR_PLACEHOLDER, BlurStyle};
use annotation_overlay::state::{EditorContext, MemorySessionStore, ToolConfig};
use annotation_overlay::tools::ToolKind;
use egui::{Modifiers, Pos2, Rect, pos2, vec2};
use futures::executor::block_on;
use futures::future::BoxFuture;
use image::{Rgba, RgbaImage};
use parking_lot::Mutex;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Keeps exported PNGs in memory
#[derive(Default)]
struct MemorySink {
    saved: Mutex<Vec<RgbaImage>>,
    fail: bool,
}

impl MemorySink {
    fn failing() -> Self {
        Self { fail: true, ..Default::default() }
    }

    fn last(&self) -> RgbaImage {
        self.saved.lock().last().cloned().expect("nothing exported")
    }
}

impl ExportSink for MemorySink {
    fn save_raster(&self, raster: &ExportedRaster, overwrite_path: Option<&Path>) -> io::Result<PathBuf> {
        if self.fail {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"));
        }
        let decoded = image::load_from_memory(raster.png()).map_err(io::Error::other)?;
        self.saved.lock().push(decoded.to_rgba8());
        Ok(overwrite_path.map_or_else(|| PathBuf::from("memory.png"), Path::to_path_buf))
    }
}

/// Serves a fixed frame and remembers every region asked for
struct RecordingCapture {
    frame: FrameCapture,
    regions: Mutex<Vec<(u32, u32, u32, u32)>>,
}

impl RecordingCapture {
    fn new(frame: RgbaImage) -> Self {
        Self {
            frame: FrameCapture::new(frame),
            regions: Mutex::new(Vec::new()),
        }
    }
}

impl CaptureProvider for RecordingCapture {
    fn capture_full_background(&self) -> BoxFuture<'_, Option<RgbaImage>> {
        self.frame.capture_full_background()
    }

    fn capture_region(&self, x: u32, y: u32, width: u32, height: u32) -> BoxFuture<'_, Option<RgbaImage>> {
        self.regions.lock().push((x, y, width, height));
        self.frame.capture_region(x, y, width, height)
    }
}

const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);

fn editor() -> EditorContext {
    EditorContext::new(vec2(800.0, 600.0), ToolConfig::default(), Arc::new(MemorySessionStore::new()))
}

fn screen_editor() -> EditorContext {
    editor().with_capture(Arc::new(FrameCapture::new(RgbaImage::from_pixel(800, 600, BLUE))))
}

fn drag(editor: &mut EditorContext, from: Pos2, to: Pos2) {
    editor.pointer_down(from, Modifiers::default()).unwrap();
    editor.pointer_move(to, Modifiers::default()).unwrap();
    editor.pointer_up(to, Modifiers::default()).unwrap();
}

/// Mosaic at the lowest intensity keeps flat regions exactly flat
fn exact_mosaic(editor: &mut EditorContext) {
    editor.config_mut().blur_style = BlurStyle::Mosaic;
    editor.config_mut().blur_intensity = 1;
}

fn only_blur(editor: &EditorContext) -> &BlurPatch {
    match editor.scene().iter().find(|e| matches!(e, ElementType::Blur(_))) {
        Some(ElementType::Blur(blur)) => blur,
        _ => panic!("expected a blur patch"),
    }
}

#[test]
fn test_export_is_cropped_to_crop_rect() {
    let mut editor = screen_editor();
    editor.execute(Command::SetCrop(CropRect::new(10.0, 10.0, 100.0, 50.0))).unwrap();
    let sink = MemorySink::default();

    let outcome = block_on(editor.export(&sink, ExportOptions::default())).unwrap();

    assert_eq!((outcome.width, outcome.height), (100, 50));
    let image = sink.last();
    assert_eq!(image.dimensions(), (100, 50));
    // The crop mask itself is hidden during rasterization
    assert_eq!(*image.get_pixel(50, 25), BLUE);
}

#[test]
fn test_export_resets_canvas() {
    let mut editor = screen_editor();
    editor.set_tool(ToolKind::Badge);
    editor.pointer_down(pos2(50.0, 50.0), Modifiers::default()).unwrap();
    editor.execute(Command::SetCrop(CropRect::new(10.0, 10.0, 100.0, 50.0))).unwrap();

    block_on(editor.export(&MemorySink::default(), ExportOptions::default())).unwrap();

    assert!(editor.scene().is_empty());
    assert_eq!(editor.crop(), None);
    assert_eq!(editor.history().len(), 1);
    assert_eq!(editor.next_badge_number(), 1);
}

#[test]
fn test_failed_export_keeps_canvas() {
    let mut editor = screen_editor();
    editor.execute(Command::SetCrop(CropRect::new(10.0, 10.0, 100.0, 50.0))).unwrap();

    let result = block_on(editor.export(&MemorySink::failing(), ExportOptions::default()));

    assert!(matches!(result, Err(ExportError::Sink(_))));
    assert!(editor.scene().crop_mask().unwrap().visible);
    assert_eq!(editor.history().len(), 2);
}

#[test]
fn test_export_without_background_is_transparent() {
    let mut editor = screen_editor();
    let sink = MemorySink::default();
    let options = ExportOptions { include_background: false, ..Default::default() };

    block_on(editor.export(&sink, options)).unwrap();

    let image = sink.last();
    assert_eq!(image.dimensions(), (800, 600));
    assert_eq!(image.get_pixel(400, 300)[3], 0);
}

#[test]
fn test_missing_capture_exports_on_transparent() {
    let mut editor = editor().with_capture(Arc::new(NoCapture));
    let sink = MemorySink::default();
    block_on(editor.export(&sink, ExportOptions::default())).unwrap();
    assert_eq!(sink.last().get_pixel(0, 0)[3], 0);
}

#[test]
fn test_pixel_ratio_scales_output() {
    let mut editor = screen_editor();
    let sink = MemorySink::default();
    let options = ExportOptions { pixel_ratio: 2.0, ..Default::default() };
    let outcome = block_on(editor.export(&sink, options)).unwrap();
    assert_eq!((outcome.width, outcome.height), (1600, 1200));
}

#[test]
fn test_image_mode_exports_original_resolution() {
    let mut editor = editor();
    editor.open_image(RgbaImage::from_pixel(1600, 1200, BLUE));
    let sink = MemorySink::default();

    let outcome = block_on(editor.export(&sink, ExportOptions::default())).unwrap();

    assert_eq!((outcome.width, outcome.height), (1600, 1200));
    assert_eq!(*sink.last().get_pixel(1599, 1199), BLUE);
}

#[test]
fn test_image_mode_crop_maps_to_original_pixels() {
    let mut editor = editor();
    editor.open_image(RgbaImage::from_pixel(1600, 1200, BLUE));
    // Canvas 800x600 shows the image at half scale
    editor.execute(Command::SetCrop(CropRect::new(100.0, 100.0, 200.0, 100.0))).unwrap();

    let outcome = block_on(editor.export(&MemorySink::default(), ExportOptions::default())).unwrap();
    assert_eq!((outcome.width, outcome.height), (400, 200));
}

#[test]
fn test_overwrite_path_is_passed_to_sink() {
    let mut editor = screen_editor();
    let options = ExportOptions {
        overwrite_path: Some(PathBuf::from("/tmp/shot.png")),
        ..Default::default()
    };
    let outcome = block_on(editor.export(&MemorySink::default(), options)).unwrap();
    assert_eq!(outcome.path, PathBuf::from("/tmp/shot.png"));
}

#[test]
fn test_blur_capture_adds_patch() {
    let mut editor = screen_editor();
    editor.set_tool(ToolKind::Blur);
    drag(&mut editor, pos2(10.0, 10.0), pos2(60.0, 40.0));
    assert!(editor.has_pending_captures());
    assert!(editor.scene().is_empty());

    assert_eq!(block_on(editor.process_pending_captures()), 1);

    let Some(ElementType::Blur(blur)) = editor.scene().iter().next() else {
        panic!("expected a blur patch");
    };
    assert_eq!((blur.image.width(), blur.image.height()), (50, 30));
    assert_eq!(editor.history().len(), 2);
    assert!(!editor.has_pending_captures());
}

#[test]
fn test_failed_blur_capture_uses_placeholder() {
    let mut editor = editor();
    editor.set_tool(ToolKind::Blur);
    drag(&mut editor, pos2(10.0, 10.0), pos2(60.0, 40.0));

    assert_eq!(block_on(editor.process_pending_captures()), 1);

    let Some(ElementType::Blur(blur)) = editor.scene().iter().next() else {
        panic!("expected a blur patch");
    };
    let image = blur.image.to_rgba_image().unwrap();
    assert_eq!(*image.get_pixel(0, 0), Rgba(BLUR_PLACEHOLDER));
}

#[test]
fn test_blur_drag_off_canvas_is_clipped() {
    let mut editor = screen_editor();
    editor.set_tool(ToolKind::Blur);
    drag(&mut editor, pos2(-40.0, -40.0), pos2(60.0, 60.0));

    assert_eq!(block_on(editor.process_pending_captures()), 1);

    let blur = only_blur(&editor);
    assert_eq!(blur.rect, Rect::from_min_max(pos2(0.0, 0.0), pos2(60.0, 60.0)));
    assert_eq!((blur.image.width(), blur.image.height()), (60, 60));
}

#[test]
fn test_image_mode_blur_reads_original_pixels() {
    // Green block at original (200,100)-(400,200), red everywhere else
    let image = RgbaImage::from_fn(1600, 1200, |x, y| {
        if (200..400).contains(&x) && (100..200).contains(&y) { GREEN } else { RED }
    });
    let mut editor = editor();
    editor.open_image(image);
    exact_mosaic(&mut editor);
    editor.set_tool(ToolKind::Blur);
    // Half scale: canvas (100,50)-(200,100) covers exactly the green block
    drag(&mut editor, pos2(100.0, 50.0), pos2(200.0, 100.0));

    assert_eq!(block_on(editor.process_pending_captures()), 1);

    let blur = only_blur(&editor);
    assert_eq!((blur.image.width(), blur.image.height()), (200, 100));
    let pixels = blur.image.to_rgba_image().unwrap();
    assert!(pixels.pixels().all(|p| *p == GREEN));
}

#[test]
fn test_image_mode_blur_is_clipped_to_letterbox() {
    // 1600x600 on 800x600 shows at half scale between y=150 and y=450
    let mut editor = editor();
    editor.open_image(RgbaImage::from_pixel(1600, 600, BLUE));
    editor.set_tool(ToolKind::Blur);
    drag(&mut editor, pos2(100.0, 100.0), pos2(200.0, 200.0));

    block_on(editor.process_pending_captures());

    let blur = only_blur(&editor);
    assert_eq!(blur.rect, Rect::from_min_max(pos2(100.0, 150.0), pos2(200.0, 200.0)));
    assert_eq!((blur.image.width(), blur.image.height()), (200, 100));
}

#[test]
fn test_screen_blur_requests_physical_pixels() {
    let capture = Arc::new(RecordingCapture::new(RgbaImage::from_pixel(1600, 1200, BLUE)));
    let mut editor = editor().with_capture(capture.clone());
    editor.set_background(Background::Screen { scale_factor: 2.0 });
    editor.set_tool(ToolKind::Blur);
    drag(&mut editor, pos2(10.0, 20.0), pos2(60.0, 50.0));

    block_on(editor.process_pending_captures());

    assert_eq!(*capture.regions.lock(), vec![(20, 40, 100, 60)]);
    let blur = only_blur(&editor);
    assert_eq!(blur.rect, Rect::from_min_max(pos2(10.0, 20.0), pos2(60.0, 50.0)));
    assert_eq!((blur.image.width(), blur.image.height()), (100, 60));
}

#[test]
fn test_scale_factor_follows_display_in_screen_mode_only() {
    let capture = Arc::new(RecordingCapture::new(RgbaImage::from_pixel(1600, 1200, BLUE)));
    let mut editor = editor().with_capture(capture.clone());
    editor.set_scale_factor(2.0);
    editor.set_tool(ToolKind::Blur);
    drag(&mut editor, pos2(0.0, 0.0), pos2(50.0, 50.0));
    block_on(editor.process_pending_captures());
    assert_eq!(*capture.regions.lock(), vec![(0, 0, 100, 100)]);

    // Image mode reads the opened image, never the screen
    editor.open_image(RgbaImage::from_pixel(800, 600, BLUE));
    editor.set_scale_factor(3.0);
    assert!(matches!(editor.background(), Background::Image { .. }));
    drag(&mut editor, pos2(100.0, 100.0), pos2(150.0, 150.0));
    block_on(editor.process_pending_captures());
    assert_eq!(capture.regions.lock().len(), 1);
}

#[test]
fn test_apply_style_recomputes_selected_blur_in_place() {
    let mut editor = screen_editor();
    editor.set_tool(ToolKind::Blur);
    drag(&mut editor, pos2(10.0, 10.0), pos2(60.0, 40.0));
    block_on(editor.process_pending_captures());
    editor.set_tool(ToolKind::Rectangle);
    drag(&mut editor, pos2(200.0, 200.0), pos2(300.0, 300.0));
    let id = only_blur(&editor).id();
    assert_eq!(editor.history().len(), 3);

    editor.execute(Command::Select(Some(id))).unwrap();
    editor.config_mut().blur_style = BlurStyle::Mosaic;
    editor.config_mut().blur_intensity = 80;
    editor.execute(Command::ApplyStyle).unwrap();
    assert!(editor.has_pending_captures());

    assert_eq!(block_on(editor.process_pending_captures()), 1);

    let ids: Vec<_> = editor.scene().iter().map(|e| e.id()).collect();
    assert_eq!(ids.len(), 2);
    assert_eq!(ids[0], id);
    let blur = only_blur(&editor);
    assert_eq!((blur.style, blur.intensity), (BlurStyle::Mosaic, 80));
    assert_eq!(editor.history().len(), 4);

    editor.execute(Command::Undo).unwrap();
    let blur = only_blur(&editor);
    assert_eq!(blur.id(), id);
    assert_eq!(blur.style, BlurStyle::Gaussian);
}
