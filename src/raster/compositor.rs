use egui::{Pos2, Rect};
use image::RgbaImage;
use log::warn;
use tiny_skia::{
    BlendMode, FillRule, FilterQuality, LineCap, LineJoin, Path, PathBuilder, Pixmap, PixmapPaint, Stroke,
    StrokeDash, Transform,
};

use super::text::{self, FontCache};
use super::{image_to_pixmap, paint, pixmap_to_image};
use crate::element::{
    Badge, BlurPatch, Element, ElementType, LineElement, PathElement, Shape, ShapeKind, TextElement, TextFont,
};
use crate::overlay::{CropMask, SpotlightHole, SpotlightOverlay};
use crate::presets::{self, DashPattern};
use crate::scene::Scene;

/// Cubic approximation constant for quarter circles
const KAPPA: f32 = 0.552_284_8;

/// Flattens a scene into an RGBA raster.
///
/// `view` maps canvas coordinates to output pixels, so the same scene can be
/// rendered at screen resolution, cropped, or at an opened image's original
/// resolution.
pub struct Compositor {
    pixmap: Pixmap,
    view: Transform,
    fonts: FontCache,
}

impl Compositor {
    pub fn new(width: u32, height: u32, view: Transform, fonts: FontCache) -> Option<Self> {
        Some(Self {
            pixmap: Pixmap::new(width, height)?,
            view,
            fonts,
        })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Draw `image` stretched over `dest` (canvas coordinates)
    pub fn draw_background(&mut self, image: &RgbaImage, dest: Rect) {
        self.draw_image(image, dest, 1.0, self.view);
    }

    /// Every object in z-order. Crop masks go last, over the annotations.
    pub fn draw_scene(&mut self, scene: &Scene) {
        for element in scene.iter().filter(|e| !matches!(e, ElementType::CropMask(_))) {
            self.draw_element(element);
        }
        if let Some(mask) = scene.crop_mask() {
            self.draw_crop_mask(mask);
        }
    }

    pub fn draw_element(&mut self, element: &ElementType) {
        let ts = match element.transform() {
            Some(t) if !t.is_identity() => self.view.pre_concat(element_transform(t, element.rect().center())),
            _ => self.view,
        };
        match element {
            ElementType::Shape(shape) => self.draw_shape(shape, ts),
            ElementType::Line(line) => self.draw_line(line, ts),
            ElementType::Text(text) => self.draw_text(text, ts),
            ElementType::Path(path) => self.draw_path(path, ts),
            ElementType::Badge(badge) => self.draw_badge(badge, ts),
            ElementType::Blur(patch) => self.draw_blur(patch, ts),
            ElementType::SpotlightOverlay(overlay) => self.draw_spotlight(overlay),
            ElementType::CropMask(mask) => self.draw_crop_mask(mask),
        }
    }

    pub fn finish(self) -> RgbaImage {
        pixmap_to_image(&self.pixmap)
    }

    fn draw_image(&mut self, image: &RgbaImage, dest: Rect, opacity: f32, ts: Transform) {
        let Some(source) = image_to_pixmap(image) else {
            return;
        };
        let sx = dest.width() / image.width() as f32;
        let sy = dest.height() / image.height() as f32;
        let ts = ts.pre_translate(dest.min.x, dest.min.y).pre_scale(sx, sy);
        let paint = PixmapPaint {
            opacity,
            blend_mode: BlendMode::SourceOver,
            quality: FilterQuality::Bilinear,
        };
        self.pixmap.draw_pixmap(0, 0, source.as_ref(), &paint, ts, None);
    }

    fn draw_shape(&mut self, shape: &Shape, ts: Transform) {
        let path = match shape.kind {
            ShapeKind::Rectangle => rounded_rect_path(shape.rect, shape.effective_corner_radius()),
            ShapeKind::Ellipse => to_skia_rect(shape.rect).and_then(PathBuilder::from_oval),
        };
        let Some(path) = path else {
            return;
        };
        let style = &shape.style;
        if let Some(fill) = style.fill {
            self.pixmap.fill_path(&path, &paint(fill, style.opacity), FillRule::Winding, ts, None);
        }
        let stroke = stroke(style.stroke_width, style.dash);
        self.pixmap.stroke_path(&path, &paint(style.stroke, style.opacity), &stroke, ts, None);
    }

    fn draw_line(&mut self, line: &LineElement, ts: Transform) {
        let style = &line.style;
        let color = paint(style.stroke, style.opacity);
        let mut shaft = PathBuilder::new();
        shaft.move_to(line.start.x, line.start.y);
        shaft.line_to(line.end.x, line.end.y);
        if let Some(path) = shaft.finish() {
            self.pixmap.stroke_path(&path, &color, &stroke(style.stroke_width, style.dash), ts, None);
        }

        let (Some(head_style), Some([tip, left, right])) = (line.arrow, line.head()) else {
            return;
        };
        let mut head = PathBuilder::new();
        head.move_to(left.x, left.y);
        head.line_to(tip.x, tip.y);
        head.line_to(right.x, right.y);
        let filled = head_style.preset().filled;
        if filled {
            head.close();
        }
        let Some(path) = head.finish() else {
            return;
        };
        if filled {
            self.pixmap.fill_path(&path, &color, FillRule::Winding, ts, None);
        }
        // Heads are always solid, whatever the shaft's dash
        self.pixmap.stroke_path(&path, &color, &stroke(style.stroke_width, DashPattern::Solid), ts, None);
    }

    fn draw_path(&mut self, path: &PathElement, ts: Transform) {
        let Some(first) = path.points.first() else {
            return;
        };
        let mut builder = PathBuilder::new();
        builder.move_to(first.x, first.y);
        if path.points.len() == 1 {
            // A click leaves a dot
            builder.line_to(first.x + 0.01, first.y);
        }
        for p in &path.points[1..] {
            builder.line_to(p.x, p.y);
        }
        let Some(skia_path) = builder.finish() else {
            return;
        };
        let stroke = Stroke {
            width: path.width,
            line_cap: if path.marker { LineCap::Square } else { LineCap::Round },
            line_join: LineJoin::Round,
            ..Stroke::default()
        };
        if path.marker {
            // Draw opaque into a layer and composite once, so overlapping
            // segments of one highlighter stroke don't stack up
            let Some(mut layer) = Pixmap::new(self.pixmap.width(), self.pixmap.height()) else {
                return;
            };
            layer.stroke_path(&skia_path, &paint(path.color, 1.0), &stroke, ts, None);
            let paint = PixmapPaint {
                opacity: path.opacity.clamp(0.0, 1.0),
                ..PixmapPaint::default()
            };
            self.pixmap.draw_pixmap(0, 0, layer.as_ref(), &paint, Transform::identity(), None);
        } else {
            self.pixmap.stroke_path(&skia_path, &paint(path.color, path.opacity), &stroke, ts, None);
        }
    }

    fn draw_text(&mut self, text: &TextElement, ts: Transform) {
        match self.fonts.get(&text.font.family) {
            Some(font) => text::draw_text(&mut self.pixmap, text, &font, ts),
            None => warn!("Skipping text {}: no font for {}", text.id, text.font.family),
        }
    }

    fn draw_badge(&mut self, badge: &Badge, ts: Transform) {
        if let Some(circle) = PathBuilder::from_circle(badge.center.x, badge.center.y, badge.radius) {
            self.pixmap.fill_path(&circle, &paint(badge.fill, 1.0), FillRule::Winding, ts, None);
        }
        let font = TextFont {
            size: badge.radius * 1.2,
            weight: 700,
            ..TextFont::default()
        };
        let Some(face) = self.fonts.get(&font.family) else {
            return;
        };
        let label = TextElement::new(Pos2::ZERO, badge.label(), font, badge.text_color);
        let Some(path) = text::text_path(&label, &face) else {
            return;
        };
        // Center the glyph bounds on the badge
        let b = path.bounds();
        let dx = badge.center.x - (b.left() + b.right()) / 2.0;
        let dy = badge.center.y - (b.top() + b.bottom()) / 2.0;
        if let Some(path) = path.transform(Transform::from_translate(dx, dy)) {
            self.pixmap.fill_path(&path, &paint(badge.text_color, 1.0), FillRule::Winding, ts, None);
        }
    }

    fn draw_blur(&mut self, patch: &BlurPatch, ts: Transform) {
        match patch.image.to_rgba_image() {
            Some(image) => self.draw_image(&image, patch.rect, 1.0, ts),
            None => warn!("Blur patch {} has inconsistent pixel data", patch.id),
        }
    }

    fn draw_spotlight(&mut self, overlay: &SpotlightOverlay) {
        let Some(mut layer) = Pixmap::new(self.pixmap.width(), self.pixmap.height()) else {
            return;
        };
        if let Some(rect) = to_skia_rect(overlay.canvas) {
            layer.fill_rect(rect, &paint(overlay.tint, 1.0), self.view, None);
        }
        let mut clear = paint(egui::Color32::BLACK, 1.0);
        clear.blend_mode = BlendMode::Clear;
        for hole in &overlay.holes {
            if let Some(path) = hole_path(hole) {
                layer.fill_path(&path, &clear, FillRule::Winding, self.view, None);
            }
        }
        self.pixmap
            .draw_pixmap(0, 0, layer.as_ref(), &PixmapPaint::default(), Transform::identity(), None);
    }

    fn draw_crop_mask(&mut self, mask: &CropMask) {
        if !mask.visible {
            return;
        }
        let dim = paint(mask.dim, 1.0);
        for panel in mask.panels {
            if let Some(rect) = to_skia_rect(panel) {
                self.pixmap.fill_rect(rect, &dim, self.view, None);
            }
        }
        if let Some(rect) = to_skia_rect(mask.border) {
            let border = PathBuilder::from_rect(rect);
            let stroke = Stroke {
                width: presets::CROP_BORDER_WIDTH,
                dash: StrokeDash::new(mask.border_dash.clone(), 0.0),
                ..Stroke::default()
            };
            self.pixmap
                .stroke_path(&border, &paint(presets::CROP_BORDER_COLOR, 1.0), &stroke, self.view, None);
        }
    }
}

/// Flip then rotate around `center`, matching `Transform::to_world`
fn element_transform(t: &crate::element::Transform, center: Pos2) -> Transform {
    let sx = if t.flip_x { -1.0 } else { 1.0 };
    let sy = if t.flip_y { -1.0 } else { 1.0 };
    let flip = Transform::from_translate(center.x, center.y)
        .pre_scale(sx, sy)
        .pre_translate(-center.x, -center.y);
    Transform::from_rotate_at(t.rotation, center.x, center.y).pre_concat(flip)
}

fn to_skia_rect(rect: Rect) -> Option<tiny_skia::Rect> {
    tiny_skia::Rect::from_ltrb(rect.min.x, rect.min.y, rect.max.x, rect.max.y)
}

fn stroke(width: f32, dash: DashPattern) -> Stroke {
    Stroke {
        width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        dash: StrokeDash::new(dash.dash_array(width), 0.0),
        ..Stroke::default()
    }
}

fn rounded_rect_path(rect: Rect, radius: f32) -> Option<Path> {
    let r = radius.min(rect.width() / 2.0).min(rect.height() / 2.0);
    if r <= 0.0 {
        return to_skia_rect(rect).map(PathBuilder::from_rect);
    }
    let (l, t, rt, b) = (rect.min.x, rect.min.y, rect.max.x, rect.max.y);
    let k = r * KAPPA;
    let mut pb = PathBuilder::new();
    pb.move_to(l + r, t);
    pb.line_to(rt - r, t);
    pb.cubic_to(rt - r + k, t, rt, t + r - k, rt, t + r);
    pb.line_to(rt, b - r);
    pb.cubic_to(rt, b - r + k, rt - r + k, b, rt - r, b);
    pb.line_to(l + r, b);
    pb.cubic_to(l + r - k, b, l, b - r + k, l, b - r);
    pb.line_to(l, t + r);
    pb.cubic_to(l, t + r - k, l + r - k, t, l + r, t);
    pb.close();
    pb.finish()
}

fn hole_path(hole: &SpotlightHole) -> Option<Path> {
    match *hole {
        SpotlightHole::Circle { left, top, radius } => PathBuilder::from_circle(left + radius, top + radius, radius),
        SpotlightHole::Rect { corner_radius, .. } => rounded_rect_path(hole.bounds(), corner_radius),
    }
}
