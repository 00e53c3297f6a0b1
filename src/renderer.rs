use egui::epaint::{PathShape, PathStroke, TextShape};
use egui::{Align2, Color32, FontId, Mesh, Painter, Pos2, Rect, Shape, Stroke, TextureId, Vec2, pos2};
use log::warn;
use std::f32::consts::TAU;
use std::sync::Arc;

use crate::capture::Background;
use crate::element::{
    Badge, BlurPatch, Element, ElementType, LineElement, PathElement, Shape as ShapeElement, ShapeKind, TextAlign,
    TextElement, Transform,
};
use crate::geometry::{Handle, handle_positions};
use crate::overlay::{CropMask, SpotlightOverlay};
use crate::presets::{self, DashPattern};
use crate::raster::{Compositor, FontCache};
use crate::state::EditorContext;
use crate::texture_manager::{BACKGROUND_KEY, TextureGenerationError, TextureKey, TextureManager, color_image};

const ELLIPSE_SEGMENTS: usize = 64;
const CORNER_SEGMENTS: usize = 8;
const HANDLE_RADIUS: f32 = 5.0;
const SELECTION_COLOR: Color32 = Color32::from_rgb(0, 120, 215);
const TEXTURE_CACHE_SIZE: usize = 64;

/// Draws the live canvas with an egui painter.
///
/// Vector objects become egui shapes every frame. Raster-backed objects
/// (blur patches, the spotlight overlay and the background image) are
/// uploaded once and cached as textures.
pub struct Renderer {
    textures: TextureManager,
    ctx: egui::Context,
}

impl Renderer {
    pub fn new(ctx: &egui::Context) -> Self {
        Self {
            textures: TextureManager::new(TEXTURE_CACHE_SIZE),
            ctx: ctx.clone(),
        }
    }

    /// Forget the cached background, e.g. after opening another image
    pub fn background_changed(&mut self) {
        self.textures.invalidate(TextureKey::Named(BACKGROUND_KEY));
    }

    /// Paint the canvas with its top-left corner at `origin` (screen points)
    pub fn render(&mut self, painter: &Painter, origin: Vec2, editor: &EditorContext) {
        self.textures.begin_frame();
        let view = View { painter, origin };

        if let Background::Image { image, fit } = editor.background() {
            let generated = self.textures.get_or_create_texture(
                TextureKey::Named(BACKGROUND_KEY),
                || color_image(image),
                &self.ctx,
            );
            match generated {
                Ok(texture) => view.image(texture, fit.display_rect()),
                Err(e) => warn!("Background texture failed: {e}"),
            }
        }

        let scene = editor.scene();
        for element in scene.iter().filter(|e| !matches!(e, ElementType::CropMask(_))) {
            self.draw_element(&view, element, editor.canvas());
        }
        if let Some(mask) = scene.crop_mask() {
            draw_crop_mask(&view, mask);
        }

        if let Some(preview) = editor.preview() {
            self.draw_element(&view, preview, editor.canvas());
        }

        if let Some(element) = editor.selected_element() {
            draw_selection(&view, element);
        }
        if let Some(ElementType::Text(text)) = editor.editing_text().and_then(|id| scene.get(id)) {
            draw_caret(&view, text);
        }
    }

    fn draw_element(&mut self, view: &View<'_>, element: &ElementType, canvas: Rect) {
        match element {
            ElementType::Shape(shape) => draw_shape(view, shape),
            ElementType::Line(line) => draw_line(view, line),
            ElementType::Path(path) => draw_path(view, path),
            ElementType::Text(text) => draw_text(view, text),
            ElementType::Badge(badge) => draw_badge(view, badge),
            ElementType::Blur(blur) => self.draw_blur(view, blur),
            ElementType::SpotlightOverlay(overlay) => self.draw_spotlight(view, overlay, canvas),
            ElementType::CropMask(mask) => draw_crop_mask(view, mask),
        }
    }

    fn draw_blur(&mut self, view: &View<'_>, blur: &BlurPatch) {
        let generated = self.textures.get_or_create_texture(
            blur.image_key,
            || {
                let image = blur.image.to_rgba_image().ok_or(TextureGenerationError::InvalidDimensions)?;
                color_image(&image)
            },
            &self.ctx,
        );
        match generated {
            Ok(texture) => view.transformed_image(texture, blur.rect, &blur.transform),
            Err(e) => warn!("Blur texture for {} failed: {e}", blur.id),
        }
    }

    /// The overlay is rasterized once per regeneration; holes need real
    /// punch-outs, which egui shapes cannot express.
    fn draw_spotlight(&mut self, view: &View<'_>, overlay: &SpotlightOverlay, canvas: Rect) {
        let generated = self.textures.get_or_create_texture(
            overlay.id,
            || {
                let (w, h) = (canvas.width().round() as u32, canvas.height().round() as u32);
                let mut compositor = Compositor::new(w, h, tiny_skia::Transform::identity(), FontCache::new(None))
                    .ok_or(TextureGenerationError::InvalidDimensions)?;
                compositor.draw_element(&ElementType::SpotlightOverlay(overlay.clone()));
                color_image(&compositor.finish())
            },
            &self.ctx,
        );
        match generated {
            Ok(texture) => view.image(texture, canvas),
            Err(e) => warn!("Spotlight texture failed: {e}"),
        }
    }
}

/// Painter plus the canvas-to-screen offset
struct View<'a> {
    painter: &'a Painter,
    origin: Vec2,
}

impl View<'_> {
    fn to_screen(&self, p: Pos2) -> Pos2 {
        p + self.origin
    }

    fn image(&self, texture: TextureId, rect: Rect) {
        let uv = Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0));
        self.painter.image(texture, rect.translate(self.origin), uv, Color32::WHITE);
    }

    /// Texture quad following the element's rotation and mirroring
    fn transformed_image(&self, texture: TextureId, rect: Rect, transform: &Transform) {
        let c = rect.center();
        let corners = [rect.left_top(), rect.right_top(), rect.right_bottom(), rect.left_bottom()];
        let uvs = [pos2(0.0, 0.0), pos2(1.0, 0.0), pos2(1.0, 1.0), pos2(0.0, 1.0)];
        let mut mesh = Mesh::with_texture(texture);
        for (corner, uv) in corners.into_iter().zip(uvs) {
            mesh.vertices.push(egui::epaint::Vertex {
                pos: self.to_screen(transform.to_world(corner, c)),
                uv,
                color: Color32::WHITE,
            });
        }
        mesh.add_triangle(0, 1, 2);
        mesh.add_triangle(0, 2, 3);
        self.painter.add(Shape::mesh(mesh));
    }

    /// Polyline with an optional dash pattern
    fn outline(&self, points: Vec<Pos2>, closed: bool, stroke: Stroke, dash: DashPattern) {
        if points.len() < 2 || stroke.width <= 0.0 {
            return;
        }
        let dashes = dash.dash_array(stroke.width);
        if let [dash_len, gap_len, ..] = dashes[..] {
            let mut points = points;
            if closed {
                points.push(points[0]);
            }
            self.painter.extend(Shape::dashed_line(&points, stroke, dash_len, gap_len));
        } else if closed {
            self.painter.add(PathShape::closed_line(points, stroke));
        } else {
            self.painter.add(PathShape::line(points, stroke));
        }
    }
}

fn faded(color: Color32, opacity: f32) -> Color32 {
    color.gamma_multiply(opacity.clamp(0.0, 1.0))
}

/// Outline of a shape in its own unrotated frame
fn shape_outline(shape: &ShapeElement) -> Vec<Pos2> {
    let rect = shape.rect;
    match shape.kind {
        ShapeKind::Ellipse => {
            let (c, r) = (rect.center(), rect.size() / 2.0);
            (0..ELLIPSE_SEGMENTS)
                .map(|i| {
                    let t = i as f32 / ELLIPSE_SEGMENTS as f32 * TAU;
                    pos2(c.x + r.x * t.cos(), c.y + r.y * t.sin())
                })
                .collect()
        }
        ShapeKind::Rectangle => {
            let radius = shape.effective_corner_radius();
            if radius <= 0.0 {
                return vec![rect.left_top(), rect.right_top(), rect.right_bottom(), rect.left_bottom()];
            }
            // Arc centers clockwise from top-left, each with its start angle
            let arcs = [
                (pos2(rect.min.x + radius, rect.min.y + radius), 0.5 * TAU),
                (pos2(rect.max.x - radius, rect.min.y + radius), 0.75 * TAU),
                (pos2(rect.max.x - radius, rect.max.y - radius), 0.0),
                (pos2(rect.min.x + radius, rect.max.y - radius), 0.25 * TAU),
            ];
            arcs.iter()
                .flat_map(|&(center, start)| {
                    (0..=CORNER_SEGMENTS).map(move |i| {
                        let t = start + i as f32 / CORNER_SEGMENTS as f32 * 0.25 * TAU;
                        center + Vec2::angled(t) * radius
                    })
                })
                .collect()
        }
    }
}

fn draw_shape(view: &View<'_>, shape: &ShapeElement) {
    let c = shape.rect.center();
    let points: Vec<Pos2> = shape_outline(shape)
        .into_iter()
        .map(|p| view.to_screen(shape.transform.to_world(p, c)))
        .collect();
    let style = &shape.style;
    if let Some(fill) = style.fill {
        view.painter
            .add(Shape::convex_polygon(points.clone(), faded(fill, style.opacity), Stroke::NONE));
    }
    let stroke = Stroke::new(style.stroke_width, faded(style.stroke, style.opacity));
    view.outline(points, true, stroke, style.dash);
}

fn draw_line(view: &View<'_>, line: &LineElement) {
    let c = line.rect().center();
    let world = |p: Pos2| view.to_screen(line.transform.to_world(p, c));
    let style = &line.style;
    let color = faded(style.stroke, style.opacity);
    let stroke = Stroke::new(style.stroke_width, color);
    view.outline(vec![world(line.start), world(line.end)], false, stroke, style.dash);

    let (Some(head), Some(arrow)) = (line.head(), line.arrow) else {
        return;
    };
    let [tip, left, right] = head.map(world);
    if arrow.preset().filled {
        view.painter.add(Shape::convex_polygon(vec![tip, left, right], color, Stroke::NONE));
    } else {
        view.painter.add(PathShape::line(vec![left, tip, right], stroke));
    }
}

fn draw_path(view: &View<'_>, path: &PathElement) {
    let c = path.rect().center();
    let color = faded(path.color, path.opacity);
    let points: Vec<Pos2> = path
        .points
        .iter()
        .map(|p| view.to_screen(path.transform.to_world(*p, c)))
        .collect();
    match points.as_slice() {
        [] => {}
        [single] => {
            view.painter.circle_filled(*single, path.width / 2.0, color);
        }
        _ => {
            view.painter.add(PathShape {
                points,
                closed: false,
                fill: Color32::TRANSPARENT,
                stroke: PathStroke::new(path.width, color),
            });
        }
    }
}

fn draw_text(view: &View<'_>, text: &TextElement) {
    let rect = text.rect();
    let c = rect.center();
    let font = FontId::proportional(text.font.size);
    let color = faded(text.color, text.opacity);
    let angle = text.transform.rotation.to_radians();

    let galleys: Vec<Arc<egui::Galley>> = text
        .lines()
        .map(|line| view.painter.layout_no_wrap(line.to_owned(), font.clone(), color))
        .collect();
    let block_width = galleys.iter().map(|g| g.size().x).fold(0.0_f32, f32::max);

    for (i, galley) in galleys.into_iter().enumerate() {
        let slack = block_width - galley.size().x;
        let dx = match text.font.align {
            TextAlign::Left => 0.0,
            TextAlign::Center => slack / 2.0,
            TextAlign::Right => slack,
        };
        let local = text.position + Vec2::new(dx, i as f32 * text.line_advance());
        let anchor = view.to_screen(text.transform.to_world(local, c));
        if let Some(shadow) = &text.shadow {
            let shadow_color = faded(shadow.color, text.opacity);
            view.painter.add(
                TextShape::new(anchor + shadow.offset, galley.clone(), shadow_color)
                    .with_override_text_color(shadow_color)
                    .with_angle(angle),
            );
        }
        view.painter.add(TextShape::new(anchor, galley, color).with_angle(angle));
    }
}

fn draw_caret(view: &View<'_>, text: &TextElement) {
    let last = text.lines().last().unwrap_or_default();
    let rows = text.lines().count().max(1) as f32 - 1.0;
    let font = FontId::proportional(text.font.size);
    let width = view.painter.layout_no_wrap(last.to_owned(), font, text.color).size().x;
    let top = text.position + Vec2::new(width + 1.0, rows * text.line_advance());
    let c = text.rect().center();
    let a = view.to_screen(text.transform.to_world(top, c));
    let b = view.to_screen(text.transform.to_world(top + Vec2::new(0.0, text.font.size), c));
    view.painter.line_segment([a, b], Stroke::new(1.5, text.color));
}

fn draw_badge(view: &View<'_>, badge: &Badge) {
    let center = view.to_screen(badge.center);
    view.painter.circle_filled(center, badge.radius, badge.fill);
    view.painter.text(
        center,
        Align2::CENTER_CENTER,
        badge.label(),
        FontId::proportional(badge.radius * 1.1),
        badge.text_color,
    );
}

fn draw_crop_mask(view: &View<'_>, mask: &CropMask) {
    if !mask.visible {
        return;
    }
    for panel in &mask.panels {
        if panel.is_positive() {
            view.painter.rect_filled(panel.translate(view.origin), 0.0, mask.dim);
        }
    }
    let b = mask.border.translate(view.origin);
    let stroke = Stroke::new(presets::CROP_BORDER_WIDTH, presets::CROP_BORDER_COLOR);
    view.outline(
        vec![b.left_top(), b.right_top(), b.right_bottom(), b.left_bottom()],
        true,
        stroke,
        DashPattern::Dashed,
    );
}

fn draw_selection(view: &View<'_>, element: &ElementType) {
    let rect = element.rect();
    let rotation = element.rotation();
    let handles = handle_positions(rect, rotation).map(|(handle, p)| (handle, view.to_screen(p)));
    let stroke = Stroke::new(1.0, SELECTION_COLOR);

    let corners: Vec<Pos2> = crate::element::rotated_corners(rect, rotation)
        .into_iter()
        .map(|p| view.to_screen(p))
        .collect();
    let top_mid = corners[0].lerp(corners[1], 0.5);
    view.painter.add(PathShape::closed_line(corners, stroke));

    for (handle, p) in handles {
        if handle == Handle::Rotate {
            view.painter.line_segment([top_mid, p], stroke);
        }
        view.painter.circle(p, HANDLE_RADIUS, Color32::WHITE, stroke);
    }
}
