use egui::{Color32, Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

mod common;
pub(crate) mod badge;
pub(crate) mod blur;
pub(crate) mod line;
pub(crate) mod path;
pub(crate) mod shape;
pub(crate) mod text;

pub use badge::Badge;
pub use blur::{BlurPatch, PatchImage};
pub use common::{MIN_ELEMENT_SIZE, rotate_point, rotated_corners};
pub use line::LineElement;
pub use path::PathElement;
pub use shape::{Shape, ShapeKind};
pub use text::{TextAlign, TextElement, TextFont, TextOutline, TextShadow};

use crate::error::ElementError;
use crate::overlay::{CropMask, SpotlightOverlay};
use crate::presets::DashPattern;
use crate::state::ToolConfig;

/// Stable opaque identity of a scene object.
///
/// Survives serialization, so selection and clipboard references stay valid
/// across undo/redo.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(Uuid);

impl ObjectId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Type tag of a scene object
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    Rectangle,
    Ellipse,
    Line,
    Arrow,
    Path,
    Marker,
    Text,
    Badge,
    Blur,
    SpotlightOverlay,
    CropMask,
}

/// Stroke and fill attributes shared by shapes and lines
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Style {
    pub stroke: Color32,
    pub stroke_width: f32,
    pub fill: Option<Color32>,
    pub opacity: f32,
    pub corner_radius: f32,
    pub dash: DashPattern,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            stroke: Color32::from_rgb(235, 64, 52),
            stroke_width: 3.0,
            fill: None,
            opacity: 1.0,
            corner_radius: 0.0,
            dash: DashPattern::Solid,
        }
    }
}

/// Rotation (degrees, clockwise) and mirroring, applied around the center of
/// the element's rect.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub rotation: f32,
    pub flip_x: bool,
    pub flip_y: bool,
}

impl Transform {
    pub fn is_identity(&self) -> bool {
        self.rotation == 0.0 && !self.flip_x && !self.flip_y
    }

    /// Map a point from element-local space (before flip and rotation) to the canvas.
    pub fn to_world(&self, pos: Pos2, center: Pos2) -> Pos2 {
        rotate_point(self.mirror(pos, center), center, self.rotation)
    }

    /// Inverse of [`Transform::to_world`].
    pub fn to_local(&self, pos: Pos2, center: Pos2) -> Pos2 {
        self.mirror(rotate_point(pos, center, -self.rotation), center)
    }

    fn mirror(&self, pos: Pos2, center: Pos2) -> Pos2 {
        Pos2::new(
            if self.flip_x { 2.0 * center.x - pos.x } else { pos.x },
            if self.flip_y { 2.0 * center.y - pos.y } else { pos.y },
        )
    }
}

/// Common trait for all element types in the scene
pub trait Element {
    /// Get the unique identifier for this element
    fn id(&self) -> ObjectId;

    /// Get the element's type tag
    fn kind(&self) -> ElementKind;

    /// Unrotated bounding rectangle in canvas coordinates
    fn rect(&self) -> Rect;

    /// Test if the element contains the given canvas position
    fn hit_test(&self, pos: Pos2) -> bool;

    /// Translate the element by the given delta
    fn translate(&mut self, delta: Vec2);

    /// Resize the element to the new rectangle
    fn resize(&mut self, new_rect: Rect) -> Result<(), ElementError>;
}

/// Every drawable object the scene can hold, plus the two derived overlays.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElementType {
    Shape(Shape),
    Line(LineElement),
    Text(TextElement),
    Path(PathElement),
    Badge(Badge),
    Blur(BlurPatch),
    SpotlightOverlay(SpotlightOverlay),
    CropMask(CropMask),
}

impl Element for ElementType {
    fn id(&self) -> ObjectId {
        match self {
            ElementType::Shape(e) => e.id(),
            ElementType::Line(e) => e.id(),
            ElementType::Text(e) => e.id(),
            ElementType::Path(e) => e.id(),
            ElementType::Badge(e) => e.id(),
            ElementType::Blur(e) => e.id(),
            ElementType::SpotlightOverlay(e) => e.id,
            ElementType::CropMask(e) => e.id,
        }
    }

    fn kind(&self) -> ElementKind {
        match self {
            ElementType::Shape(e) => e.kind(),
            ElementType::Line(e) => e.kind(),
            ElementType::Text(e) => e.kind(),
            ElementType::Path(e) => e.kind(),
            ElementType::Badge(e) => e.kind(),
            ElementType::Blur(e) => e.kind(),
            ElementType::SpotlightOverlay(_) => ElementKind::SpotlightOverlay,
            ElementType::CropMask(_) => ElementKind::CropMask,
        }
    }

    fn rect(&self) -> Rect {
        match self {
            ElementType::Shape(e) => e.rect(),
            ElementType::Line(e) => e.rect(),
            ElementType::Text(e) => e.rect(),
            ElementType::Path(e) => e.rect(),
            ElementType::Badge(e) => e.rect(),
            ElementType::Blur(e) => e.rect(),
            ElementType::SpotlightOverlay(e) => e.canvas,
            ElementType::CropMask(e) => e.canvas,
        }
    }

    fn hit_test(&self, pos: Pos2) -> bool {
        match self {
            ElementType::Shape(e) => e.hit_test(pos),
            ElementType::Line(e) => e.hit_test(pos),
            ElementType::Text(e) => e.hit_test(pos),
            ElementType::Path(e) => e.hit_test(pos),
            ElementType::Badge(e) => e.hit_test(pos),
            ElementType::Blur(e) => e.hit_test(pos),
            // Overlays are never picked
            ElementType::SpotlightOverlay(_) | ElementType::CropMask(_) => false,
        }
    }

    fn translate(&mut self, delta: Vec2) {
        match self {
            ElementType::Shape(e) => e.translate(delta),
            ElementType::Line(e) => e.translate(delta),
            ElementType::Text(e) => e.translate(delta),
            ElementType::Path(e) => e.translate(delta),
            ElementType::Badge(e) => e.translate(delta),
            ElementType::Blur(e) => e.translate(delta),
            ElementType::SpotlightOverlay(_) | ElementType::CropMask(_) => {}
        }
    }

    fn resize(&mut self, new_rect: Rect) -> Result<(), ElementError> {
        match self {
            ElementType::Shape(e) => e.resize(new_rect),
            ElementType::Line(e) => e.resize(new_rect),
            ElementType::Text(e) => e.resize(new_rect),
            ElementType::Path(e) => e.resize(new_rect),
            ElementType::Badge(e) => e.resize(new_rect),
            ElementType::Blur(e) => e.resize(new_rect),
            ElementType::SpotlightOverlay(_) | ElementType::CropMask(_) => Err(ElementError::Overlay),
        }
    }
}

impl ElementType {
    /// Derived overlays are protected from selection, deletion and transforms.
    pub fn is_overlay(&self) -> bool {
        matches!(self, ElementType::SpotlightOverlay(_) | ElementType::CropMask(_))
    }

    pub fn is_selectable(&self) -> bool {
        !self.is_overlay()
    }

    pub fn transform(&self) -> Option<&Transform> {
        match self {
            ElementType::Shape(e) => Some(&e.transform),
            ElementType::Line(e) => Some(&e.transform),
            ElementType::Text(e) => Some(&e.transform),
            ElementType::Path(e) => Some(&e.transform),
            ElementType::Badge(e) => Some(&e.transform),
            ElementType::Blur(e) => Some(&e.transform),
            ElementType::SpotlightOverlay(_) | ElementType::CropMask(_) => None,
        }
    }

    pub fn transform_mut(&mut self) -> Option<&mut Transform> {
        match self {
            ElementType::Shape(e) => Some(&mut e.transform),
            ElementType::Line(e) => Some(&mut e.transform),
            ElementType::Text(e) => Some(&mut e.transform),
            ElementType::Path(e) => Some(&mut e.transform),
            ElementType::Badge(e) => Some(&mut e.transform),
            ElementType::Blur(e) => Some(&mut e.transform),
            ElementType::SpotlightOverlay(_) | ElementType::CropMask(_) => None,
        }
    }

    /// Rotation in degrees, 0 for overlays
    pub fn rotation(&self) -> f32 {
        self.transform().map_or(0.0, |t| t.rotation)
    }

    fn set_id(&mut self, id: ObjectId) {
        match self {
            ElementType::Shape(e) => e.id = id,
            ElementType::Line(e) => e.id = id,
            ElementType::Text(e) => e.id = id,
            ElementType::Path(e) => e.id = id,
            ElementType::Badge(e) => e.id = id,
            ElementType::Blur(e) => e.id = id,
            ElementType::SpotlightOverlay(e) => e.id = id,
            ElementType::CropMask(e) => e.id = id,
        }
    }

    /// Copy of this element with a fresh id, shifted by `offset`.
    ///
    /// Overlays cannot be duplicated.
    pub fn duplicate(&self, offset: Vec2) -> Option<ElementType> {
        if self.is_overlay() {
            return None;
        }
        let mut copy = self.clone();
        copy.set_id(ObjectId::new());
        copy.translate(offset);
        Some(copy)
    }

    pub fn flip_horizontal(&mut self) {
        if let Some(t) = self.transform_mut() {
            t.flip_x = !t.flip_x;
        }
    }

    pub fn flip_vertical(&mut self) {
        if let Some(t) = self.transform_mut() {
            t.flip_y = !t.flip_y;
        }
    }

    pub fn rotate_by(&mut self, degrees: f32) {
        if let Some(t) = self.transform_mut() {
            t.rotation = common::normalize_degrees(t.rotation + degrees);
        }
    }

    pub fn set_rotation(&mut self, degrees: f32) {
        if let Some(t) = self.transform_mut() {
            t.rotation = common::normalize_degrees(degrees);
        }
    }

    /// Re-apply the current tool configuration to an existing element.
    pub fn apply_config(&mut self, config: &ToolConfig) {
        match self {
            ElementType::Shape(e) => e.style = config.shape_style(),
            ElementType::Line(e) => {
                e.style = config.line_style();
                if e.arrow.is_some() {
                    e.arrow = Some(config.arrow_style);
                }
            }
            ElementType::Text(e) => {
                e.color = config.color;
                e.font = config.font.clone();
                e.shadow = config.text_shadow.clone();
                e.outline = config.text_outline.clone();
            }
            ElementType::Path(e) => {
                e.color = config.color;
                if e.marker {
                    e.width = config.marker.width();
                    e.opacity = config.marker.opacity();
                } else {
                    e.width = config.stroke_width;
                }
            }
            ElementType::Badge(e) => e.fill = config.color,
            // Blur patches are baked at creation; overlays derive from their own parameters
            ElementType::Blur(_) | ElementType::SpotlightOverlay(_) | ElementType::CropMask(_) => {}
        }
    }

    pub fn as_text(&self) -> Option<&TextElement> {
        match self {
            ElementType::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextElement> {
        match self {
            ElementType::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_badge(&self) -> Option<&Badge> {
        match self {
            ElementType::Badge(b) => Some(b),
            _ => None,
        }
    }
}

/// Factory functions for creating elements
pub mod factory {
    use super::*;
    use crate::presets::{ArrowHeadStyle, BlurStyle};

    pub fn create_rectangle(rect: Rect, style: Style) -> ElementType {
        ElementType::Shape(Shape::new(ShapeKind::Rectangle, rect, style))
    }

    pub fn create_ellipse(rect: Rect, style: Style) -> ElementType {
        ElementType::Shape(Shape::new(ShapeKind::Ellipse, rect, style))
    }

    pub fn create_line(start: Pos2, end: Pos2, style: Style) -> ElementType {
        ElementType::Line(LineElement::new(start, end, None, style))
    }

    pub fn create_arrow(start: Pos2, end: Pos2, head: ArrowHeadStyle, style: Style) -> ElementType {
        ElementType::Line(LineElement::new(start, end, Some(head), style))
    }

    pub fn create_path(points: Vec<Pos2>, color: Color32, width: f32) -> ElementType {
        ElementType::Path(PathElement::new(points, color, width, 1.0, false))
    }

    pub fn create_marker(points: Vec<Pos2>, color: Color32, width: f32, opacity: f32) -> ElementType {
        ElementType::Path(PathElement::new(points, color, width, opacity, true))
    }

    pub fn create_text(position: Pos2, content: impl Into<String>, font: TextFont, color: Color32) -> ElementType {
        ElementType::Text(TextElement::new(position, content.into(), font, color))
    }

    pub fn create_badge(center: Pos2, radius: f32, number: u32, fill: Color32) -> ElementType {
        ElementType::Badge(Badge::new(center, radius, number, fill))
    }

    pub fn create_blur(rect: Rect, style: BlurStyle, intensity: u8, image: PatchImage) -> ElementType {
        ElementType::Blur(BlurPatch::new(rect, style, intensity, image))
    }
}
