use egui::{Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};

use super::{Element, ElementKind, ObjectId, Style, Transform};
use crate::element::common;
use crate::error::ElementError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeKind {
    Rectangle,
    Ellipse,
}

/// Rectangle or ellipse, optionally filled
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub id: ObjectId,
    pub kind: ShapeKind,
    pub rect: Rect,
    pub style: Style,
    #[serde(default)]
    pub transform: Transform,
}

impl Shape {
    pub fn new(kind: ShapeKind, rect: Rect, style: Style) -> Self {
        Self {
            id: ObjectId::new(),
            kind,
            rect,
            style,
            transform: Transform::default(),
        }
    }

    /// Corner radius clamped so it never exceeds half the shorter side
    pub fn effective_corner_radius(&self) -> f32 {
        let max = self.rect.width().min(self.rect.height()) / 2.0;
        self.style.corner_radius.clamp(0.0, max.max(0.0))
    }
}

impl Element for Shape {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn kind(&self) -> ElementKind {
        match self.kind {
            ShapeKind::Rectangle => ElementKind::Rectangle,
            ShapeKind::Ellipse => ElementKind::Ellipse,
        }
    }

    fn rect(&self) -> Rect {
        self.rect
    }

    fn hit_test(&self, pos: Pos2) -> bool {
        let local = self.transform.to_local(pos, self.rect.center());
        let pad = self.style.stroke_width / 2.0 + common::STROKE_HIT_PADDING;
        match self.kind {
            ShapeKind::Rectangle => {
                if !self.rect.expand(pad).contains(local) {
                    return false;
                }
                // Unfilled shapes are only hit on their outline
                self.style.fill.is_some() || !self.rect.shrink(pad).contains(local)
            }
            ShapeKind::Ellipse => {
                let c = self.rect.center();
                let rx = self.rect.width() / 2.0;
                let ry = self.rect.height() / 2.0;
                let outer = ellipse_norm(local - c, rx + pad, ry + pad);
                if outer > 1.0 {
                    return false;
                }
                if self.style.fill.is_some() || rx <= pad || ry <= pad {
                    return true;
                }
                ellipse_norm(local - c, rx - pad, ry - pad) >= 1.0
            }
        }
    }

    fn translate(&mut self, delta: Vec2) {
        self.rect = self.rect.translate(delta);
    }

    fn resize(&mut self, new_rect: Rect) -> Result<(), ElementError> {
        common::validate_rect(&new_rect)?;
        self.rect = new_rect;
        Ok(())
    }
}

fn ellipse_norm(d: Vec2, rx: f32, ry: f32) -> f32 {
    if rx <= 0.0 || ry <= 0.0 {
        return f32::INFINITY;
    }
    (d.x / rx).powi(2) + (d.y / ry).powi(2)
}
