use egui::{Color32, Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};

use super::{Element, ElementKind, ObjectId, Transform};
use crate::element::common;
use crate::error::ElementError;

/// Freehand stroke, or a translucent highlighter stroke when `marker` is set
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathElement {
    pub id: ObjectId,
    pub points: Vec<Pos2>,
    pub color: Color32,
    pub width: f32,
    pub opacity: f32,
    pub marker: bool,
    #[serde(default)]
    pub transform: Transform,
}

impl PathElement {
    pub fn new(points: Vec<Pos2>, color: Color32, width: f32, opacity: f32, marker: bool) -> Self {
        Self {
            id: ObjectId::new(),
            points,
            color,
            width,
            opacity,
            marker,
            transform: Transform::default(),
        }
    }

    /// Unpadded bounds of the control points
    fn point_bounds(&self) -> Rect {
        common::calculate_bounds(&self.points, 0.0)
    }
}

impl Element for PathElement {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn kind(&self) -> ElementKind {
        if self.marker {
            ElementKind::Marker
        } else {
            ElementKind::Path
        }
    }

    fn rect(&self) -> Rect {
        common::calculate_bounds(&self.points, self.width / 2.0)
    }

    fn hit_test(&self, pos: Pos2) -> bool {
        if self.points.len() < 2 {
            return false;
        }
        let local = self.transform.to_local(pos, self.rect().center());
        let tolerance = self.width / 2.0 + common::STROKE_HIT_PADDING;
        self.points
            .windows(2)
            .any(|w| common::distance_to_line_segment(local, w[0], w[1]) <= tolerance)
    }

    fn translate(&mut self, delta: Vec2) {
        for point in &mut self.points {
            *point += delta;
        }
    }

    fn resize(&mut self, new_rect: Rect) -> Result<(), ElementError> {
        common::validate_rect(&new_rect)?;
        if self.points.is_empty() {
            return Err(ElementError::EmptyGeometry);
        }
        // The requested rect includes the stroke padding; map the control points inside it
        let pad = self.width / 2.0;
        let target = new_rect.shrink(pad.min(new_rect.width() / 2.0).min(new_rect.height() / 2.0));
        let old = self.point_bounds();
        common::remap_points(&mut self.points, old, target);
        Ok(())
    }
}
