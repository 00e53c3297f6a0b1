use egui::{Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};

use super::{Element, ElementKind, ObjectId, Style, Transform};
use crate::element::common;
use crate::error::ElementError;
use crate::geometry;
use crate::presets::ArrowHeadStyle;

/// Straight line, or an arrow when `arrow` carries a head style
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineElement {
    pub id: ObjectId,
    pub start: Pos2,
    pub end: Pos2,
    pub arrow: Option<ArrowHeadStyle>,
    pub style: Style,
    #[serde(default)]
    pub transform: Transform,
}

impl LineElement {
    pub fn new(start: Pos2, end: Pos2, arrow: Option<ArrowHeadStyle>, style: Style) -> Self {
        Self {
            id: ObjectId::new(),
            start,
            end,
            arrow,
            style,
            transform: Transform::default(),
        }
    }

    pub fn length(&self) -> f32 {
        (self.end - self.start).length()
    }

    /// Arrow head triangle in element-local space, if this is an arrow.
    pub fn head(&self) -> Option<[Pos2; 3]> {
        self.arrow
            .map(|style| geometry::arrow_head(self.start, self.end, self.style.stroke_width, style))
    }
}

impl Element for LineElement {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn kind(&self) -> ElementKind {
        if self.arrow.is_some() {
            ElementKind::Arrow
        } else {
            ElementKind::Line
        }
    }

    fn rect(&self) -> Rect {
        Rect::from_two_pos(self.start, self.end)
    }

    fn hit_test(&self, pos: Pos2) -> bool {
        let local = self.transform.to_local(pos, self.rect().center());
        let tolerance = self.style.stroke_width / 2.0 + common::STROKE_HIT_PADDING;
        if common::distance_to_line_segment(local, self.start, self.end) <= tolerance {
            return true;
        }
        match self.head() {
            Some(head) => geometry::point_in_triangle(local, head),
            None => false,
        }
    }

    fn translate(&mut self, delta: Vec2) {
        self.start += delta;
        self.end += delta;
    }

    fn resize(&mut self, new_rect: Rect) -> Result<(), ElementError> {
        let old_rect = self.rect();
        let mut points = [self.start, self.end];
        common::remap_points(&mut points, old_rect, new_rect);
        self.start = points[0];
        self.end = points[1];
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    #[test]
    fn arrow_kind_and_hit() {
        let arrow = LineElement::new(pos2(0.0, 0.0), pos2(100.0, 0.0), Some(ArrowHeadStyle::Filled), Style::default());
        assert_eq!(arrow.kind(), ElementKind::Arrow);
        assert!(arrow.hit_test(pos2(50.0, 2.0)));
        assert!(!arrow.hit_test(pos2(50.0, 30.0)));
    }

    #[test]
    fn resize_scales_endpoints() {
        let mut line = LineElement::new(pos2(0.0, 0.0), pos2(10.0, 20.0), None, Style::default());
        line.resize(Rect::from_min_max(pos2(0.0, 0.0), pos2(20.0, 40.0))).unwrap();
        assert_eq!(line.end, pos2(20.0, 40.0));
    }
}
