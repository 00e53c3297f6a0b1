use egui::{Color32, Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};

use super::{Element, ElementKind, ObjectId, Transform};
use crate::element::common;
use crate::error::ElementError;

/// Numbered circular step marker
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Badge {
    pub id: ObjectId,
    pub center: Pos2,
    pub radius: f32,
    pub number: u32,
    pub fill: Color32,
    pub text_color: Color32,
    #[serde(default)]
    pub transform: Transform,
}

impl Badge {
    pub fn new(center: Pos2, radius: f32, number: u32, fill: Color32) -> Self {
        Self {
            id: ObjectId::new(),
            center,
            radius,
            number,
            fill,
            text_color: Color32::WHITE,
            transform: Transform::default(),
        }
    }

    pub fn label(&self) -> String {
        self.number.to_string()
    }
}

impl Element for Badge {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn kind(&self) -> ElementKind {
        ElementKind::Badge
    }

    fn rect(&self) -> Rect {
        Rect::from_center_size(self.center, Vec2::splat(self.radius * 2.0))
    }

    fn hit_test(&self, pos: Pos2) -> bool {
        pos.distance(self.center) <= self.radius + common::STROKE_HIT_PADDING
    }

    fn translate(&mut self, delta: Vec2) {
        self.center += delta;
    }

    fn resize(&mut self, new_rect: Rect) -> Result<(), ElementError> {
        common::validate_rect(&new_rect)?;
        self.center = new_rect.center();
        self.radius = new_rect.width().min(new_rect.height()) / 2.0;
        Ok(())
    }
}
