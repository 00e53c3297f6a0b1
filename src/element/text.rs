use egui::{Color32, Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};

use super::{Element, ElementKind, ObjectId, Transform};
use crate::element::common;
use crate::error::ElementError;

/// Average advance of a glyph relative to the font size, used for layout
/// estimates in the live view.
const AVG_ADVANCE: f32 = 0.6;
const MIN_FONT_SIZE: f32 = 6.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextFont {
    pub family: String,
    pub size: f32,
    /// CSS-style weight, 100..=900
    pub weight: u16,
    pub align: TextAlign,
    /// Multiple of the font size
    pub line_height: f32,
    /// Extra pixels between characters
    pub letter_spacing: f32,
}

impl Default for TextFont {
    fn default() -> Self {
        Self {
            family: "Sans".to_owned(),
            size: 24.0,
            weight: 400,
            align: TextAlign::Left,
            line_height: 1.2,
            letter_spacing: 0.0,
        }
    }
}

impl TextFont {
    pub fn is_bold(&self) -> bool {
        self.weight >= 600
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextShadow {
    pub color: Color32,
    pub blur: f32,
    pub offset: Vec2,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextOutline {
    pub color: Color32,
    pub width: f32,
}

/// Editable multi-line text anchored at its top-left corner
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextElement {
    pub id: ObjectId,
    pub position: Pos2,
    pub content: String,
    pub font: TextFont,
    pub color: Color32,
    #[serde(default = "full_opacity")]
    pub opacity: f32,
    #[serde(default)]
    pub shadow: Option<TextShadow>,
    #[serde(default)]
    pub outline: Option<TextOutline>,
    #[serde(default)]
    pub transform: Transform,
}

fn full_opacity() -> f32 {
    1.0
}

impl TextElement {
    pub fn new(position: Pos2, content: String, font: TextFont, color: Color32) -> Self {
        Self {
            id: ObjectId::new(),
            position,
            content,
            font,
            color,
            opacity: 1.0,
            shadow: None,
            outline: None,
            transform: Transform::default(),
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.content.split('\n')
    }

    pub fn line_advance(&self) -> f32 {
        self.font.size * self.font.line_height
    }

    /// Estimated width of one line in pixels
    pub fn estimate_line_width(&self, line: &str) -> f32 {
        let chars = line.chars().count() as f32;
        let spacing = if chars > 1.0 { (chars - 1.0) * self.font.letter_spacing } else { 0.0 };
        chars * self.font.size * AVG_ADVANCE + spacing
    }

    pub fn insert_str(&mut self, text: &str) {
        self.content.push_str(text);
    }

    /// Remove the last character. Returns false when already empty.
    pub fn backspace(&mut self) -> bool {
        self.content.pop().is_some()
    }

    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

impl Element for TextElement {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn kind(&self) -> ElementKind {
        ElementKind::Text
    }

    fn rect(&self) -> Rect {
        let width = self
            .lines()
            .map(|line| self.estimate_line_width(line))
            .fold(0.0_f32, f32::max)
            // Keep an empty editor clickable
            .max(self.font.size * AVG_ADVANCE);
        let line_count = self.lines().count() as f32;
        Rect::from_min_size(self.position, Vec2::new(width, line_count * self.line_advance()))
    }

    fn hit_test(&self, pos: Pos2) -> bool {
        let rect = self.rect();
        rect.expand(common::STROKE_HIT_PADDING)
            .contains(self.transform.to_local(pos, rect.center()))
    }

    fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }

    /// Text scales with the height of the requested rect.
    fn resize(&mut self, new_rect: Rect) -> Result<(), ElementError> {
        common::validate_rect(&new_rect)?;
        let old = self.rect();
        if old.height() <= 0.0 {
            return Err(ElementError::EmptyGeometry);
        }
        let scale = new_rect.height() / old.height();
        self.font.size = (self.font.size * scale).max(MIN_FONT_SIZE);
        self.font.letter_spacing *= scale;
        self.position = new_rect.min;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    #[test]
    fn rect_grows_with_lines() {
        let mut text = TextElement::new(pos2(0.0, 0.0), "ab".into(), TextFont::default(), Color32::BLACK);
        let one_line = text.rect();
        text.insert_str("\ncd");
        let two_lines = text.rect();
        assert!((two_lines.height() - 2.0 * one_line.height()).abs() < 1e-3);
    }

    #[test]
    fn resize_scales_font() {
        let mut text = TextElement::new(pos2(0.0, 0.0), "abc".into(), TextFont::default(), Color32::BLACK);
        let old = text.rect();
        text.resize(Rect::from_min_size(pos2(10.0, 10.0), old.size() * 2.0)).unwrap();
        assert!((text.font.size - 48.0).abs() < 1e-3, "font size {}", text.font.size);
        assert_eq!(text.position, pos2(10.0, 10.0));
    }

    #[test]
    fn backspace_on_empty_is_noop() {
        let mut text = TextElement::new(Pos2::ZERO, String::new(), TextFont::default(), Color32::BLACK);
        assert!(!text.backspace());
        assert!(text.is_blank());
    }
}
