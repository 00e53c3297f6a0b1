use egui::Color32;
use serde::{Deserialize, Serialize};

use crate::element::{Style, TextFont, TextOutline, TextShadow};
use crate::overlay::SpotlightParams;
use crate::presets::{ArrowHeadStyle, BlurStyle, DashPattern, FillMode, MarkerPreset, SpotlightShape};

/// Current style settings that seed newly created objects.
///
/// Changing the configuration never touches existing objects; `ApplyStyle`
/// re-applies it to the selection on request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    pub color: Color32,
    pub stroke_width: f32,
    pub fill_mode: FillMode,
    pub opacity: f32,
    pub corner_radius: f32,
    pub dash: DashPattern,
    pub arrow_style: ArrowHeadStyle,
    pub font: TextFont,
    pub text_shadow: Option<TextShadow>,
    pub text_outline: Option<TextOutline>,
    pub marker: MarkerPreset,
    pub blur_style: BlurStyle,
    pub blur_intensity: u8,
    pub spotlight_shape: SpotlightShape,
    pub spotlight_color: Color32,
    pub spotlight_darkness: f32,
    pub badge_radius: f32,
}

impl Default for ToolConfig {
    fn default() -> Self {
        let spotlight = SpotlightParams::default();
        Self {
            color: Color32::from_rgb(235, 64, 52),
            stroke_width: 3.0,
            fill_mode: FillMode::None,
            opacity: 1.0,
            corner_radius: 0.0,
            dash: DashPattern::Solid,
            arrow_style: ArrowHeadStyle::Filled,
            font: TextFont::default(),
            text_shadow: None,
            text_outline: None,
            marker: MarkerPreset::Medium,
            blur_style: BlurStyle::Gaussian,
            blur_intensity: 50,
            spotlight_shape: SpotlightShape::Circle,
            spotlight_color: spotlight.color,
            spotlight_darkness: spotlight.darkness,
            badge_radius: 14.0,
        }
    }
}

impl ToolConfig {
    pub fn shape_style(&self) -> Style {
        Style {
            stroke: self.color,
            stroke_width: self.stroke_width,
            fill: self.fill_mode.fill_for(self.color),
            opacity: self.opacity,
            corner_radius: self.corner_radius,
            dash: self.dash,
        }
    }

    pub fn line_style(&self) -> Style {
        Style {
            fill: None,
            corner_radius: 0.0,
            ..self.shape_style()
        }
    }

    pub fn spotlight_params(&self) -> SpotlightParams {
        SpotlightParams {
            color: self.spotlight_color,
            darkness: self.spotlight_darkness,
        }
    }
}
