//! Static style tables and interaction constants.
//!
//! Nothing in here holds state. Tools and the compositor look values up by
//! preset identifier so the live view and the exported raster agree.

use egui::Color32;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Smallest accepted drag, in logical pixels, for both dimensions of a shape
/// and for the length of a line or arrow.
pub const MIN_DRAG_SIZE: f32 = 10.0;

/// Offset applied to duplicated and pasted objects.
pub const CLONE_OFFSET: f32 = 10.0;

pub const ROTATE_STEP_DEGREES: f32 = 15.0;
pub const ROTATE_FINE_STEP_DEGREES: f32 = 1.0;

pub const NUDGE_STEP: f32 = 1.0;
pub const NUDGE_LARGE_STEP: f32 = 10.0;

/// Maximum number of snapshots kept by the history engine.
pub const HISTORY_LIMIT: usize = 50;

/// Ghost styling for in-progress drags.
pub const PREVIEW_STROKE: Color32 = Color32::from_rgba_premultiplied(160, 160, 160, 200);
pub const PREVIEW_STROKE_WIDTH: f32 = 1.5;

/// Crop mask dimming and border
pub const CROP_DIM_COLOR: Color32 = Color32::from_rgba_premultiplied(0, 0, 0, 140);
pub const CROP_BORDER_COLOR: Color32 = Color32::WHITE;
pub const CROP_BORDER_WIDTH: f32 = 1.5;

/// Fill used when a blur region could not be captured.
pub const BLUR_PLACEHOLDER: [u8; 4] = [128, 128, 128, 160];

pub const BLUR_INTENSITY_RANGE: RangeInclusive<u8> = 1..=100;

/// Arrow head styles offered by the style panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ArrowHeadStyle {
    #[default]
    Filled,
    Open,
    Line,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrowPreset {
    /// Head length as a multiple of the stroke width
    pub head_length_factor: f32,
    pub head_angle_deg: f32,
    pub filled: bool,
}

/// Shortest head ever drawn, so thin arrows still read as arrows.
pub const MIN_ARROW_HEAD: f32 = 10.0;

impl ArrowHeadStyle {
    pub fn preset(self) -> ArrowPreset {
        match self {
            ArrowHeadStyle::Filled => ArrowPreset {
                head_length_factor: 4.0,
                head_angle_deg: 28.0,
                filled: true,
            },
            ArrowHeadStyle::Open => ArrowPreset {
                head_length_factor: 4.5,
                head_angle_deg: 32.0,
                filled: false,
            },
            ArrowHeadStyle::Line => ArrowPreset {
                head_length_factor: 3.5,
                head_angle_deg: 40.0,
                filled: false,
            },
        }
    }
}

/// Line dash presets. The dash array scales with the stroke width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DashPattern {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

impl DashPattern {
    pub fn dash_array(self, width: f32) -> Vec<f32> {
        let w = width.max(1.0);
        match self {
            DashPattern::Solid => Vec::new(),
            DashPattern::Dashed => vec![w * 4.0, w * 2.5],
            DashPattern::Dotted => vec![w, w * 1.5],
        }
    }
}

/// Highlighter presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MarkerPreset {
    Fine,
    #[default]
    Medium,
    Broad,
}

impl MarkerPreset {
    pub fn width(self) -> f32 {
        match self {
            MarkerPreset::Fine => 8.0,
            MarkerPreset::Medium => 16.0,
            MarkerPreset::Broad => 28.0,
        }
    }

    pub fn opacity(self) -> f32 {
        match self {
            MarkerPreset::Fine => 0.45,
            MarkerPreset::Medium => 0.4,
            MarkerPreset::Broad => 0.35,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BlurStyle {
    #[default]
    Gaussian,
    Mosaic,
}

fn normalized_intensity(intensity: u8) -> f32 {
    let lo = *BLUR_INTENSITY_RANGE.start();
    let hi = *BLUR_INTENSITY_RANGE.end();
    f32::from(intensity.clamp(lo, hi) - lo) / f32::from(hi - lo)
}

/// Gaussian sigma for a blur intensity, 1.0 ..= 16.0.
pub fn gaussian_sigma(intensity: u8) -> f32 {
    1.0 + normalized_intensity(intensity) * 15.0
}

/// Mosaic block edge in source pixels, 4 ..= 32.
pub fn mosaic_block_size(intensity: u8) -> u32 {
    4 + (normalized_intensity(intensity) * 28.0).round() as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SpotlightShape {
    #[default]
    Circle,
    Rectangle,
    RoundedRectangle,
}

pub const SPOTLIGHT_CORNER_RADIUS: f32 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FillMode {
    #[default]
    None,
    Translucent,
    Solid,
}

impl FillMode {
    pub fn fill_for(self, color: Color32) -> Option<Color32> {
        match self {
            FillMode::None => None,
            FillMode::Translucent => {
                let [r, g, b, _] = color.to_srgba_unmultiplied();
                Some(Color32::from_rgba_unmultiplied(r, g, b, 64))
            }
            FillMode::Solid => Some(color),
        }
    }
}
