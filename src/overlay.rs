//! Derived overlays: the spotlight dark layer and the crop dimming mask.
//!
//! Both are pure functions of their source parameters. The engine throws the
//! previous overlay object away and inserts a freshly derived one on every
//! change, and again after every history restore.

use egui::{Color32, Pos2, Rect, Vec2, pos2};
use serde::{Deserialize, Serialize};

use crate::element::ObjectId;
use crate::presets::{self, DashPattern, SpotlightShape};

/// A region cut out of the spotlight overlay, in absolute canvas coordinates
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum SpotlightHole {
    Circle {
        left: f32,
        top: f32,
        radius: f32,
    },
    Rect {
        left: f32,
        top: f32,
        width: f32,
        height: f32,
        corner_radius: f32,
    },
}

impl SpotlightHole {
    /// Hole for a committed spotlight drag. Circles are inscribed around the
    /// drag center with the larger half-dimension as radius.
    pub fn from_drag(rect: Rect, shape: SpotlightShape) -> Self {
        match shape {
            SpotlightShape::Circle => {
                let radius = rect.width().max(rect.height()) / 2.0;
                let c = rect.center();
                SpotlightHole::Circle {
                    left: c.x - radius,
                    top: c.y - radius,
                    radius,
                }
            }
            SpotlightShape::Rectangle | SpotlightShape::RoundedRectangle => {
                let corner_radius = if shape == SpotlightShape::RoundedRectangle {
                    presets::SPOTLIGHT_CORNER_RADIUS.min(rect.width().min(rect.height()) / 2.0)
                } else {
                    0.0
                };
                SpotlightHole::Rect {
                    left: rect.min.x,
                    top: rect.min.y,
                    width: rect.width(),
                    height: rect.height(),
                    corner_radius,
                }
            }
        }
    }

    pub fn bounds(&self) -> Rect {
        match *self {
            SpotlightHole::Circle { left, top, radius } => {
                Rect::from_min_size(pos2(left, top), Vec2::splat(radius * 2.0))
            }
            SpotlightHole::Rect { left, top, width, height, .. } => {
                Rect::from_min_size(pos2(left, top), Vec2::new(width, height))
            }
        }
    }

    pub fn contains(&self, pos: Pos2) -> bool {
        match *self {
            SpotlightHole::Circle { left, top, radius } => {
                pos.distance(pos2(left + radius, top + radius)) <= radius
            }
            SpotlightHole::Rect { corner_radius, .. } => {
                let bounds = self.bounds();
                if !bounds.contains(pos) {
                    return false;
                }
                let r = corner_radius.min(bounds.width() / 2.0).min(bounds.height() / 2.0);
                if r <= 0.0 {
                    return true;
                }
                // Distance from the inner rect whose corners are the arc centers
                let inner = bounds.shrink(r);
                let dx = (inner.min.x - pos.x).max(pos.x - inner.max.x).max(0.0);
                let dy = (inner.min.y - pos.y).max(pos.y - inner.max.y).max(0.0);
                dx * dx + dy * dy <= r * r
            }
        }
    }
}

/// Tint of the spotlight overlay
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpotlightParams {
    pub color: Color32,
    /// 0.0 (transparent) ..= 1.0 (opaque)
    pub darkness: f32,
}

impl Default for SpotlightParams {
    fn default() -> Self {
        Self {
            color: Color32::BLACK,
            darkness: 0.6,
        }
    }
}

impl SpotlightParams {
    pub fn tint(&self) -> Color32 {
        let [r, g, b, _] = self.color.to_srgba_unmultiplied();
        let alpha = (self.darkness.clamp(0.0, 1.0) * 255.0).round() as u8;
        Color32::from_rgba_unmultiplied(r, g, b, alpha)
    }
}

/// Export crop rectangle in canvas coordinates
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CropRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl CropRect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self { left, top, width, height }
    }

    pub fn from_rect(rect: Rect) -> Self {
        Self::new(rect.min.x, rect.min.y, rect.width(), rect.height())
    }

    pub fn to_rect(&self) -> Rect {
        Rect::from_min_size(pos2(self.left, self.top), Vec2::new(self.width, self.height))
    }
}

/// The visible area of the spotlight overlay: `outer` minus the union of `holes`.
#[derive(Clone, Debug, PartialEq)]
pub struct ClipRegion {
    pub outer: Rect,
    pub holes: Vec<SpotlightHole>,
}

/// Full-canvas tinted layer with holes clipped out
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpotlightOverlay {
    pub id: ObjectId,
    pub canvas: Rect,
    pub holes: Vec<SpotlightHole>,
    pub tint: Color32,
}

impl SpotlightOverlay {
    pub fn clip_region(&self) -> ClipRegion {
        ClipRegion {
            outer: self.canvas,
            holes: self.holes.clone(),
        }
    }

    /// True where the tint is visible
    pub fn is_darkened(&self, pos: Pos2) -> bool {
        self.canvas.contains(pos) && !self.holes.iter().any(|h| h.contains(pos))
    }
}

/// Dimming panels around the crop rect plus a dashed outline, as one object
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CropMask {
    pub id: ObjectId,
    pub canvas: Rect,
    pub crop: CropRect,
    /// Top, bottom, left, right exterior margins
    pub panels: [Rect; 4],
    pub dim: Color32,
    pub border: Rect,
    pub border_dash: Vec<f32>,
    #[serde(default = "visible_default")]
    pub visible: bool,
}

fn visible_default() -> bool {
    true
}

/// Build the spotlight overlay for the given holes. No holes, no overlay.
pub fn derive_spotlight_overlay(
    canvas: Rect,
    holes: &[SpotlightHole],
    params: &SpotlightParams,
) -> Option<SpotlightOverlay> {
    if holes.is_empty() {
        return None;
    }
    Some(SpotlightOverlay {
        id: ObjectId::new(),
        canvas,
        holes: holes.to_vec(),
        tint: params.tint(),
    })
}

fn span(min: Pos2, max: Pos2) -> Rect {
    Rect::from_min_max(min, pos2(max.x.max(min.x), max.y.max(min.y)))
}

/// Build the crop dimming mask for `crop` on a canvas of `canvas`.
pub fn derive_crop_mask(canvas: Rect, crop: CropRect) -> CropMask {
    let c = crop.to_rect();
    let panels = [
        span(canvas.min, pos2(canvas.max.x, c.min.y)),
        span(pos2(canvas.min.x, c.max.y), canvas.max),
        span(pos2(canvas.min.x, c.min.y), pos2(c.min.x, c.max.y)),
        span(pos2(c.max.x, c.min.y), pos2(canvas.max.x, c.max.y)),
    ];
    CropMask {
        id: ObjectId::new(),
        canvas,
        crop,
        panels,
        dim: presets::CROP_DIM_COLOR,
        border: c,
        border_dash: DashPattern::Dashed.dash_array(presets::CROP_BORDER_WIDTH),
        visible: true,
    }
}

/// Source parameters the overlays are derived from. One per canvas engine.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OverlayState {
    pub holes: Vec<SpotlightHole>,
    pub spotlight: SpotlightParams,
    pub crop: Option<CropRect>,
}

impl OverlayState {
    pub fn clear(&mut self) {
        self.holes.clear();
        self.crop = None;
    }
}
