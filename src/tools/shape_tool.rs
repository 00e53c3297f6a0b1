use egui::{Pos2, Rect};
use log::debug;

use super::{Tool, ToolContext, ToolKind};
use crate::command::Command;
use crate::element::{ElementType, Style, factory};
use crate::geometry;
use crate::overlay::{CropRect, SpotlightHole};
use crate::presets::{self, DashPattern, SpotlightShape};

/// Drag state of a spatial tool
#[derive(Clone, Debug)]
pub enum ShapeState {
    Idle,
    Dragging {
        start: Pos2,
        /// Ghost object, rebuilt from scratch on every move
        preview: ElementType,
    },
}

/// Press-drag-release tool for rectangles, ellipses, lines, arrows and the
/// blur, spotlight and crop regions.
#[derive(Clone, Debug)]
pub struct ShapeTool {
    kind: ToolKind,
    state: ShapeState,
}

impl ShapeTool {
    pub fn new(kind: ToolKind) -> Self {
        Self {
            kind,
            state: ShapeState::Idle,
        }
    }

    pub fn kind(&self) -> ToolKind {
        self.kind
    }

    pub fn state(&self) -> &ShapeState {
        &self.state
    }

    fn is_line(&self) -> bool {
        matches!(self.kind, ToolKind::Line | ToolKind::Arrow)
    }

    fn ghost_style() -> Style {
        Style {
            stroke: presets::PREVIEW_STROKE,
            stroke_width: presets::PREVIEW_STROKE_WIDTH,
            fill: None,
            opacity: 1.0,
            corner_radius: 0.0,
            dash: DashPattern::Dashed,
        }
    }

    fn build_preview(&self, start: Pos2, current: Pos2, ctx: &ToolContext<'_>) -> ElementType {
        let ghost = Self::ghost_style();
        match self.kind {
            ToolKind::Line => {
                let (a, b) = geometry::line_from_drag(start, current, &ctx.modifiers);
                factory::create_line(a, b, ghost)
            }
            ToolKind::Arrow => {
                // The head depends on the live angle, so the whole arrow is rebuilt
                let (a, b) = geometry::line_from_drag(start, current, &ctx.modifiers);
                factory::create_arrow(a, b, ctx.config.arrow_style, ghost)
            }
            ToolKind::Ellipse => factory::create_ellipse(geometry::drag_rect(start, current, &ctx.modifiers), ghost),
            ToolKind::Spotlight if ctx.config.spotlight_shape == SpotlightShape::Circle => {
                let rect = geometry::drag_rect(start, current, &ctx.modifiers);
                let hole = SpotlightHole::from_drag(rect, SpotlightShape::Circle);
                factory::create_ellipse(hole.bounds(), ghost)
            }
            _ => factory::create_rectangle(geometry::drag_rect(start, current, &ctx.modifiers), ghost),
        }
    }

    fn commit(&self, start: Pos2, end: Pos2, ctx: &ToolContext<'_>) -> Option<Command> {
        if self.is_line() {
            let (a, b) = geometry::line_from_drag(start, end, &ctx.modifiers);
            if (b - a).length() < presets::MIN_DRAG_SIZE {
                debug!("{} drag too short, discarded", self.kind.name());
                return None;
            }
            let style = ctx.config.line_style();
            let element = match self.kind {
                ToolKind::Arrow => factory::create_arrow(a, b, ctx.config.arrow_style, style),
                _ => factory::create_line(a, b, style),
            };
            return Some(Command::AddElement(element));
        }

        let rect = geometry::drag_rect(start, end, &ctx.modifiers);
        if !exceeds_threshold(rect) {
            debug!("{} drag too small, discarded", self.kind.name());
            return None;
        }
        let command = match self.kind {
            ToolKind::Rectangle => Command::AddElement(factory::create_rectangle(rect, ctx.config.shape_style())),
            ToolKind::Ellipse => Command::AddElement(factory::create_ellipse(rect, ctx.config.shape_style())),
            ToolKind::Blur => Command::CaptureBlur {
                rect,
                style: ctx.config.blur_style,
                intensity: ctx.config.blur_intensity,
            },
            ToolKind::Spotlight => Command::AddSpotlightHole(SpotlightHole::from_drag(rect, ctx.config.spotlight_shape)),
            ToolKind::Crop => Command::SetCrop(CropRect::from_rect(rect)),
            _ => return None,
        };
        Some(command)
    }
}

/// Both sides at least the minimum drag size
fn exceeds_threshold(rect: Rect) -> bool {
    rect.width() >= presets::MIN_DRAG_SIZE && rect.height() >= presets::MIN_DRAG_SIZE
}

impl Tool for ShapeTool {
    fn name(&self) -> &'static str {
        self.kind.name()
    }

    fn deactivate(&mut self) {
        self.state = ShapeState::Idle;
    }

    fn on_pointer_down(&mut self, pos: Pos2, ctx: &ToolContext<'_>) -> Option<Command> {
        if self.kind == ToolKind::Crop && ctx.crop_active {
            debug!("Crop already installed, ignoring crop drag");
            return None;
        }
        self.state = ShapeState::Dragging {
            start: pos,
            preview: self.build_preview(pos, pos, ctx),
        };
        None
    }

    fn on_pointer_move(&mut self, pos: Pos2, ctx: &ToolContext<'_>) -> Option<Command> {
        if let ShapeState::Dragging { start, .. } = self.state {
            let preview = self.build_preview(start, pos, ctx);
            self.state = ShapeState::Dragging { start, preview };
        }
        None
    }

    fn on_pointer_up(&mut self, pos: Pos2, ctx: &ToolContext<'_>) -> Option<Command> {
        match std::mem::replace(&mut self.state, ShapeState::Idle) {
            ShapeState::Dragging { start, .. } => self.commit(start, pos, ctx),
            ShapeState::Idle => None,
        }
    }

    fn preview(&self) -> Option<&ElementType> {
        match &self.state {
            ShapeState::Dragging { preview, .. } => Some(preview),
            ShapeState::Idle => None,
        }
    }

    fn is_busy(&self) -> bool {
        matches!(self.state, ShapeState::Dragging { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;
    use crate::scene::Scene;
    use crate::state::ToolConfig;
    use egui::{Modifiers, pos2};

    fn ctx<'a>(scene: &'a Scene, config: &'a ToolConfig, modifiers: Modifiers, crop_active: bool) -> ToolContext<'a> {
        ToolContext {
            scene,
            config,
            modifiers,
            selection: None,
            editing_text: None,
            crop_active,
            next_badge: 1,
        }
    }

    fn drag(tool: &mut ShapeTool, from: Pos2, to: Pos2, ctx: &ToolContext<'_>) -> Option<Command> {
        tool.on_pointer_down(from, ctx);
        tool.on_pointer_move(to, ctx);
        tool.on_pointer_up(to, ctx)
    }

    #[test]
    fn preview_follows_drag_with_ghost_style() {
        let (scene, config) = (Scene::new(), ToolConfig::default());
        let c = ctx(&scene, &config, Modifiers::default(), false);
        let mut tool = ShapeTool::new(ToolKind::Rectangle);
        tool.on_pointer_down(pos2(10.0, 10.0), &c);
        tool.on_pointer_move(pos2(60.0, 40.0), &c);
        let ElementType::Shape(shape) = tool.preview().unwrap() else {
            panic!("expected shape preview");
        };
        assert_eq!(shape.rect, Rect::from_min_max(pos2(10.0, 10.0), pos2(60.0, 40.0)));
        assert_eq!(shape.style.dash, DashPattern::Dashed);
        assert!(tool.is_busy());
    }

    #[test]
    fn threshold_is_inclusive() {
        let (scene, config) = (Scene::new(), ToolConfig::default());
        let c = ctx(&scene, &config, Modifiers::default(), false);
        let mut tool = ShapeTool::new(ToolKind::Ellipse);
        assert!(drag(&mut tool, pos2(0.0, 0.0), pos2(9.0, 50.0), &c).is_none());
        assert!(drag(&mut tool, pos2(0.0, 0.0), pos2(10.0, 10.0), &c).is_some());
        assert!(tool.preview().is_none());
    }

    #[test]
    fn short_arrow_is_discarded() {
        let (scene, config) = (Scene::new(), ToolConfig::default());
        let c = ctx(&scene, &config, Modifiers::default(), false);
        let mut tool = ShapeTool::new(ToolKind::Arrow);
        assert!(drag(&mut tool, pos2(0.0, 0.0), pos2(6.0, 6.0), &c).is_none());
        let Some(Command::AddElement(arrow)) = drag(&mut tool, pos2(0.0, 0.0), pos2(30.0, 0.0), &c) else {
            panic!("expected an arrow");
        };
        assert_eq!(arrow.kind(), crate::element::ElementKind::Arrow);
    }

    #[test]
    fn crop_drag_ignored_while_crop_exists() {
        let (scene, config) = (Scene::new(), ToolConfig::default());
        let c = ctx(&scene, &config, Modifiers::default(), true);
        let mut tool = ShapeTool::new(ToolKind::Crop);
        assert!(drag(&mut tool, pos2(0.0, 0.0), pos2(100.0, 100.0), &c).is_none());
        assert!(!tool.is_busy());
    }

    #[test]
    fn spotlight_emits_hole() {
        let (scene, config) = (Scene::new(), ToolConfig::default());
        let c = ctx(&scene, &config, Modifiers::default(), false);
        let mut tool = ShapeTool::new(ToolKind::Spotlight);
        let command = drag(&mut tool, pos2(0.0, 0.0), pos2(40.0, 20.0), &c);
        assert!(matches!(command, Some(Command::AddSpotlightHole(SpotlightHole::Circle { radius, .. })) if radius == 20.0));
    }

    #[test]
    fn deactivate_discards_preview() {
        let (scene, config) = (Scene::new(), ToolConfig::default());
        let c = ctx(&scene, &config, Modifiers::default(), false);
        let mut tool = ShapeTool::new(ToolKind::Blur);
        tool.on_pointer_down(pos2(0.0, 0.0), &c);
        tool.deactivate();
        assert!(tool.preview().is_none());
        assert!(tool.on_pointer_up(pos2(80.0, 80.0), &c).is_none());
    }
}
