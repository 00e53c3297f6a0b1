use egui::Pos2;

use super::{Tool, ToolContext};
use crate::command::Command;
use crate::element::{ElementType, factory};

/// Points closer than this to the previous one are dropped
const MIN_POINT_SPACING: f32 = 0.5;

/// Freehand pen, or highlighter when `marker` is set.
///
/// Strokes skip the ghost-preview model: the live stroke is drawn with its
/// final style and committed whole on release.
#[derive(Clone, Debug)]
pub struct DrawStrokeTool {
    marker: bool,
    // Transient state: the stroke being drawn (if any)
    current: Option<ElementType>,
}

impl DrawStrokeTool {
    pub fn new(marker: bool) -> Self {
        Self { marker, current: None }
    }

    pub fn is_marker(&self) -> bool {
        self.marker
    }

    fn push_point(&mut self, pos: Pos2) {
        if let Some(ElementType::Path(path)) = &mut self.current {
            let far_enough = path.points.last().is_none_or(|last| last.distance(pos) >= MIN_POINT_SPACING);
            if far_enough {
                path.points.push(pos);
            }
        }
    }
}

impl Tool for DrawStrokeTool {
    fn name(&self) -> &'static str {
        if self.marker { "Marker" } else { "Freehand" }
    }

    fn activate(&mut self) {
        // Reset any in-progress stroke when activated
        self.current = None;
    }

    fn deactivate(&mut self) {
        self.current = None;
    }

    fn on_pointer_down(&mut self, pos: Pos2, ctx: &ToolContext<'_>) -> Option<Command> {
        let config = ctx.config;
        let stroke = if self.marker {
            factory::create_marker(vec![pos], config.color, config.marker.width(), config.marker.opacity())
        } else {
            factory::create_path(vec![pos], config.color, config.stroke_width)
        };
        self.current = Some(stroke);
        None
    }

    fn on_pointer_move(&mut self, pos: Pos2, _ctx: &ToolContext<'_>) -> Option<Command> {
        self.push_point(pos);
        None
    }

    fn on_pointer_up(&mut self, pos: Pos2, _ctx: &ToolContext<'_>) -> Option<Command> {
        self.push_point(pos);
        self.current.take().map(Command::AddElement)
    }

    fn preview(&self) -> Option<&ElementType> {
        self.current.as_ref()
    }

    fn is_busy(&self) -> bool {
        self.current.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Element, ElementKind};
    use crate::scene::Scene;
    use crate::state::ToolConfig;
    use egui::{Modifiers, pos2};

    #[test]
    fn marker_takes_preset_width_and_opacity() {
        let scene = Scene::new();
        let config = ToolConfig::default();
        let ctx = ToolContext {
            scene: &scene,
            config: &config,
            modifiers: Modifiers::default(),
            selection: None,
            editing_text: None,
            crop_active: false,
            next_badge: 1,
        };
        let mut tool = DrawStrokeTool::new(true);
        tool.on_pointer_down(pos2(0.0, 0.0), &ctx);
        tool.on_pointer_move(pos2(0.1, 0.0), &ctx);
        tool.on_pointer_move(pos2(20.0, 0.0), &ctx);
        let Some(Command::AddElement(ElementType::Path(path))) = tool.on_pointer_up(pos2(40.0, 0.0), &ctx) else {
            panic!("expected a committed path");
        };
        assert_eq!(path.kind(), ElementKind::Marker);
        assert_eq!(path.points.len(), 3);
        assert_eq!(path.width, config.marker.width());
        assert_eq!(path.opacity, config.marker.opacity());
        assert!(!tool.is_busy());
    }
}
