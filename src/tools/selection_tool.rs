use egui::{Pos2, Rect, Vec2};
use log::debug;

use super::{Tool, ToolContext};
use crate::command::Command;
use crate::element::{Element, ObjectId, rotate_point};
use crate::geometry::{Corner, Handle, RESIZE_HANDLE_RADIUS, handle_at, resize_rect};
use crate::presets::ROTATE_STEP_DEGREES;

// Consolidated state enum for the SelectionTool
#[derive(Clone, Debug, PartialEq)]
pub enum SelectionState {
    Idle,
    Dragging {
        id: ObjectId,
        last_pos: Pos2,
        moved: bool,
    },
    Resizing {
        id: ObjectId,
        corner: Corner,
        original_rect: Rect,
        start_pos: Pos2,
        rotation: f32,
    },
    Rotating {
        id: ObjectId,
        center: Pos2,
        /// Pointer angle at press, radians
        start_angle: f32,
        original_rotation: f32,
    },
}

/// Select, move, corner-resize and rotate objects.
#[derive(Clone, Debug)]
pub struct SelectionTool {
    state: SelectionState,
    handle_size: f32,
}

impl Default for SelectionTool {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionTool {
    pub fn new() -> Self {
        Self {
            state: SelectionState::Idle,
            handle_size: RESIZE_HANDLE_RADIUS,
        }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn handle_size(&self) -> f32 {
        self.handle_size
    }

    /// Try to grab a handle of the current selection
    fn grab_handle(&mut self, pos: Pos2, ctx: &ToolContext<'_>) -> bool {
        let Some(element) = ctx.selection.and_then(|id| ctx.scene.get(id)) else {
            return false;
        };
        let rect = element.rect();
        let rotation = element.rotation();
        let Some(handle) = handle_at(pos, rect, rotation) else {
            return false;
        };
        let id = element.id();
        self.state = match handle {
            Handle::Resize(corner) => {
                debug!("Resizing {id} from {corner:?}");
                SelectionState::Resizing {
                    id,
                    corner,
                    original_rect: rect,
                    start_pos: pos,
                    rotation,
                }
            }
            Handle::Rotate => {
                debug!("Rotating {id}");
                SelectionState::Rotating {
                    id,
                    center: rect.center(),
                    start_angle: (pos - rect.center()).angle(),
                    original_rotation: rotation,
                }
            }
        };
        true
    }
}

impl Tool for SelectionTool {
    fn name(&self) -> &'static str {
        "Selection"
    }

    fn activate(&mut self) {
        self.state = SelectionState::Idle;
    }

    fn deactivate(&mut self) {
        self.state = SelectionState::Idle;
    }

    fn on_pointer_down(&mut self, pos: Pos2, ctx: &ToolContext<'_>) -> Option<Command> {
        if self.grab_handle(pos, ctx) {
            return None;
        }
        match ctx.scene.element_at(pos) {
            Some(element) => {
                let id = element.id();
                self.state = SelectionState::Dragging {
                    id,
                    last_pos: pos,
                    moved: false,
                };
                (ctx.selection != Some(id)).then_some(Command::Select(Some(id)))
            }
            None => {
                self.state = SelectionState::Idle;
                ctx.selection.map(|_| Command::Select(None))
            }
        }
    }

    fn on_pointer_move(&mut self, pos: Pos2, ctx: &ToolContext<'_>) -> Option<Command> {
        match &mut self.state {
            SelectionState::Idle => None,
            SelectionState::Dragging { id, last_pos, moved } => {
                let delta = pos - *last_pos;
                if delta == Vec2::ZERO {
                    return None;
                }
                *last_pos = pos;
                *moved = true;
                Some(Command::MoveElement { id: *id, delta })
            }
            SelectionState::Resizing {
                id,
                corner,
                original_rect,
                start_pos,
                rotation,
            } => {
                // Work in the element's unrotated frame
                let delta = rotate_point(pos, *start_pos, -*rotation) - *start_pos;
                Some(Command::ResizeElement {
                    id: *id,
                    rect: resize_rect(*original_rect, *corner, delta),
                })
            }
            SelectionState::Rotating {
                id,
                center,
                start_angle,
                original_rotation,
            } => {
                let angle = (pos - *center).angle();
                let mut degrees = *original_rotation + (angle - *start_angle).to_degrees();
                if ctx.modifiers.shift {
                    degrees = (degrees / ROTATE_STEP_DEGREES).round() * ROTATE_STEP_DEGREES;
                }
                Some(Command::SetRotation { id: *id, degrees })
            }
        }
    }

    fn on_pointer_up(&mut self, _pos: Pos2, _ctx: &ToolContext<'_>) -> Option<Command> {
        match std::mem::replace(&mut self.state, SelectionState::Idle) {
            SelectionState::Idle | SelectionState::Dragging { moved: false, .. } => None,
            SelectionState::Dragging { .. } | SelectionState::Resizing { .. } | SelectionState::Rotating { .. } => {
                Some(Command::FinishTransform)
            }
        }
    }

    fn is_busy(&self) -> bool {
        self.state != SelectionState::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Style, factory};
    use crate::scene::Scene;
    use crate::state::ToolConfig;
    use egui::{Color32, Modifiers, pos2, vec2};

    fn filled_rect(scene: &mut Scene) -> ObjectId {
        let style = Style { fill: Some(Color32::BLUE), ..Style::default() };
        scene.create(factory::create_rectangle(Rect::from_min_size(pos2(100.0, 100.0), vec2(100.0, 50.0)), style))
    }

    fn ctx<'a>(scene: &'a Scene, config: &'a ToolConfig, selection: Option<ObjectId>, shift: bool) -> ToolContext<'a> {
        ToolContext {
            scene,
            config,
            modifiers: Modifiers { shift, ..Default::default() },
            selection,
            editing_text: None,
            crop_active: false,
            next_badge: 1,
        }
    }

    #[test]
    fn press_selects_then_drag_moves() {
        let mut scene = Scene::new();
        let id = filled_rect(&mut scene);
        let config = ToolConfig::default();
        let mut tool = SelectionTool::new();
        let c = ctx(&scene, &config, None, false);
        assert_eq!(tool.on_pointer_down(pos2(150.0, 125.0), &c), Some(Command::Select(Some(id))));
        assert_eq!(
            tool.on_pointer_move(pos2(160.0, 130.0), &c),
            Some(Command::MoveElement { id, delta: vec2(10.0, 5.0) })
        );
        assert_eq!(tool.on_pointer_up(pos2(160.0, 130.0), &c), Some(Command::FinishTransform));
    }

    #[test]
    fn click_without_move_records_nothing() {
        let mut scene = Scene::new();
        let id = filled_rect(&mut scene);
        let config = ToolConfig::default();
        let mut tool = SelectionTool::new();
        let c = ctx(&scene, &config, Some(id), false);
        assert_eq!(tool.on_pointer_down(pos2(150.0, 125.0), &c), None);
        assert_eq!(tool.on_pointer_up(pos2(150.0, 125.0), &c), None);
    }

    #[test]
    fn empty_click_clears_selection() {
        let mut scene = Scene::new();
        let id = filled_rect(&mut scene);
        let config = ToolConfig::default();
        let mut tool = SelectionTool::new();
        let c = ctx(&scene, &config, Some(id), false);
        assert_eq!(tool.on_pointer_down(pos2(500.0, 500.0), &c), Some(Command::Select(None)));
    }

    #[test]
    fn corner_handle_resizes() {
        let mut scene = Scene::new();
        let id = filled_rect(&mut scene);
        let config = ToolConfig::default();
        let mut tool = SelectionTool::new();
        let c = ctx(&scene, &config, Some(id), false);
        assert_eq!(tool.on_pointer_down(pos2(200.0, 150.0), &c), None);
        let Some(Command::ResizeElement { rect, .. }) = tool.on_pointer_move(pos2(220.0, 170.0), &c) else {
            panic!("expected a resize");
        };
        assert_eq!(rect, Rect::from_min_max(pos2(100.0, 100.0), pos2(220.0, 170.0)));
    }

    #[test]
    fn rotation_snaps_with_shift() {
        let mut scene = Scene::new();
        let id = filled_rect(&mut scene);
        let config = ToolConfig::default();
        let mut tool = SelectionTool::new();
        let c = ctx(&scene, &config, Some(id), true);
        // Rotation handle sits 30px above the top edge's midpoint
        assert_eq!(tool.on_pointer_down(pos2(150.0, 70.0), &c), None);
        let Some(Command::SetRotation { degrees, .. }) = tool.on_pointer_move(pos2(200.0, 80.0), &c) else {
            panic!("expected a rotation");
        };
        assert_eq!(degrees % ROTATE_STEP_DEGREES, 0.0);
        assert!(degrees > 0.0);
    }
}
