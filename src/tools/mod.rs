use egui::{Modifiers, Pos2};
use serde::{Deserialize, Serialize};

use crate::command::Command;
use crate::element::{ElementType, ObjectId};
use crate::scene::Scene;
use crate::state::ToolConfig;

/// Read-only view of the engine a tool gets for each pointer event
pub struct ToolContext<'a> {
    pub scene: &'a Scene,
    pub config: &'a ToolConfig,
    pub modifiers: Modifiers,
    pub selection: Option<ObjectId>,
    pub editing_text: Option<ObjectId>,
    /// A crop region is already installed
    pub crop_active: bool,
    /// Number the next badge will carry
    pub next_badge: u32,
}

/// Tool trait defines the interface for all canvas tools
pub trait Tool: Send + Sync {
    /// Return the name of the tool
    fn name(&self) -> &'static str;

    /// Called when the tool is selected (activated).
    fn activate(&mut self) {
        // default: do nothing
    }

    /// Called when the tool is deselected. Drops any in-progress gesture
    /// without committing it.
    fn deactivate(&mut self);

    /// Handle pointer press on the canvas.
    fn on_pointer_down(&mut self, pos: Pos2, ctx: &ToolContext<'_>) -> Option<Command>;

    /// Handle pointer movement while the pointer is held down.
    fn on_pointer_move(&mut self, pos: Pos2, ctx: &ToolContext<'_>) -> Option<Command>;

    /// Handle pointer release. Returns the command that finalizes the gesture, if any.
    fn on_pointer_up(&mut self, pos: Pos2, ctx: &ToolContext<'_>) -> Option<Command>;

    /// Transient object shown while a gesture is in progress
    fn preview(&self) -> Option<&ElementType> {
        None
    }

    /// True while a gesture is in progress
    fn is_busy(&self) -> bool {
        false
    }
}

// Tool implementations
mod badge_tool;
pub use badge_tool::BadgeTool;

mod draw_stroke_tool;
pub use draw_stroke_tool::DrawStrokeTool;

mod selection_tool;
pub use selection_tool::{SelectionState, SelectionTool};

mod shape_tool;
pub use shape_tool::{ShapeState, ShapeTool};

mod text_tool;
pub use text_tool::TextTool;

/// Every tool the toolbar offers
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToolKind {
    #[default]
    Select,
    Rectangle,
    Ellipse,
    Line,
    Arrow,
    Freehand,
    Marker,
    Text,
    Badge,
    Blur,
    Spotlight,
    Crop,
}

impl ToolKind {
    pub const ALL: [ToolKind; 12] = [
        ToolKind::Select,
        ToolKind::Rectangle,
        ToolKind::Ellipse,
        ToolKind::Line,
        ToolKind::Arrow,
        ToolKind::Freehand,
        ToolKind::Marker,
        ToolKind::Text,
        ToolKind::Badge,
        ToolKind::Blur,
        ToolKind::Spotlight,
        ToolKind::Crop,
    ];

    /// Tools that hand control back to the select tool after one object
    pub fn reverts_to_select(self) -> bool {
        matches!(self, ToolKind::Rectangle | ToolKind::Ellipse | ToolKind::Line | ToolKind::Arrow)
    }

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::Select => "Select",
            ToolKind::Rectangle => "Rectangle",
            ToolKind::Ellipse => "Ellipse",
            ToolKind::Line => "Line",
            ToolKind::Arrow => "Arrow",
            ToolKind::Freehand => "Freehand",
            ToolKind::Marker => "Marker",
            ToolKind::Text => "Text",
            ToolKind::Badge => "Badge",
            ToolKind::Blur => "Blur",
            ToolKind::Spotlight => "Spotlight",
            ToolKind::Crop => "Crop",
        }
    }
}

/// Enum representing all available tool types
/// This allows us to avoid using Box<dyn Tool> and simplifies memory management
#[derive(Clone, Debug)]
pub enum ToolType {
    Shape(ShapeTool),
    DrawStroke(DrawStrokeTool),
    Text(TextTool),
    Badge(BadgeTool),
    Selection(SelectionTool),
}

impl ToolType {
    pub fn new(kind: ToolKind) -> Self {
        match kind {
            ToolKind::Select => Self::Selection(SelectionTool::new()),
            ToolKind::Freehand => Self::DrawStroke(DrawStrokeTool::new(false)),
            ToolKind::Marker => Self::DrawStroke(DrawStrokeTool::new(true)),
            ToolKind::Text => Self::Text(TextTool::new()),
            ToolKind::Badge => Self::Badge(BadgeTool::new()),
            ToolKind::Rectangle
            | ToolKind::Ellipse
            | ToolKind::Line
            | ToolKind::Arrow
            | ToolKind::Blur
            | ToolKind::Spotlight
            | ToolKind::Crop => Self::Shape(ShapeTool::new(kind)),
        }
    }

    pub fn kind(&self) -> ToolKind {
        match self {
            Self::Shape(tool) => tool.kind(),
            Self::DrawStroke(tool) if tool.is_marker() => ToolKind::Marker,
            Self::DrawStroke(_) => ToolKind::Freehand,
            Self::Text(_) => ToolKind::Text,
            Self::Badge(_) => ToolKind::Badge,
            Self::Selection(_) => ToolKind::Select,
        }
    }
}

impl Default for ToolType {
    fn default() -> Self {
        Self::new(ToolKind::Select)
    }
}

impl Tool for ToolType {
    fn name(&self) -> &'static str {
        match self {
            Self::Shape(tool) => tool.name(),
            Self::DrawStroke(tool) => tool.name(),
            Self::Text(tool) => tool.name(),
            Self::Badge(tool) => tool.name(),
            Self::Selection(tool) => tool.name(),
        }
    }

    fn activate(&mut self) {
        match self {
            Self::Shape(tool) => tool.activate(),
            Self::DrawStroke(tool) => tool.activate(),
            Self::Text(tool) => tool.activate(),
            Self::Badge(tool) => tool.activate(),
            Self::Selection(tool) => tool.activate(),
        }
    }

    fn deactivate(&mut self) {
        match self {
            Self::Shape(tool) => tool.deactivate(),
            Self::DrawStroke(tool) => tool.deactivate(),
            Self::Text(tool) => tool.deactivate(),
            Self::Badge(tool) => tool.deactivate(),
            Self::Selection(tool) => tool.deactivate(),
        }
    }

    fn on_pointer_down(&mut self, pos: Pos2, ctx: &ToolContext<'_>) -> Option<Command> {
        match self {
            Self::Shape(tool) => tool.on_pointer_down(pos, ctx),
            Self::DrawStroke(tool) => tool.on_pointer_down(pos, ctx),
            Self::Text(tool) => tool.on_pointer_down(pos, ctx),
            Self::Badge(tool) => tool.on_pointer_down(pos, ctx),
            Self::Selection(tool) => tool.on_pointer_down(pos, ctx),
        }
    }

    fn on_pointer_move(&mut self, pos: Pos2, ctx: &ToolContext<'_>) -> Option<Command> {
        match self {
            Self::Shape(tool) => tool.on_pointer_move(pos, ctx),
            Self::DrawStroke(tool) => tool.on_pointer_move(pos, ctx),
            Self::Text(tool) => tool.on_pointer_move(pos, ctx),
            Self::Badge(tool) => tool.on_pointer_move(pos, ctx),
            Self::Selection(tool) => tool.on_pointer_move(pos, ctx),
        }
    }

    fn on_pointer_up(&mut self, pos: Pos2, ctx: &ToolContext<'_>) -> Option<Command> {
        match self {
            Self::Shape(tool) => tool.on_pointer_up(pos, ctx),
            Self::DrawStroke(tool) => tool.on_pointer_up(pos, ctx),
            Self::Text(tool) => tool.on_pointer_up(pos, ctx),
            Self::Badge(tool) => tool.on_pointer_up(pos, ctx),
            Self::Selection(tool) => tool.on_pointer_up(pos, ctx),
        }
    }

    fn preview(&self) -> Option<&ElementType> {
        match self {
            Self::Shape(tool) => tool.preview(),
            Self::DrawStroke(tool) => tool.preview(),
            Self::Text(tool) => tool.preview(),
            Self::Badge(tool) => tool.preview(),
            Self::Selection(tool) => tool.preview(),
        }
    }

    fn is_busy(&self) -> bool {
        match self {
            Self::Shape(tool) => tool.is_busy(),
            Self::DrawStroke(tool) => tool.is_busy(),
            Self::Text(tool) => tool.is_busy(),
            Self::Badge(tool) => tool.is_busy(),
            Self::Selection(tool) => tool.is_busy(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_round_trip_through_tool_type() {
        for kind in ToolKind::ALL {
            assert_eq!(ToolType::new(kind).kind(), kind);
        }
    }

    #[test]
    fn only_shape_drawing_tools_revert() {
        assert!(ToolKind::Arrow.reverts_to_select());
        assert!(!ToolKind::Spotlight.reverts_to_select());
        assert!(!ToolKind::Marker.reverts_to_select());
        assert!(!ToolKind::Crop.reverts_to_select());
    }
}
