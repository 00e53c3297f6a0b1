use egui::Pos2;

use super::{Tool, ToolContext};
use crate::command::Command;
use crate::element::{Element, ElementType, TextElement};

/// Click to place text, click an existing text object to edit it again,
/// click anywhere else to finish editing.
#[derive(Clone, Debug, Default)]
pub struct TextTool;

impl TextTool {
    pub fn new() -> Self {
        Self
    }
}

impl Tool for TextTool {
    fn name(&self) -> &'static str {
        "Text"
    }

    fn deactivate(&mut self) {}

    fn on_pointer_down(&mut self, pos: Pos2, ctx: &ToolContext<'_>) -> Option<Command> {
        let hit = ctx.scene.element_at(pos);
        if let Some(editing) = ctx.editing_text {
            return match hit {
                Some(e) if e.id() == editing => None,
                _ => Some(Command::CommitText),
            };
        }
        if let Some(ElementType::Text(text)) = hit {
            return Some(Command::BeginTextEdit(text.id));
        }
        let config = ctx.config;
        let mut text = TextElement::new(pos, String::new(), config.font.clone(), config.color);
        text.opacity = config.opacity;
        text.shadow = config.text_shadow.clone();
        text.outline = config.text_outline.clone();
        Some(Command::PlaceText(text))
    }

    fn on_pointer_move(&mut self, _pos: Pos2, _ctx: &ToolContext<'_>) -> Option<Command> {
        None
    }

    fn on_pointer_up(&mut self, _pos: Pos2, _ctx: &ToolContext<'_>) -> Option<Command> {
        None
    }
}
