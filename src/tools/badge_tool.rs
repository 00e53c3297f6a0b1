use egui::Pos2;

use super::{Tool, ToolContext};
use crate::command::Command;
use crate::element::factory;

/// Numbered step markers, committed on press with no drag.
#[derive(Clone, Debug, Default)]
pub struct BadgeTool;

impl BadgeTool {
    pub fn new() -> Self {
        Self
    }
}

impl Tool for BadgeTool {
    fn name(&self) -> &'static str {
        "Badge"
    }

    fn deactivate(&mut self) {}

    fn on_pointer_down(&mut self, pos: Pos2, ctx: &ToolContext<'_>) -> Option<Command> {
        let badge = factory::create_badge(pos, ctx.config.badge_radius, ctx.next_badge, ctx.config.color);
        Some(Command::AddElement(badge))
    }

    fn on_pointer_move(&mut self, _pos: Pos2, _ctx: &ToolContext<'_>) -> Option<Command> {
        None
    }

    fn on_pointer_up(&mut self, _pos: Pos2, _ctx: &ToolContext<'_>) -> Option<Command> {
        None
    }
}
