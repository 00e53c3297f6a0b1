use annotation_overlay::command::{Alignment, Command};
use annotation_overlay::element::{Element, ElementType};
use annotation_overlay::presets::FillMode;
use annotation_overlay::state::{EditorContext, MemorySessionStore, ToolConfig};
use annotation_overlay::tools::ToolKind;
use annotation_overlay::CommandError;
use egui::{Color32, Key, Modifiers, Pos2, Rect, pos2, vec2};
use std::sync::Arc;

fn editor() -> EditorContext {
    EditorContext::new(vec2(800.0, 600.0), ToolConfig::default(), Arc::new(MemorySessionStore::new()))
}

/// Draw a rectangle, leaving it selected
fn rectangle(editor: &mut EditorContext, from: Pos2, to: Pos2) -> Rect {
    editor.set_tool(ToolKind::Rectangle);
    editor.pointer_down(from, Modifiers::default()).unwrap();
    editor.pointer_move(to, Modifiers::default()).unwrap();
    editor.pointer_up(to, Modifiers::default()).unwrap();
    editor.selected_element().unwrap().rect()
}

fn selected_rect(editor: &EditorContext) -> Rect {
    editor.selected_element().unwrap().rect()
}

#[test]
fn test_copy_paste_cascades() {
    let mut editor = editor();
    let original = rectangle(&mut editor, pos2(100.0, 100.0), pos2(200.0, 150.0));

    editor.execute(Command::Copy).unwrap();
    editor.execute(Command::Paste).unwrap();
    assert_eq!(selected_rect(&editor).min, original.min + vec2(10.0, 10.0));
    editor.execute(Command::Paste).unwrap();
    assert_eq!(selected_rect(&editor).min, original.min + vec2(20.0, 20.0));

    let ids: Vec<_> = editor.scene().iter().map(|e| e.id()).collect();
    assert_eq!(ids.len(), 3);
    assert!(ids[0] != ids[1] && ids[1] != ids[2]);
}

#[test]
fn test_cut_removes_and_paste_restores() {
    let mut editor = editor();
    rectangle(&mut editor, pos2(100.0, 100.0), pos2(200.0, 150.0));

    editor.execute(Command::Cut).unwrap();
    assert!(editor.scene().is_empty());
    assert_eq!(editor.selection(), None);

    editor.execute(Command::Paste).unwrap();
    assert_eq!(editor.scene().len(), 1);
}

#[test]
fn test_paste_with_empty_clipboard_does_nothing() {
    let mut editor = editor();
    editor.execute(Command::Paste).unwrap();
    assert!(editor.scene().is_empty());
    assert_eq!(editor.history().len(), 1);
}

#[test]
fn test_duplicate_offsets_copy() {
    let mut editor = editor();
    let original = rectangle(&mut editor, pos2(100.0, 100.0), pos2(200.0, 150.0));
    let original_id = editor.selection().unwrap();

    editor.handle_key(Key::D, Modifiers::COMMAND).unwrap();

    assert_ne!(editor.selection(), Some(original_id));
    assert_eq!(selected_rect(&editor), original.translate(vec2(10.0, 10.0)));
}

#[test]
fn test_nudge_with_arrow_keys() {
    let mut editor = editor();
    let original = rectangle(&mut editor, pos2(100.0, 100.0), pos2(200.0, 150.0));

    editor.handle_key(Key::ArrowRight, Modifiers::default()).unwrap();
    editor.handle_key(Key::ArrowDown, Modifiers::SHIFT).unwrap();

    assert_eq!(selected_rect(&editor).min, original.min + vec2(1.0, 10.0));
}

#[test]
fn test_align_to_canvas() {
    let mut editor = editor();
    rectangle(&mut editor, pos2(100.0, 100.0), pos2(200.0, 150.0));

    editor.execute(Command::Align(Alignment::Right)).unwrap();
    assert_eq!(selected_rect(&editor).max.x, 800.0);

    editor.execute(Command::Align(Alignment::VerticalCenter)).unwrap();
    assert_eq!(selected_rect(&editor).center().y, 300.0);

    editor.handle_key(Key::ArrowUp, Modifiers::ALT).unwrap();
    assert_eq!(selected_rect(&editor).min.y, 0.0);
}

#[test]
fn test_rotate_and_flip() {
    let mut editor = editor();
    rectangle(&mut editor, pos2(100.0, 100.0), pos2(200.0, 150.0));

    editor.handle_key(Key::CloseBracket, Modifiers::default()).unwrap();
    editor.handle_key(Key::OpenBracket, Modifiers::ALT).unwrap();
    assert_eq!(editor.selected_element().unwrap().rotation(), 14.0);

    editor.handle_key(Key::H, Modifiers::SHIFT).unwrap();
    let transform = *editor.selected_element().unwrap().transform().unwrap();
    assert!(transform.flip_x);
    assert!(!transform.flip_y);
}

#[test]
fn test_apply_style_restyles_selection() {
    let mut editor = editor();
    rectangle(&mut editor, pos2(100.0, 100.0), pos2(200.0, 150.0));
    editor.config_mut().color = Color32::GREEN;
    editor.config_mut().fill_mode = FillMode::Solid;

    editor.execute(Command::ApplyStyle).unwrap();

    let Some(ElementType::Shape(shape)) = editor.selected_element() else {
        panic!("expected a shape");
    };
    assert_eq!(shape.style.stroke, Color32::GREEN);
    assert_eq!(shape.style.fill, Some(Color32::GREEN));
}

#[test]
fn test_selection_commands_need_a_selection() {
    let mut editor = editor();
    for command in [Command::DeleteSelected, Command::Duplicate, Command::Rotate(15.0), Command::ApplyStyle] {
        assert_eq!(editor.execute(command), Err(CommandError::NoSelection));
    }
}

#[test]
fn test_clear_all_starts_fresh_history() {
    let mut editor = editor();
    rectangle(&mut editor, pos2(100.0, 100.0), pos2(200.0, 150.0));
    editor.set_tool(ToolKind::Spotlight);
    editor.pointer_down(pos2(300.0, 300.0), Modifiers::default()).unwrap();
    editor.pointer_up(pos2(400.0, 400.0), Modifiers::default()).unwrap();

    editor.execute(Command::ClearAll).unwrap();

    assert!(editor.scene().is_empty());
    assert!(editor.overlays().holes.is_empty());
    assert_eq!(editor.history().len(), 1);
    assert!(!editor.history().can_undo());
}

#[test]
fn test_undo_drops_dangling_selection() {
    let mut editor = editor();
    rectangle(&mut editor, pos2(100.0, 100.0), pos2(200.0, 150.0));
    assert!(editor.selection().is_some());

    editor.handle_key(Key::Z, Modifiers::COMMAND).unwrap();
    assert_eq!(editor.selection(), None);

    editor.handle_key(Key::Z, Modifiers::COMMAND | Modifiers::SHIFT).unwrap();
    assert_eq!(editor.scene().len(), 1);
}
