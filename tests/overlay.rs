use annotation_overlay::command::Command;
use annotation_overlay::element::ElementType;
use annotation_overlay::overlay::{CropRect, SpotlightHole, SpotlightParams, derive_crop_mask, derive_spotlight_overlay};
use annotation_overlay::state::{EditorContext, MemorySessionStore, ToolConfig};
use annotation_overlay::tools::ToolKind;
use egui::{Modifiers, Pos2, Rect, pos2, vec2};
use std::sync::Arc;

fn editor() -> EditorContext {
    EditorContext::new(vec2(800.0, 600.0), ToolConfig::default(), Arc::new(MemorySessionStore::new()))
}

fn drag(editor: &mut EditorContext, from: Pos2, to: Pos2) {
    editor.pointer_down(from, Modifiers::default()).unwrap();
    editor.pointer_move(to, Modifiers::default()).unwrap();
    editor.pointer_up(to, Modifiers::default()).unwrap();
}

fn crop_masks(editor: &EditorContext) -> usize {
    editor.scene().iter().filter(|e| matches!(e, ElementType::CropMask(_))).count()
}

#[test]
fn test_regenerated_overlay_is_identical() {
    let canvas = Rect::from_min_size(Pos2::ZERO, vec2(800.0, 600.0));
    let holes = vec![
        SpotlightHole::Circle { left: 10.0, top: 10.0, radius: 40.0 },
        SpotlightHole::Rect { left: 300.0, top: 200.0, width: 120.0, height: 80.0, corner_radius: 16.0 },
    ];
    let params = SpotlightParams::default();

    let a = derive_spotlight_overlay(canvas, &holes, &params).unwrap();
    let b = derive_spotlight_overlay(canvas, &holes, &params).unwrap();
    assert_eq!((a.canvas, &a.holes, a.tint), (b.canvas, &b.holes, b.tint));
    assert_eq!(a.clip_region(), b.clip_region());
    assert!(derive_spotlight_overlay(canvas, &[], &params).is_none());
}

#[test]
fn test_spotlight_undo_restores_holes_and_darkness() {
    let mut editor = editor();
    editor.set_tool(ToolKind::Spotlight);
    drag(&mut editor, pos2(100.0, 100.0), pos2(200.0, 200.0));
    drag(&mut editor, pos2(400.0, 300.0), pos2(500.0, 380.0));
    editor.execute(Command::SetSpotlightDarkness(0.9)).unwrap();
    assert_eq!(editor.overlays().spotlight.darkness, 0.9);

    editor.execute(Command::Undo).unwrap();

    assert_eq!(editor.overlays().holes.len(), 2);
    assert_eq!(editor.overlays().spotlight.darkness, 0.6);
    let overlay = editor.scene().spotlight_overlay().unwrap();
    assert_eq!(overlay.holes, editor.overlays().holes);
    assert_eq!(overlay.tint, SpotlightParams::default().tint());
}

#[test]
fn test_spotlight_overlay_sits_behind_annotations() {
    let mut editor = editor();
    editor.set_tool(ToolKind::Rectangle);
    drag(&mut editor, pos2(10.0, 10.0), pos2(60.0, 60.0));
    editor.set_tool(ToolKind::Spotlight);
    drag(&mut editor, pos2(100.0, 100.0), pos2(200.0, 200.0));

    assert!(matches!(editor.scene().iter().next(), Some(ElementType::SpotlightOverlay(_))));
}

#[test]
fn test_clear_spotlight_removes_overlay() {
    let mut editor = editor();
    editor.set_tool(ToolKind::Spotlight);
    drag(&mut editor, pos2(100.0, 100.0), pos2(200.0, 200.0));
    editor.execute(Command::ClearSpotlight).unwrap();

    assert!(editor.scene().spotlight_overlay().is_none());
    editor.execute(Command::Undo).unwrap();
    assert!(editor.scene().spotlight_overlay().is_some());
}

#[test]
fn test_only_one_crop_at_a_time() {
    let mut editor = editor();
    editor.set_tool(ToolKind::Crop);
    drag(&mut editor, pos2(10.0, 10.0), pos2(110.0, 60.0));
    assert_eq!(editor.crop(), Some(CropRect::new(10.0, 10.0, 100.0, 50.0)));

    // A second crop drag is ignored while one is installed
    drag(&mut editor, pos2(200.0, 200.0), pos2(400.0, 400.0));
    assert_eq!(editor.crop(), Some(CropRect::new(10.0, 10.0, 100.0, 50.0)));
    assert!(editor.preview().is_none());

    // Installing one directly replaces the old one
    editor.execute(Command::SetCrop(CropRect::new(0.0, 0.0, 50.0, 50.0))).unwrap();
    assert_eq!(crop_masks(&editor), 1);
    assert_eq!(editor.scene().crop_mask().unwrap().crop, CropRect::new(0.0, 0.0, 50.0, 50.0));
}

#[test]
fn test_crop_survives_undo_redo() {
    let mut editor = editor();
    editor.set_tool(ToolKind::Crop);
    drag(&mut editor, pos2(10.0, 10.0), pos2(110.0, 60.0));
    let mask_id = editor.scene().crop_mask().unwrap().id;
    editor.set_tool(ToolKind::Rectangle);
    drag(&mut editor, pos2(300.0, 300.0), pos2(400.0, 400.0));

    editor.execute(Command::Undo).unwrap();
    editor.execute(Command::Undo).unwrap();
    assert_eq!(editor.crop(), None);
    assert_eq!(crop_masks(&editor), 0);

    editor.execute(Command::Redo).unwrap();
    assert_eq!(editor.crop(), Some(CropRect::new(10.0, 10.0, 100.0, 50.0)));
    assert_eq!(editor.scene().crop_mask().unwrap().id, mask_id);
    editor.execute(Command::Redo).unwrap();
    assert_eq!(crop_masks(&editor), 1);
    assert_eq!(editor.scene().len(), 2);
}

#[test]
fn test_resize_rederives_overlays() {
    let mut editor = editor();
    editor.execute(Command::SetCrop(CropRect::new(10.0, 10.0, 100.0, 50.0))).unwrap();
    editor.set_tool(ToolKind::Spotlight);
    drag(&mut editor, pos2(100.0, 100.0), pos2(200.0, 200.0));

    editor.set_canvas_size(vec2(1000.0, 700.0));

    let canvas = Rect::from_min_size(Pos2::ZERO, vec2(1000.0, 700.0));
    let expected = derive_crop_mask(canvas, CropRect::new(10.0, 10.0, 100.0, 50.0));
    let mask = editor.scene().crop_mask().unwrap();
    assert_eq!(mask.panels, expected.panels);
    assert_eq!(editor.scene().spotlight_overlay().unwrap().canvas, canvas);
}

#[test]
fn test_clear_crop() {
    let mut editor = editor();
    editor.execute(Command::SetCrop(CropRect::new(10.0, 10.0, 100.0, 50.0))).unwrap();
    editor.execute(Command::ClearCrop).unwrap();
    assert_eq!(editor.crop(), None);
    assert_eq!(crop_masks(&editor), 0);
    assert_eq!(editor.history().len(), 3);
}
