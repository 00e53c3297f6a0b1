use egui::{Pos2, Rect, Vec2};

use crate::element::{rotate_point, rotated_corners};
use crate::presets::MIN_DRAG_SIZE;

pub const RESIZE_HANDLE_RADIUS: f32 = 15.0;
/// Distance of the rotation handle above the top edge
pub const ROTATE_HANDLE_OFFSET: f32 = 30.0;

/// Represents a corner of a selection box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Interactive handle around the selected element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    Resize(Corner),
    Rotate,
}

/// Canvas positions of every handle for a rect rotated by `rotation` degrees.
pub fn handle_positions(rect: Rect, rotation: f32) -> [(Handle, Pos2); 5] {
    let c = rect.center();
    let rotate_anchor = Pos2::new(c.x, rect.min.y - ROTATE_HANDLE_OFFSET);
    let [tl, tr, br, bl] = rotated_corners(rect, rotation);
    [
        (Handle::Resize(Corner::TopLeft), tl),
        (Handle::Resize(Corner::TopRight), tr),
        (Handle::Resize(Corner::BottomLeft), bl),
        (Handle::Resize(Corner::BottomRight), br),
        (Handle::Rotate, rotate_point(rotate_anchor, c, rotation)),
    ]
}

/// Handle under `pos`, checked in corner order then rotation.
pub fn handle_at(pos: Pos2, rect: Rect, rotation: f32) -> Option<Handle> {
    handle_positions(rect, rotation)
        .into_iter()
        .find(|(_, anchor)| pos.distance(*anchor) <= RESIZE_HANDLE_RADIUS)
        .map(|(handle, _)| handle)
}

/// Rect after dragging `corner` of `original_rect` by `delta` (element-local space).
///
/// The opposite corner stays fixed and neither side shrinks below the minimum
/// drag size.
pub fn resize_rect(original_rect: Rect, corner: Corner, delta: Vec2) -> Rect {
    let mut rect = original_rect;
    match corner {
        Corner::TopLeft => {
            rect.min.x = (original_rect.min.x + delta.x).min(rect.max.x - MIN_DRAG_SIZE);
            rect.min.y = (original_rect.min.y + delta.y).min(rect.max.y - MIN_DRAG_SIZE);
        }
        Corner::TopRight => {
            rect.max.x = (original_rect.max.x + delta.x).max(rect.min.x + MIN_DRAG_SIZE);
            rect.min.y = (original_rect.min.y + delta.y).min(rect.max.y - MIN_DRAG_SIZE);
        }
        Corner::BottomLeft => {
            rect.min.x = (original_rect.min.x + delta.x).min(rect.max.x - MIN_DRAG_SIZE);
            rect.max.y = (original_rect.max.y + delta.y).max(rect.min.y + MIN_DRAG_SIZE);
        }
        Corner::BottomRight => {
            rect.max.x = (original_rect.max.x + delta.x).max(rect.min.x + MIN_DRAG_SIZE);
            rect.max.y = (original_rect.max.y + delta.y).max(rect.min.y + MIN_DRAG_SIZE);
        }
    }
    rect
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::{pos2, vec2};

    #[test]
    fn finds_corner_handles() {
        let rect = Rect::from_min_size(pos2(100.0, 100.0), vec2(100.0, 50.0));
        assert_eq!(handle_at(pos2(102.0, 98.0), rect, 0.0), Some(Handle::Resize(Corner::TopLeft)));
        assert_eq!(handle_at(pos2(200.0, 150.0), rect, 0.0), Some(Handle::Resize(Corner::BottomRight)));
        assert_eq!(handle_at(pos2(150.0, 70.0), rect, 0.0), Some(Handle::Rotate));
        assert_eq!(handle_at(pos2(150.0, 125.0), rect, 0.0), None);
    }

    #[test]
    fn handles_follow_rotation() {
        let rect = Rect::from_center_size(pos2(0.0, 0.0), vec2(100.0, 100.0));
        // A quarter turn moves the top-left corner to where the top-right was
        assert_eq!(handle_at(pos2(50.0, -50.0), rect, 90.0), Some(Handle::Resize(Corner::TopLeft)));
    }

    #[test]
    fn resize_clamps_to_minimum() {
        let rect = Rect::from_min_size(pos2(0.0, 0.0), vec2(50.0, 50.0));
        let resized = resize_rect(rect, Corner::BottomRight, vec2(-100.0, 20.0));
        assert_eq!(resized.width(), MIN_DRAG_SIZE);
        assert_eq!(resized.height(), 70.0);
        assert_eq!(resized.min, pos2(0.0, 0.0));
    }
}
