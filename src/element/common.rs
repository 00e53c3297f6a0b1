use egui::{Pos2, Rect, Vec2};

use crate::error::ElementError;

// Common constants for all element types
pub const MIN_ELEMENT_SIZE: f32 = 2.0;
pub const STROKE_HIT_PADDING: f32 = 4.0;

/// Validates that a rectangle has minimum dimensions
pub(crate) fn validate_rect(rect: &Rect) -> Result<(), ElementError> {
    if rect.width() < MIN_ELEMENT_SIZE || rect.height() < MIN_ELEMENT_SIZE {
        Err(ElementError::TooSmall {
            min: MIN_ELEMENT_SIZE,
            width: rect.width(),
            height: rect.height(),
        })
    } else {
        Ok(())
    }
}

/// Calculate distance from a point to a line segment (useful for stroke hit testing)
pub(crate) fn distance_to_line_segment(point: Pos2, line_start: Pos2, line_end: Pos2) -> f32 {
    let line_vec = line_end - line_start;
    let point_vec = point - line_start;

    let line_len = line_vec.length();
    if line_len == 0.0 {
        return point_vec.length();
    }

    let t = ((point_vec.x * line_vec.x + point_vec.y * line_vec.y) / line_len).clamp(0.0, line_len);
    let projection = line_start + (line_vec * t / line_len);
    (point - projection).length()
}

/// Calculate the bounding box for a set of points
pub(crate) fn calculate_bounds(points: &[Pos2], padding: f32) -> Rect {
    if points.is_empty() {
        return Rect::NOTHING;
    }

    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;

    for point in points {
        min_x = min_x.min(point.x);
        min_y = min_y.min(point.y);
        max_x = max_x.max(point.x);
        max_y = max_y.max(point.y);
    }

    Rect::from_min_max(
        Pos2::new(min_x - padding, min_y - padding),
        Pos2::new(max_x + padding, max_y + padding),
    )
}

/// Map points proportionally from one bounding rect into another.
///
/// Degenerate axes (a horizontal line has zero height) keep their offset.
pub(crate) fn remap_points(points: &mut [Pos2], old_rect: Rect, new_rect: Rect) {
    for point in points {
        point.x = remap_axis(point.x, old_rect.min.x, old_rect.width(), new_rect.min.x, new_rect.width());
        point.y = remap_axis(point.y, old_rect.min.y, old_rect.height(), new_rect.min.y, new_rect.height());
    }
}

fn remap_axis(value: f32, old_min: f32, old_len: f32, new_min: f32, new_len: f32) -> f32 {
    if old_len <= f32::EPSILON {
        new_min + (value - old_min)
    } else {
        new_min + (value - old_min) / old_len * new_len
    }
}

/// Rotate `point` around `center` by `degrees` (clockwise on screen, y down).
pub fn rotate_point(point: Pos2, center: Pos2, degrees: f32) -> Pos2 {
    if degrees == 0.0 {
        return point;
    }
    let (sin, cos) = degrees.to_radians().sin_cos();
    let d = point - center;
    center + Vec2::new(d.x * cos - d.y * sin, d.x * sin + d.y * cos)
}

/// Corner points of a rect after rotation around its center.
pub fn rotated_corners(rect: Rect, degrees: f32) -> [Pos2; 4] {
    let c = rect.center();
    [
        rotate_point(rect.left_top(), c, degrees),
        rotate_point(rect.right_top(), c, degrees),
        rotate_point(rect.right_bottom(), c, degrees),
        rotate_point(rect.left_bottom(), c, degrees),
    ]
}

pub(crate) fn normalize_degrees(degrees: f32) -> f32 {
    let d = degrees.rem_euclid(360.0);
    if (d - 360.0).abs() < 1e-4 { 0.0 } else { d }
}
