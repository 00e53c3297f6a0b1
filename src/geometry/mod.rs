pub mod drag;
pub mod hit_testing;

use egui::{Pos2, Vec2};

use crate::presets::{ArrowHeadStyle, MIN_ARROW_HEAD};

pub use drag::{drag_rect, line_end, line_from_drag};
pub use hit_testing::{Corner, Handle, RESIZE_HANDLE_RADIUS, handle_at, handle_positions, resize_rect};

/// Tip, left and right corners of an arrow head ending at `end`.
///
/// Rebuilt from scratch for every change of the shaft, since the head follows
/// the shaft angle.
pub fn arrow_head(start: Pos2, end: Pos2, stroke_width: f32, style: ArrowHeadStyle) -> [Pos2; 3] {
    let shaft = end - start;
    if shaft.length() <= f32::EPSILON {
        return [end; 3];
    }
    let preset = style.preset();
    let length = (stroke_width * preset.head_length_factor)
        .max(MIN_ARROW_HEAD)
        // Never longer than the shaft itself
        .min(shaft.length());
    let back = (-shaft).angle();
    let spread = preset.head_angle_deg.to_radians();
    [
        end,
        end + Vec2::angled(back + spread) * length,
        end + Vec2::angled(back - spread) * length,
    ]
}

/// Barycentric containment test; points on an edge count as inside.
pub fn point_in_triangle(p: Pos2, [a, b, c]: [Pos2; 3]) -> bool {
    let cross = |o: Pos2, u: Pos2, v: Pos2| (u.x - o.x) * (v.y - o.y) - (u.y - o.y) * (v.x - o.x);
    let d1 = cross(p, a, b);
    let d2 = cross(p, b, c);
    let d3 = cross(p, c, a);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}
