//! Turning a (start, current, modifiers) drag into shape geometry.

use egui::{Modifiers, Pos2, Rect, Vec2, vec2};
use std::f32::consts::FRAC_PI_4;

/// Rectangle spanned by a drag.
///
/// Shift forces equal sides using the larger dimension. Alt treats `start` as
/// the center. Both combine.
pub fn drag_rect(start: Pos2, current: Pos2, modifiers: &Modifiers) -> Rect {
    let mut delta = current - start;
    if modifiers.shift {
        let side = delta.x.abs().max(delta.y.abs());
        delta = vec2(side.copysign(delta.x), side.copysign(delta.y));
    }
    if modifiers.alt {
        Rect::from_center_size(start, vec2(delta.x.abs(), delta.y.abs()) * 2.0)
    } else {
        Rect::from_two_pos(start, start + delta)
    }
}

/// End point of a line drag, snapped to the nearest 45 degrees when `snap` is set.
pub fn line_end(start: Pos2, current: Pos2, snap: bool) -> Pos2 {
    let delta = current - start;
    if !snap || delta.length() <= f32::EPSILON {
        return current;
    }
    let angle = (delta.angle() / FRAC_PI_4).round() * FRAC_PI_4;
    start + Vec2::angled(angle) * delta.length()
}

/// Endpoints of a line or arrow drag. With Alt the drag start is the midpoint.
pub fn line_from_drag(start: Pos2, current: Pos2, modifiers: &Modifiers) -> (Pos2, Pos2) {
    let end = line_end(start, current, modifiers.shift);
    if modifiers.alt {
        (start - (end - start), end)
    } else {
        (start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    fn mods(shift: bool, alt: bool) -> Modifiers {
        Modifiers { shift, alt, ..Default::default() }
    }

    #[test]
    fn shift_uses_larger_dimension() {
        let rect = drag_rect(pos2(0.0, 0.0), pos2(120.0, 80.0), &mods(true, false));
        assert_eq!(rect.size(), vec2(120.0, 120.0));
        assert_eq!(rect.min, pos2(0.0, 0.0));
    }

    #[test]
    fn shift_keeps_drag_direction() {
        let rect = drag_rect(pos2(100.0, 100.0), pos2(40.0, 120.0), &mods(true, false));
        assert_eq!(rect, Rect::from_min_max(pos2(40.0, 100.0), pos2(100.0, 160.0)));
    }

    #[test]
    fn alt_anchors_center() {
        let rect = drag_rect(pos2(50.0, 50.0), pos2(70.0, 60.0), &mods(false, true));
        assert_eq!(rect.center(), pos2(50.0, 50.0));
        assert_eq!(rect.size(), vec2(40.0, 20.0));
    }

    #[test]
    fn shift_alt_combine() {
        let rect = drag_rect(pos2(50.0, 50.0), pos2(70.0, 60.0), &mods(true, true));
        assert_eq!(rect.center(), pos2(50.0, 50.0));
        assert_eq!(rect.size(), vec2(40.0, 40.0));
    }

    #[test]
    fn line_snaps_to_diagonal() {
        let end = line_end(pos2(0.0, 0.0), pos2(100.0, 90.0), true);
        assert!((end.x - end.y).abs() < 1e-3);
    }

    #[test]
    fn alt_line_is_centered() {
        let (a, b) = line_from_drag(pos2(10.0, 10.0), pos2(20.0, 10.0), &mods(false, true));
        assert_eq!(a, pos2(0.0, 10.0));
        assert_eq!(b, pos2(20.0, 10.0));
    }
}
