use glam::Vec2;

use super::Rect;

/// Tolerance for the resting-contact check. Snapped edges are exact for
/// integral geometry; this only absorbs float noise from fractional positions.
pub const CONTACT_EPSILON: f32 = 1e-3;

/// Inclusive overlap test: touching edges count as contact.
#[inline]
pub fn collides(a: &Rect, b: &Rect) -> bool {
    a.left() <= b.right() && a.right() >= b.left() && a.top() <= b.bottom() && a.bottom() >= b.top()
}

/// Outcome of resolving one moving box against one obstacle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    /// The moving box after all corrections.
    pub rect: Rect,
    /// Total displacement applied to the moving box.
    pub correction: Vec2,
    /// Horizontal velocity must be zeroed.
    pub stop_x: bool,
    /// Vertical velocity must be zeroed.
    pub stop_y: bool,
    /// The obstacle supports the box (fresh landing or resting contact).
    pub grounded: bool,
}

/// Resolves `moving` against `obstacle` using the box as it was before this
/// tick's displacement (`previous`) to infer the approach direction.
///
/// All four directional hypotheses are tested in order, without early exit,
/// each against the box as corrected by the hypotheses before it:
///
/// 1. landing on top (only while moving down): snap bottom to
///    `obstacle.top + landing_offset`
/// 2. head bump: snap top to `obstacle.bottom`
/// 3. approach from the left: snap right to `obstacle.left`
/// 4. approach from the right: snap left to `obstacle.right`
///
/// Resting contact (bottom already at `obstacle.top + landing_offset`) also
/// reports `grounded`. Returns `None` when the boxes do not overlap.
pub fn resolve(
    moving: Rect,
    previous: Rect,
    obstacle: &Rect,
    velocity: Vec2,
    landing_offset: f32,
) -> Option<Resolution> {
    if !collides(&moving, obstacle) {
        return None;
    }

    let rest_line = obstacle.top() + landing_offset;
    let mut rect = moving;
    let mut stop_x = false;
    let mut stop_y = false;
    let mut grounded = false;

    if previous.bottom() <= obstacle.top() && velocity.y > 0.0 {
        rect = rect.with_bottom(rest_line);
        stop_y = true;
        grounded = true;
    }

    if (rect.bottom() - rest_line).abs() <= CONTACT_EPSILON {
        grounded = true;
    }

    if previous.top() >= obstacle.bottom() {
        rect = rect.with_top(obstacle.bottom());
        stop_y = true;
    }

    if previous.right() <= obstacle.left() {
        rect = rect.with_right(obstacle.left());
        stop_x = true;
    }

    if previous.left() >= obstacle.right() {
        rect = rect.with_left(obstacle.right());
        stop_x = true;
    }

    Some(Resolution {
        rect,
        correction: rect.position() - moving.position(),
        stop_x,
        stop_y,
        grounded,
    })
}
