//! Seek steering.

use horde_common::{normalize_or_none, Vec2, POINT_EPSILON};

/// Velocity that moves `self_pos` toward `target` at `speed`.
///
/// Zero when there is no target, when the target is within a positive
/// `stop_distance`, or when the two points (nearly) coincide.
#[must_use]
pub fn desired_velocity(self_pos: Vec2, target: Option<Vec2>, speed: f32, stop_distance: f32) -> Vec2 {
    let Some(target) = target else {
        return Vec2::ZERO;
    };

    let to_target = target - self_pos;
    if stop_distance > 0.0 && to_target.length() <= stop_distance {
        return Vec2::ZERO;
    }

    normalize_or_none(to_target, POINT_EPSILON * POINT_EPSILON)
        .map_or(Vec2::ZERO, |direction| direction * speed)
}
