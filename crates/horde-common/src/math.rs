//! Vector helpers on top of `glam`.
//!
//! The core only ever needs normalize, dot and clamp; everything heavier
//! belongs to the collision engine.

pub use glam::Vec2;

/// Squared length below which a direction or displacement counts as zero.
pub const DIRECTION_EPSILON_SQ: f32 = 1e-4;

/// Distance below which two points are treated as coincident.
pub const POINT_EPSILON: f32 = 1e-3;

/// Normalizes `v`, or returns `None` if its squared length is below `epsilon_sq`.
#[must_use]
pub fn normalize_or_none(v: Vec2, epsilon_sq: f32) -> Option<Vec2> {
    let len_sq = v.length_squared();
    if !len_sq.is_finite() || len_sq < epsilon_sq {
        return None;
    }
    Some(v / len_sq.sqrt())
}

/// Splits `offset` into its signed projection on `axis` and its distance from it.
///
/// `axis` must be a unit vector.
#[must_use]
pub fn decompose(offset: Vec2, axis: Vec2) -> (f32, f32) {
    let forward = offset.dot(axis);
    let lateral = (offset - axis * forward).length();
    (forward, lateral)
}

/// Clamps to `[0, 1]`. NaN maps to 0.
#[must_use]
pub fn clamp01(value: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}
