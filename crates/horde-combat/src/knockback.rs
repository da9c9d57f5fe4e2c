//! Per-enemy knockback state machine.
//!
//! An impulse is either instantaneous (delivered in the next `advance`) or
//! eased over a duration at constant speed. Whatever the step size, the sum
//! of requested displacements equals the impulse distance: the last step
//! always flushes whatever is left.

use horde_common::{normalize_or_none, Vec2, DIRECTION_EPSILON_SQ};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::collision_response::{move_body, MoveMode, MoveResult};
use crate::physics::{Body, CollisionEngine};

/// A one-shot knockback request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Impulse {
    /// Push direction (any length, normalized on use)
    pub direction: Vec2,
    /// Total distance to push
    pub distance: f32,
    /// Seconds to spread the push over (0 = instantaneous)
    pub duration: f32,
}

impl Impulse {
    /// Creates an impulse.
    #[must_use]
    pub const fn new(direction: Vec2, distance: f32, duration: f32) -> Self {
        Self {
            direction,
            distance,
            duration,
        }
    }
}

/// Pending knockback of one enemy.
///
/// Empty (inactive) when the pending displacement is zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct KnockbackState {
    pending: Vec2,
    remaining_duration: f32,
    speed: f32,
}

impl KnockbackState {
    /// Creates an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any in-flight knockback with `impulse`.
    ///
    /// Ignored when the distance is not positive or the direction is
    /// (near) zero; the current state is then left untouched. Returns
    /// whether the impulse was taken.
    pub fn apply_impulse(&mut self, impulse: Impulse) -> bool {
        if !impulse.distance.is_finite() || impulse.distance <= 0.0 {
            return false;
        }
        let Some(direction) = normalize_or_none(impulse.direction, DIRECTION_EPSILON_SQ) else {
            return false;
        };

        self.pending = direction * impulse.distance;
        if impulse.duration > 0.0 && impulse.duration.is_finite() {
            self.remaining_duration = impulse.duration;
            self.speed = impulse.distance / impulse.duration;
        } else {
            self.remaining_duration = 0.0;
            self.speed = 0.0;
        }
        true
    }

    /// Whether knockback currently owns the entity's motion.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.pending.length_squared() > DIRECTION_EPSILON_SQ
    }

    /// Displacement not yet applied.
    #[must_use]
    pub fn pending(&self) -> Vec2 {
        self.pending
    }

    /// Seconds left for an eased knockback (0 when instantaneous).
    #[must_use]
    pub fn remaining_duration(&self) -> f32 {
        self.remaining_duration
    }

    /// Push speed in units per second (0 when instantaneous).
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Drops any pending knockback.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Advances the knockback by one tick, moving `body` through peers.
    ///
    /// Returns `None` when inactive.
    pub fn advance<E: CollisionEngine + ?Sized>(
        &mut self,
        body: &mut Body,
        engine: &E,
        dt: f32,
    ) -> Option<MoveResult> {
        if !self.is_active() {
            return None;
        }

        if self.speed <= 0.0 || self.remaining_duration <= 0.0 {
            return Some(self.flush(body, engine));
        }

        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let magnitude = self.pending.length();
        let step = (self.speed * dt).min(magnitude);
        let leftover = magnitude - step;

        if leftover * leftover <= DIRECTION_EPSILON_SQ {
            return Some(self.flush(body, engine));
        }

        self.remaining_duration = (self.remaining_duration - dt).max(0.0);
        if self.remaining_duration <= 0.0 {
            // Out of time with distance outstanding: deliver all of it now.
            return Some(self.flush(body, engine));
        }

        let step_vec = self.pending * (step / magnitude);
        self.pending -= step_vec;
        trace!(body = %body.id, step, leftover, "knockback step");
        Some(move_body(engine, body, step_vec, MoveMode::TunnelPastPeers))
    }

    fn flush<E: CollisionEngine + ?Sized>(&mut self, body: &mut Body, engine: &E) -> MoveResult {
        let displacement = self.pending;
        self.clear();
        move_body(engine, body, displacement, MoveMode::TunnelPastPeers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::MockCollision;
    use horde_common::{CollisionLayers, EntityId};
    use proptest::prelude::*;

    fn body() -> Body {
        Body::new(EntityId::from_raw(1), Vec2::ZERO, 8.0, CollisionLayers::enemy())
    }

    /// Advances until inactive and returns the total displacement.
    fn drain(state: &mut KnockbackState, dt: f32) -> (Vec2, u32) {
        let engine = MockCollision::new();
        let mut body = body();
        let mut ticks = 0;
        while state.is_active() {
            state.advance(&mut body, &engine, dt);
            ticks += 1;
            assert!(ticks < 10_000, "knockback never finished");
        }
        (body.position, ticks)
    }

    #[test]
    fn test_new_state_is_inactive() {
        let state = KnockbackState::new();
        assert!(!state.is_active());
        assert_eq!(state.pending(), Vec2::ZERO);
    }

    #[test]
    fn test_degenerate_impulses_are_ignored() {
        let mut state = KnockbackState::new();

        assert!(!state.apply_impulse(Impulse::new(Vec2::X, 0.0, 0.2)));
        assert!(!state.is_active());

        state.apply_impulse(Impulse::new(Vec2::X, -5.0, 0.2));
        assert!(!state.is_active());

        state.apply_impulse(Impulse::new(Vec2::new(0.005, 0.0), 10.0, 0.2));
        assert!(!state.is_active());

        assert!(!state.apply_impulse(Impulse::new(Vec2::ZERO, 10.0, 0.0)));
        assert!(!state.is_active());

        state.apply_impulse(Impulse::new(Vec2::X, f32::NAN, 0.0));
        assert!(!state.is_active());
    }

    #[test]
    fn test_degenerate_impulse_keeps_running_knockback() {
        let mut state = KnockbackState::new();
        state.apply_impulse(Impulse::new(Vec2::Y, 12.0, 0.3));
        state.apply_impulse(Impulse::new(Vec2::ZERO, 50.0, 0.0));

        assert!(state.is_active());
        assert!((state.pending().y - 12.0).abs() < 1e-5);
    }

    #[test]
    fn test_instantaneous_impulse_moves_in_one_tick() {
        let mut state = KnockbackState::new();
        state.apply_impulse(Impulse::new(Vec2::new(0.0, -2.0), 30.0, 0.0));
        assert_eq!(state.speed(), 0.0);
        assert_eq!(state.remaining_duration(), 0.0);

        let (total, ticks) = drain(&mut state, 1.0 / 60.0);

        assert_eq!(ticks, 1);
        assert!((total - Vec2::new(0.0, -30.0)).length() < 1e-4);
    }

    #[test]
    fn test_timed_impulse_sets_speed() {
        let mut state = KnockbackState::new();
        state.apply_impulse(Impulse::new(Vec2::X, 10.0, 0.5));
        assert!((state.speed() - 20.0).abs() < 1e-5);
        assert!((state.remaining_duration() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_timed_impulse_spreads_over_ticks() {
        let mut state = KnockbackState::new();
        state.apply_impulse(Impulse::new(Vec2::X, 10.0, 0.5));

        let engine = MockCollision::new();
        let mut body = body();
        let first = state
            .advance(&mut body, &engine, 0.1)
            .expect("knockback is active");

        assert!((first.applied.x - 2.0).abs() < 1e-4);
        assert!(state.is_active());
        assert!((state.pending().x - 8.0).abs() < 1e-4);
        assert!((state.remaining_duration() - 0.4).abs() < 1e-5);
    }

    #[test]
    fn test_distance_is_conserved_for_common_step_sizes() {
        for dt in [1.0 / 30.0, 1.0 / 60.0, 1.0 / 10.0] {
            let mut state = KnockbackState::new();
            state.apply_impulse(Impulse::new(Vec2::new(1.0, 1.0), 37.5, 0.25));

            let (total, _) = drain(&mut state, dt);

            assert!(
                (total.length() - 37.5).abs() < 1e-3,
                "dt={dt}: moved {}",
                total.length()
            );
        }
    }

    #[test]
    fn test_step_larger_than_duration_flushes() {
        let mut state = KnockbackState::new();
        state.apply_impulse(Impulse::new(Vec2::X, 10.0, 0.05));

        let (total, ticks) = drain(&mut state, 0.5);

        assert_eq!(ticks, 1);
        assert!((total.x - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_new_impulse_overwrites() {
        let mut state = KnockbackState::new();
        state.apply_impulse(Impulse::new(Vec2::X, 10.0, 0.5));
        state.apply_impulse(Impulse::new(Vec2::Y, 4.0, 0.0));

        let (total, _) = drain(&mut state, 1.0 / 60.0);

        assert!(total.x.abs() < 1e-4);
        assert!((total.y - 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_overwrite_mid_flight_discards_remainder() {
        let engine = MockCollision::new();
        let mut body = body();
        let mut state = KnockbackState::new();
        state.apply_impulse(Impulse::new(Vec2::X, 10.0, 0.5));
        state.advance(&mut body, &engine, 0.1);

        state.apply_impulse(Impulse::new(Vec2::Y, 4.0, 0.0));
        while state.is_active() {
            state.advance(&mut body, &engine, 0.1);
        }

        assert!((body.position.x - 2.0).abs() < 1e-4);
        assert!((body.position.y - 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_zero_dt_makes_no_progress() {
        let engine = MockCollision::new();
        let mut body = body();
        let mut state = KnockbackState::new();
        state.apply_impulse(Impulse::new(Vec2::X, 10.0, 0.5));

        state.advance(&mut body, &engine, 0.0);

        assert!(state.is_active());
        assert_eq!(body.position, Vec2::ZERO);
    }

    #[test]
    fn test_state_drains_even_when_blocked() {
        let mut engine = MockCollision::new();
        engine.push_hit(0.0, crate::physics::Collider::Static);
        let mut body = body();
        let mut state = KnockbackState::new();
        state.apply_impulse(Impulse::new(Vec2::X, 10.0, 0.0));

        state.advance(&mut body, &engine, 1.0 / 60.0);

        assert!(!state.is_active());
        assert_eq!(body.position, Vec2::ZERO);
    }

    proptest! {
        #[test]
        fn prop_total_displacement_matches_distance(
            distance in 0.5f32..400.0,
            duration in 0.0f32..2.0,
            dt in 0.001f32..0.25,
            angle in 0.0f32..std::f32::consts::TAU,
        ) {
            let mut state = KnockbackState::new();
            let direction = Vec2::new(angle.cos(), angle.sin());
            state.apply_impulse(Impulse::new(direction, distance, duration));

            let (total, _) = drain(&mut state, dt);

            prop_assert!((total.length() - distance).abs() <= 1e-3 * distance.max(1.0));
            prop_assert!(total.normalize().dot(direction) > 0.999);
        }
    }
}
