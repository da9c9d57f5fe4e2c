//! Collision engine interface.
//!
//! The combat core never does raw geometry beyond normalize/dot/clamp. Swept
//! moves and overlap queries are delegated to a [`CollisionEngine`], which a
//! host game backs with its physics library. [`crate::arena::Arena`] is the
//! in-process implementation used by the tests and the headless simulation.

use horde_common::{CollisionLayers, EntityId, PhysicsError, Vec2};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box, used for static geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner
    pub min: Vec2,
    /// Maximum corner
    pub max: Vec2,
}

impl Aabb {
    /// Creates a new AABB from two corners (any order).
    #[must_use]
    pub fn new(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Creates an AABB from center and half-extents.
    #[must_use]
    pub fn from_center(center: Vec2, half_width: f32, half_height: f32) -> Self {
        let half = Vec2::new(half_width.abs(), half_height.abs());
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Returns the center of the AABB.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Expands the AABB by a margin on all sides.
    #[must_use]
    pub fn expanded(&self, margin: f32) -> Self {
        Self {
            min: self.min - Vec2::splat(margin),
            max: self.max + Vec2::splat(margin),
        }
    }

    /// Checks if a point lies strictly inside.
    #[must_use]
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x > self.min.x && point.x < self.max.x && point.y > self.min.y && point.y < self.max.y
    }

    /// Slab test for a segment `origin + motion * t`, `t` in `[0, 1]`.
    ///
    /// Returns the entry time, or `None` if the segment misses or starts
    /// inside the box.
    #[must_use]
    pub fn segment_entry(&self, origin: Vec2, motion: Vec2) -> Option<f32> {
        let mut t_enter = f32::NEG_INFINITY;
        let mut t_exit = f32::INFINITY;

        for axis in 0..2 {
            let (o, d, lo, hi) = (origin[axis], motion[axis], self.min[axis], self.max[axis]);
            if d.abs() < f32::EPSILON {
                if o <= lo || o >= hi {
                    return None;
                }
                continue;
            }
            let t1 = (lo - o) / d;
            let t2 = (hi - o) / d;
            t_enter = t_enter.max(t1.min(t2));
            t_exit = t_exit.min(t1.max(t2));
        }

        if t_enter > t_exit || t_enter < 0.0 || t_enter > 1.0 {
            return None;
        }
        Some(t_enter)
    }
}

/// A circular moving body: what the collision engine needs to sweep it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// Owning entity
    pub id: EntityId,
    /// World position (center)
    pub position: Vec2,
    /// Collision radius
    pub radius: f32,
    /// Layer membership and collision mask
    pub layers: CollisionLayers,
}

impl Body {
    /// Creates a body.
    #[must_use]
    pub fn new(id: EntityId, position: Vec2, radius: f32, layers: CollisionLayers) -> Self {
        Self {
            id,
            position,
            radius: radius.max(0.0),
            layers,
        }
    }
}

/// What stopped a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Collider {
    /// A body sharing a layer with the mover (another enemy, for an enemy)
    Peer(EntityId),
    /// Any other body (the player, for an enemy)
    Body(EntityId),
    /// Static geometry
    Static,
}

/// A swept-move request.
#[derive(Debug, Clone, Copy)]
pub struct SweepRequest<'a> {
    /// The moving body, at its current position
    pub body: &'a Body,
    /// Requested displacement
    pub motion: Vec2,
    /// Bodies to ignore for this sweep
    pub exclude: &'a [EntityId],
}

/// Result of a swept move. The engine does not move anything itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepResult {
    /// Displacement that can be applied safely
    pub travel: Vec2,
    /// Displacement left over after the contact
    pub remainder: Vec2,
    /// Obstruction, if any
    pub collider: Option<Collider>,
}

impl SweepResult {
    /// Unobstructed: the whole motion is travel.
    #[must_use]
    pub fn free(motion: Vec2) -> Self {
        Self {
            travel: motion,
            remainder: Vec2::ZERO,
            collider: None,
        }
    }

    /// Obstructed after `travel`.
    #[must_use]
    pub fn blocked(motion: Vec2, travel: Vec2, collider: Collider) -> Self {
        Self {
            travel,
            remainder: motion - travel,
            collider: Some(collider),
        }
    }

    /// Whether the sweep hit something.
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.collider.is_some()
    }
}

/// A shape-overlap query: a circle tested against bodies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlapQuery {
    /// Circle center
    pub center: Vec2,
    /// Circle radius
    pub radius: f32,
    /// Layers to report
    pub mask: u32,
    /// Body to leave out (the querying entity)
    pub exclude: EntityId,
    /// Maximum number of hits to return
    pub max_results: usize,
}

/// Collision engine interface.
///
/// Both calls are synchronous and read-only. An `Err` means the engine could
/// not answer; callers treat it as "no travel" or "nothing found".
pub trait CollisionEngine {
    /// Sweeps `request.body` along `request.motion`, stopping at the first
    /// obstruction selected by the body's mask.
    fn sweep(&self, request: &SweepRequest<'_>) -> Result<SweepResult, PhysicsError>;

    /// Returns up to `query.max_results` bodies overlapping the query circle.
    fn intersect_circle(&self, query: &OverlapQuery) -> Result<Vec<EntityId>, PhysicsError>;
}

/// Scripted collision engine for unit tests.
///
/// Sweeps pop results off a queue; an empty queue means "free".
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MockCollision {
    sweeps: std::cell::RefCell<std::collections::VecDeque<SweepOutcomeScript>>,
    overlaps: Vec<EntityId>,
    unavailable: bool,
    pub(crate) sweep_calls: std::cell::Cell<u32>,
    pub(crate) excludes_seen: std::cell::RefCell<Vec<Vec<EntityId>>>,
}

/// How a scripted sweep resolves: the fraction of the motion travelled and
/// what was hit.
#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub struct SweepOutcomeScript {
    pub fraction: f32,
    pub collider: Collider,
}

#[cfg(test)]
impl MockCollision {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn push_hit(&mut self, fraction: f32, collider: Collider) {
        self.sweeps
            .get_mut()
            .push_back(SweepOutcomeScript { fraction, collider });
    }

    pub fn set_overlaps(&mut self, ids: Vec<EntityId>) {
        self.overlaps = ids;
    }
}

#[cfg(test)]
impl CollisionEngine for MockCollision {
    fn sweep(&self, request: &SweepRequest<'_>) -> Result<SweepResult, PhysicsError> {
        if self.unavailable {
            return Err(PhysicsError::Unavailable);
        }
        self.sweep_calls.set(self.sweep_calls.get() + 1);
        self.excludes_seen.borrow_mut().push(request.exclude.to_vec());
        match self.sweeps.borrow_mut().pop_front() {
            Some(script) => Ok(SweepResult::blocked(
                request.motion,
                request.motion * script.fraction,
                script.collider,
            )),
            None => Ok(SweepResult::free(request.motion)),
        }
    }

    fn intersect_circle(&self, query: &OverlapQuery) -> Result<Vec<EntityId>, PhysicsError> {
        if self.unavailable {
            return Err(PhysicsError::Unavailable);
        }
        Ok(self
            .overlaps
            .iter()
            .copied()
            .filter(|id| *id != query.exclude)
            .take(query.max_results)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_from_center() {
        let aabb = Aabb::from_center(Vec2::new(10.0, 10.0), 5.0, 10.0);
        assert_eq!(aabb.min, Vec2::new(5.0, 0.0));
        assert_eq!(aabb.max, Vec2::new(15.0, 20.0));
        assert_eq!(aabb.center(), Vec2::new(10.0, 10.0));
    }

    #[test]
    fn test_aabb_new_orders_corners() {
        let aabb = Aabb::new(Vec2::new(10.0, 0.0), Vec2::new(0.0, 10.0));
        assert_eq!(aabb.min, Vec2::ZERO);
        assert_eq!(aabb.max, Vec2::new(10.0, 10.0));
    }

    #[test]
    fn test_aabb_expanded() {
        let aabb = Aabb::new(Vec2::new(5.0, 5.0), Vec2::new(15.0, 15.0)).expanded(2.0);
        assert_eq!(aabb.min, Vec2::new(3.0, 3.0));
        assert_eq!(aabb.max, Vec2::new(17.0, 17.0));
    }

    #[test]
    fn test_segment_entry_hits_front_face() {
        let aabb = Aabb::new(Vec2::new(10.0, -5.0), Vec2::new(20.0, 5.0));
        let t = aabb.segment_entry(Vec2::ZERO, Vec2::new(20.0, 0.0));
        assert_eq!(t, Some(0.5));
    }

    #[test]
    fn test_segment_entry_misses() {
        let aabb = Aabb::new(Vec2::new(10.0, -5.0), Vec2::new(20.0, 5.0));
        // Too short
        assert!(aabb.segment_entry(Vec2::ZERO, Vec2::new(5.0, 0.0)).is_none());
        // Parallel and outside
        assert!(aabb
            .segment_entry(Vec2::new(0.0, 10.0), Vec2::new(30.0, 0.0))
            .is_none());
        // Moving away
        assert!(aabb.segment_entry(Vec2::ZERO, Vec2::new(-30.0, 0.0)).is_none());
    }

    #[test]
    fn test_sweep_result_blocked_remainder() {
        let result = SweepResult::blocked(
            Vec2::new(10.0, 0.0),
            Vec2::new(4.0, 0.0),
            Collider::Static,
        );
        assert!(result.is_blocked());
        assert_eq!(result.remainder, Vec2::new(6.0, 0.0));

        let free = SweepResult::free(Vec2::new(1.0, 2.0));
        assert!(!free.is_blocked());
        assert_eq!(free.remainder, Vec2::ZERO);
    }

    #[test]
    fn test_mock_collision_scripted_sweeps() {
        let mut mock = MockCollision::new();
        mock.push_hit(0.5, Collider::Static);
        let body = Body::new(EntityId::from_raw(1), Vec2::ZERO, 4.0, CollisionLayers::enemy());
        let request = SweepRequest {
            body: &body,
            motion: Vec2::new(10.0, 0.0),
            exclude: &[],
        };

        let first = mock.sweep(&request).expect("mock is available");
        assert_eq!(first.travel, Vec2::new(5.0, 0.0));
        let second = mock.sweep(&request).expect("mock is available");
        assert!(!second.is_blocked());
        assert_eq!(mock.sweep_calls.get(), 2);
    }
}
