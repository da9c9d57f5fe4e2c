//! Collision-aware motion application.
//!
//! Every position write in the combat core goes through [`move_body`]. Two
//! modes exist: regular movement that stops at whatever the engine reports,
//! and knockback movement that pushes through other enemies but still stops
//! at walls.

use horde_common::{EntityId, Vec2};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::physics::{Body, Collider, CollisionEngine, SweepRequest};

/// Maximum number of sweeps for one [`MoveMode::TunnelPastPeers`] move.
pub const MAX_TUNNEL_ITERATIONS: u32 = 8;

/// Squared length under which a displacement is treated as zero.
const MIN_MOTION_SQ: f32 = 1e-10;

/// How obstructions are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MoveMode {
    /// One sweep; stop at the first obstruction.
    #[default]
    Blocking,
    /// Pass through peers, stop at anything else.
    TunnelPastPeers,
}

/// How a move ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Zero displacement requested; nothing happened
    Idle,
    /// The full displacement was applied
    Free,
    /// Stopped at an obstruction after partial travel
    Blocked(Collider),
    /// The engine could not answer; the displacement was dropped
    Dropped,
    /// Peer tunnelling ran out of sweeps
    IterationLimit,
}

/// Result of [`move_body`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveResult {
    /// Displacement actually applied to the body
    pub applied: Vec2,
    /// How the move ended
    pub outcome: MoveOutcome,
    /// Number of sweeps issued
    pub sweeps: u32,
}

impl MoveResult {
    fn idle() -> Self {
        Self {
            applied: Vec2::ZERO,
            outcome: MoveOutcome::Idle,
            sweeps: 0,
        }
    }

    /// Whether the full displacement went through.
    #[must_use]
    pub fn is_free(&self) -> bool {
        matches!(self.outcome, MoveOutcome::Free)
    }
}

/// Applies `displacement` to `body` according to `mode`.
///
/// Never fails: an engine error drops the displacement.
pub fn move_body<E: CollisionEngine + ?Sized>(
    engine: &E,
    body: &mut Body,
    displacement: Vec2,
    mode: MoveMode,
) -> MoveResult {
    if !displacement.is_finite() || displacement.length_squared() <= MIN_MOTION_SQ {
        return MoveResult::idle();
    }

    match mode {
        MoveMode::Blocking => move_blocking(engine, body, displacement),
        MoveMode::TunnelPastPeers => move_tunnelling(engine, body, displacement),
    }
}

fn move_blocking<E: CollisionEngine + ?Sized>(
    engine: &E,
    body: &mut Body,
    displacement: Vec2,
) -> MoveResult {
    let request = SweepRequest {
        body: &*body,
        motion: displacement,
        exclude: &[],
    };

    let result = match engine.sweep(&request) {
        Ok(result) => result,
        Err(e) => {
            debug!(body = %body.id, "sweep failed, dropping displacement: {e}");
            return MoveResult {
                applied: Vec2::ZERO,
                outcome: MoveOutcome::Dropped,
                sweeps: 1,
            };
        },
    };

    match result.collider {
        None => {
            body.position += displacement;
            MoveResult {
                applied: displacement,
                outcome: MoveOutcome::Free,
                sweeps: 1,
            }
        },
        Some(collider) => {
            body.position += result.travel;
            trace!(body = %body.id, ?collider, "blocked move");
            MoveResult {
                applied: result.travel,
                outcome: MoveOutcome::Blocked(collider),
                sweeps: 1,
            }
        },
    }
}

fn move_tunnelling<E: CollisionEngine + ?Sized>(
    engine: &E,
    body: &mut Body,
    displacement: Vec2,
) -> MoveResult {
    let mut remaining = displacement;
    let mut applied = Vec2::ZERO;
    let mut passed: Vec<EntityId> = Vec::new();

    for sweep in 1..=MAX_TUNNEL_ITERATIONS {
        let request = SweepRequest {
            body: &*body,
            motion: remaining,
            exclude: &passed,
        };

        let result = match engine.sweep(&request) {
            Ok(result) => result,
            Err(e) => {
                debug!(body = %body.id, "sweep failed during knockback: {e}");
                return MoveResult {
                    applied,
                    outcome: MoveOutcome::Dropped,
                    sweeps: sweep,
                };
            },
        };

        body.position += result.travel;
        applied += result.travel;

        match result.collider {
            None => {
                return MoveResult {
                    applied,
                    outcome: MoveOutcome::Free,
                    sweeps: sweep,
                };
            },
            Some(Collider::Peer(peer)) => {
                passed.push(peer);
                remaining = result.remainder;
                if remaining.length_squared() <= MIN_MOTION_SQ {
                    return MoveResult {
                        applied,
                        outcome: MoveOutcome::Free,
                        sweeps: sweep,
                    };
                }
            },
            Some(collider) => {
                trace!(body = %body.id, ?collider, "knockback stopped");
                return MoveResult {
                    applied,
                    outcome: MoveOutcome::Blocked(collider),
                    sweeps: sweep,
                };
            },
        }
    }

    warn!(
        body = %body.id,
        peers = passed.len(),
        "knockback hit the tunnelling sweep limit, dropping the rest"
    );
    MoveResult {
        applied,
        outcome: MoveOutcome::IterationLimit,
        sweeps: MAX_TUNNEL_ITERATIONS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::MockCollision;
    use horde_common::CollisionLayers;

    fn body_at(x: f32, y: f32) -> Body {
        Body::new(EntityId::from_raw(1), Vec2::new(x, y), 8.0, CollisionLayers::enemy())
    }

    #[test]
    fn test_move_mode_default() {
        assert_eq!(MoveMode::default(), MoveMode::Blocking);
    }

    #[test]
    fn test_zero_displacement_is_noop() {
        let engine = MockCollision::new();
        let mut body = body_at(3.0, 4.0);

        let result = move_body(&engine, &mut body, Vec2::ZERO, MoveMode::TunnelPastPeers);

        assert_eq!(result.outcome, MoveOutcome::Idle);
        assert_eq!(body.position, Vec2::new(3.0, 4.0));
        assert_eq!(engine.sweep_calls.get(), 0);
    }

    #[test]
    fn test_blocking_free_applies_full_displacement() {
        let engine = MockCollision::new();
        let mut body = body_at(0.0, 0.0);

        let result = move_body(&engine, &mut body, Vec2::new(10.0, 5.0), MoveMode::Blocking);

        assert!(result.is_free());
        assert_eq!(body.position, Vec2::new(10.0, 5.0));
        assert_eq!(result.sweeps, 1);
    }

    #[test]
    fn test_blocking_applies_partial_travel() {
        let mut engine = MockCollision::new();
        engine.push_hit(0.25, Collider::Peer(EntityId::from_raw(2)));
        let mut body = body_at(0.0, 0.0);

        let result = move_body(&engine, &mut body, Vec2::new(20.0, 0.0), MoveMode::Blocking);

        // Blocking never tunnels, even through peers
        assert_eq!(result.outcome, MoveOutcome::Blocked(Collider::Peer(EntityId::from_raw(2))));
        assert_eq!(body.position, Vec2::new(5.0, 0.0));
        assert_eq!(engine.sweep_calls.get(), 1);
    }

    #[test]
    fn test_engine_unavailable_drops_displacement() {
        let engine = MockCollision::unavailable();
        let mut body = body_at(1.0, 1.0);

        for mode in [MoveMode::Blocking, MoveMode::TunnelPastPeers] {
            let result = move_body(&engine, &mut body, Vec2::new(10.0, 0.0), mode);
            assert_eq!(result.outcome, MoveOutcome::Dropped);
            assert_eq!(body.position, Vec2::new(1.0, 1.0));
        }
    }

    #[test]
    fn test_tunnel_continues_past_peers_with_remainder() {
        let mut engine = MockCollision::new();
        let a = EntityId::from_raw(2);
        let b = EntityId::from_raw(3);
        engine.push_hit(0.5, Collider::Peer(a));
        engine.push_hit(0.5, Collider::Peer(b));
        let mut body = body_at(0.0, 0.0);

        let result = move_body(&engine, &mut body, Vec2::new(40.0, 0.0), MoveMode::TunnelPastPeers);

        // 20 + 10 + remaining 10 free
        assert!(result.is_free());
        assert!((body.position.x - 40.0).abs() < 1e-5);
        assert_eq!(result.sweeps, 3);

        // Each sweep excludes every peer passed so far
        let excludes = engine.excludes_seen.borrow();
        assert_eq!(excludes[0], Vec::<EntityId>::new());
        assert_eq!(excludes[1], vec![a]);
        assert_eq!(excludes[2], vec![a, b]);
    }

    #[test]
    fn test_tunnel_stops_at_static_geometry() {
        let mut engine = MockCollision::new();
        engine.push_hit(0.5, Collider::Peer(EntityId::from_raw(2)));
        engine.push_hit(0.0, Collider::Static);
        let mut body = body_at(0.0, 0.0);

        let result = move_body(&engine, &mut body, Vec2::new(10.0, 0.0), MoveMode::TunnelPastPeers);

        assert_eq!(result.outcome, MoveOutcome::Blocked(Collider::Static));
        assert_eq!(body.position, Vec2::new(5.0, 0.0));
        assert_eq!(result.applied, Vec2::new(5.0, 0.0));
    }

    #[test]
    fn test_tunnel_stops_at_non_peer_body() {
        let mut engine = MockCollision::new();
        let player = EntityId::from_raw(99);
        engine.push_hit(0.3, Collider::Body(player));
        let mut body = body_at(0.0, 0.0);

        let result = move_body(&engine, &mut body, Vec2::new(10.0, 0.0), MoveMode::TunnelPastPeers);

        assert_eq!(result.outcome, MoveOutcome::Blocked(Collider::Body(player)));
        assert!((body.position.x - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_tunnel_iteration_limit() {
        let mut engine = MockCollision::new();
        for i in 0..20 {
            engine.push_hit(0.0, Collider::Peer(EntityId::from_raw(10 + i)));
        }
        let mut body = body_at(0.0, 0.0);

        let result = move_body(&engine, &mut body, Vec2::new(10.0, 0.0), MoveMode::TunnelPastPeers);

        assert_eq!(result.outcome, MoveOutcome::IterationLimit);
        assert_eq!(result.sweeps, MAX_TUNNEL_ITERATIONS);
        assert_eq!(engine.sweep_calls.get(), MAX_TUNNEL_ITERATIONS);
        assert_eq!(body.position, Vec2::ZERO);
    }
}
