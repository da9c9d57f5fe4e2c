//! Neighbour separation.
//!
//! Enemies closer than the separation distance push each other apart. The
//! push is a displacement the caller applies with
//! [`MoveMode::Blocking`](crate::collision_response::MoveMode::Blocking),
//! so it never shoves anyone through a wall.

use horde_common::{normalize_or_none, Vec2, POINT_EPSILON};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::entity::EnemyRegistry;
use crate::physics::{Body, CollisionEngine, OverlapQuery};

/// Separation tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeparationSettings {
    /// Range within which peers repel
    pub distance: f32,
    /// Fraction of the penetration depth turned into displacement
    pub factor: f32,
    /// Maximum peers considered per query
    pub max_results: usize,
}

impl Default for SeparationSettings {
    fn default() -> Self {
        Self {
            distance: 40.0,
            factor: 0.5,
            max_results: 8,
        }
    }
}

/// Sums the repulsion from peers around `body`.
///
/// Peers in knockback and bodies that are not enemies are ignored. A failed
/// query yields zero.
pub fn compute_separation<W>(world: &W, body: &Body, settings: &SeparationSettings) -> Vec2
where
    W: CollisionEngine + EnemyRegistry + ?Sized,
{
    if settings.distance <= 0.0 || settings.max_results == 0 {
        return Vec2::ZERO;
    }

    let query = OverlapQuery {
        center: body.position,
        radius: settings.distance,
        mask: body.layers.layer,
        exclude: body.id,
        max_results: settings.max_results,
    };

    let hits = match world.intersect_circle(&query) {
        Ok(hits) => hits,
        Err(e) => {
            debug!(body = %body.id, "separation query failed: {e}");
            return Vec2::ZERO;
        },
    };

    let mut push = Vec2::ZERO;
    for id in hits {
        if id == body.id {
            continue;
        }
        let Some(peer) = world.enemy(id) else {
            continue;
        };
        if peer.knockback.is_active() {
            continue;
        }

        let mut diff = body.position - peer.position();
        if diff.length() < POINT_EPSILON {
            diff = Vec2::X * POINT_EPSILON;
        }

        let distance = diff.length();
        if distance >= settings.distance {
            continue;
        }

        if let Some(direction) = normalize_or_none(diff, 0.0) {
            push += direction * (settings.distance - distance) * settings.factor;
        }
    }

    push
}
