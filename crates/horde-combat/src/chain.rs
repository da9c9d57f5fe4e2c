//! Chained knockback.
//!
//! One hit knocks back the struck enemy and, with falloff, the enemies lined
//! up behind it along the push direction. Propagation only seeds
//! [`KnockbackState`](crate::knockback::KnockbackState)s; the motion happens
//! when each enemy advances its own state on later ticks.

use horde_common::{clamp01, decompose, normalize_or_none, EntityId, Vec2, DIRECTION_EPSILON_SQ};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::entity::EnemyRegistry;
use crate::knockback::Impulse;

/// Scaled distances at or below this are not worth an impulse.
const MIN_CHAIN_DISTANCE: f32 = 0.01;

/// Chain propagation tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainSettings {
    /// How far ahead of the primary the scan reaches
    pub scan_length: f32,
    /// Half-width of the scan region
    pub scan_radius: f32,
    /// Maximum secondary targets (0 = unlimited)
    pub max_targets: usize,
    /// Strength multiplier applied to the falloff
    pub neighbor_multiplier: f32,
    /// Lower bound on the strength fraction of any chained target
    pub neighbor_min_fraction: f32,
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            scan_length: 96.0,
            scan_radius: 32.0,
            max_targets: 4,
            neighbor_multiplier: 0.75,
            neighbor_min_fraction: 0.25,
        }
    }
}

/// A peer inside the scan region of one propagation call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KnockbackCandidate {
    /// The peer
    pub id: EntityId,
    /// Distance ahead of the primary along the push axis
    pub forward: f32,
    /// Distance from the push axis
    pub lateral: f32,
}

/// A chained impulse that was applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainedHit {
    /// The candidate that received it
    pub candidate: KnockbackCandidate,
    /// Strength fraction of the primary distance
    pub fraction: f32,
    /// Distance of the applied impulse
    pub distance: f32,
}

/// What one propagation call did.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChainReport {
    /// Whether the primary was found and took the full impulse
    pub primary_applied: bool,
    /// Secondary impulses, in application order
    pub chained: Vec<ChainedHit>,
}

impl ChainReport {
    /// Ids of the chained peers, in application order.
    pub fn chained_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.chained.iter().map(|hit| hit.candidate.id)
    }
}

/// Strength fraction for a candidate.
#[must_use]
pub fn chain_fraction(candidate: &KnockbackCandidate, settings: &ChainSettings) -> f32 {
    let falloff_forward = 1.0 - clamp01(candidate.forward / settings.scan_length);
    let falloff_lateral = 1.0 - clamp01(candidate.lateral / settings.scan_radius);
    let falloff = clamp01(falloff_forward * falloff_lateral);
    clamp01(settings.neighbor_min_fraction.max(settings.neighbor_multiplier * falloff))
}

/// Peers ahead of `origin` along `direction` (unit), nearest first.
///
/// Equal forward distances keep registry order.
pub fn collect_candidates<R: EnemyRegistry + ?Sized>(
    registry: &R,
    primary: EntityId,
    origin: Vec2,
    direction: Vec2,
    settings: &ChainSettings,
) -> Vec<KnockbackCandidate> {
    let mut candidates: Vec<KnockbackCandidate> = registry
        .enemy_ids()
        .into_iter()
        .filter(|id| *id != primary)
        .filter_map(|id| {
            let enemy = registry.enemy(id)?;
            let (forward, lateral) = decompose(enemy.position() - origin, direction);
            let inside = forward > 0.0 && forward <= settings.scan_length && lateral <= settings.scan_radius;
            inside.then_some(KnockbackCandidate { id, forward, lateral })
        })
        .collect();

    candidates.sort_by(|a, b| a.forward.total_cmp(&b.forward));
    candidates
}

/// Applies `impulse` to `primary` and scaled copies to the peers ahead of it.
///
/// A missing primary does nothing.
pub fn propagate<R: EnemyRegistry + ?Sized>(
    registry: &mut R,
    primary: EntityId,
    impulse: Impulse,
    settings: &ChainSettings,
) -> ChainReport {
    let mut report = ChainReport::default();

    let Some(enemy) = registry.enemy_mut(primary) else {
        return report;
    };
    report.primary_applied = enemy.knockback.apply_impulse(impulse);
    let origin = enemy.position();

    let Some(direction) = normalize_or_none(impulse.direction, DIRECTION_EPSILON_SQ) else {
        return report;
    };
    if settings.scan_length <= 0.0 || settings.scan_radius <= 0.0 {
        return report;
    }

    for candidate in collect_candidates(&*registry, primary, origin, direction, settings) {
        if settings.max_targets > 0 && report.chained.len() >= settings.max_targets {
            break;
        }

        let fraction = chain_fraction(&candidate, settings);
        let distance = impulse.distance * fraction;
        if distance <= MIN_CHAIN_DISTANCE {
            continue;
        }

        if let Some(peer) = registry.enemy_mut(candidate.id) {
            peer.knockback
                .apply_impulse(Impulse::new(direction, distance, impulse.duration));
            report.chained.push(ChainedHit {
                candidate,
                fraction,
                distance,
            });
        }
    }

    if !report.chained.is_empty() {
        debug!(
            %primary,
            chained = report.chained.len(),
            distance = impulse.distance,
            "knockback chained"
        );
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;
    use crate::enemy::EnemySettings;

    fn arena_with(positions: &[Vec2]) -> (Arena, Vec<EntityId>) {
        let mut arena = Arena::new();
        let settings = EnemySettings::default();
        let ids = positions
            .iter()
            .map(|p| arena.spawn_enemy(*p, &settings))
            .collect();
        (arena, ids)
    }

    fn pending(arena: &Arena, id: EntityId) -> Vec2 {
        arena
            .enemy(id)
            .map(|e| e.knockback.pending())
            .expect("enemy exists")
    }

    #[test]
    fn test_primary_always_receives_full_impulse() {
        let (mut arena, ids) = arena_with(&[Vec2::ZERO]);

        let report = propagate(
            &mut arena,
            ids[0],
            Impulse::new(Vec2::new(2.0, 0.0), 48.0, 0.15),
            &ChainSettings::default(),
        );

        assert!(report.primary_applied);
        assert!(report.chained.is_empty());
        assert!((pending(&arena, ids[0]) - Vec2::new(48.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn test_scan_edge_gets_min_fraction() {
        let settings = ChainSettings::default();
        let (mut arena, ids) = arena_with(&[Vec2::ZERO, Vec2::new(settings.scan_length, 0.0)]);

        let report = propagate(&mut arena, ids[0], Impulse::new(Vec2::X, 40.0, 0.0), &settings);

        assert_eq!(report.chained.len(), 1);
        let hit = report.chained[0];
        assert!((hit.fraction - settings.neighbor_min_fraction).abs() < 1e-6);
        assert!((hit.distance - 10.0).abs() < 1e-4);
        assert!((pending(&arena, ids[1]).x - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_fraction_formula() {
        let settings = ChainSettings::default();
        let candidate = KnockbackCandidate {
            id: EntityId::from_raw(1),
            forward: 24.0,
            lateral: 8.0,
        };
        // (1 - 0.25) * (1 - 0.25) * 0.75 = 0.421875
        assert!((chain_fraction(&candidate, &settings) - 0.421_875).abs() < 1e-6);

        let far = KnockbackCandidate {
            forward: 90.0,
            lateral: 30.0,
            ..candidate
        };
        assert!((chain_fraction(&far, &settings) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_max_targets_keeps_nearest() {
        let settings = ChainSettings {
            max_targets: 2,
            ..ChainSettings::default()
        };
        // Registry order deliberately not sorted by distance
        let (mut arena, ids) = arena_with(&[
            Vec2::ZERO,
            Vec2::new(70.0, 0.0),
            Vec2::new(20.0, 5.0),
            Vec2::new(90.0, 0.0),
            Vec2::new(10.0, -3.0),
            Vec2::new(50.0, 0.0),
        ]);

        let report = propagate(&mut arena, ids[0], Impulse::new(Vec2::X, 30.0, 0.2), &settings);

        let chained: Vec<EntityId> = report.chained_ids().collect();
        assert_eq!(chained, vec![ids[4], ids[2]]);
        for id in [ids[1], ids[3], ids[5]] {
            assert_eq!(pending(&arena, id), Vec2::ZERO);
        }
        assert!(arena.enemy(ids[4]).is_some_and(|e| e.knockback.is_active()));
        assert!(arena.enemy(ids[2]).is_some_and(|e| e.knockback.is_active()));
    }

    #[test]
    fn test_unlimited_targets() {
        let settings = ChainSettings {
            max_targets: 0,
            ..ChainSettings::default()
        };
        let (mut arena, ids) = arena_with(&[
            Vec2::ZERO,
            Vec2::new(10.0, 0.0),
            Vec2::new(20.0, 0.0),
            Vec2::new(30.0, 0.0),
            Vec2::new(40.0, 0.0),
            Vec2::new(50.0, 0.0),
        ]);

        let report = propagate(&mut arena, ids[0], Impulse::new(Vec2::X, 30.0, 0.2), &settings);
        assert_eq!(report.chained.len(), 5);
    }

    #[test]
    fn test_peers_behind_or_beside_are_not_chained() {
        let (mut arena, ids) = arena_with(&[
            Vec2::ZERO,
            Vec2::new(-20.0, 0.0),
            Vec2::new(0.0, 20.0),
            Vec2::new(30.0, 40.0),
            Vec2::new(120.0, 0.0),
        ]);

        let report = propagate(
            &mut arena,
            ids[0],
            Impulse::new(Vec2::X, 30.0, 0.0),
            &ChainSettings::default(),
        );

        assert!(report.chained.is_empty());
        for id in &ids[1..] {
            assert!(!arena.enemy(*id).is_some_and(|e| e.knockback.is_active()));
        }
    }

    #[test]
    fn test_zero_direction_stops_after_primary() {
        let (mut arena, ids) = arena_with(&[Vec2::ZERO, Vec2::new(10.0, 0.0)]);

        let report = propagate(
            &mut arena,
            ids[0],
            Impulse::new(Vec2::ZERO, 30.0, 0.0),
            &ChainSettings::default(),
        );

        assert!(!report.primary_applied);
        assert!(report.chained.is_empty());
        assert_eq!(pending(&arena, ids[0]), Vec2::ZERO);
    }

    #[test]
    fn test_ignored_impulse_keeps_running_knockback() {
        let (mut arena, ids) = arena_with(&[Vec2::ZERO]);
        let settings = ChainSettings::default();
        propagate(&mut arena, ids[0], Impulse::new(Vec2::Y, 20.0, 0.2), &settings);

        let report = propagate(&mut arena, ids[0], Impulse::new(Vec2::X, 0.0, 0.2), &settings);

        assert!(!report.primary_applied);
        assert!((pending(&arena, ids[0]) - Vec2::new(0.0, 20.0)).length() < 1e-4);
    }

    #[test]
    fn test_degenerate_scan_region_stops_after_primary() {
        let (mut arena, ids) = arena_with(&[Vec2::ZERO, Vec2::new(10.0, 0.0)]);
        let settings = ChainSettings {
            scan_radius: 0.0,
            ..ChainSettings::default()
        };

        let report = propagate(&mut arena, ids[0], Impulse::new(Vec2::X, 30.0, 0.0), &settings);

        assert!(report.chained.is_empty());
        assert!(arena.enemy(ids[0]).is_some_and(|e| e.knockback.is_active()));
    }

    #[test]
    fn test_tiny_scaled_distance_does_not_use_a_slot() {
        let settings = ChainSettings {
            max_targets: 1,
            neighbor_multiplier: 0.0,
            neighbor_min_fraction: 0.0,
            ..ChainSettings::default()
        };
        let (mut arena, ids) = arena_with(&[Vec2::ZERO, Vec2::new(10.0, 0.0), Vec2::new(20.0, 0.0)]);

        let report = propagate(&mut arena, ids[0], Impulse::new(Vec2::X, 30.0, 0.0), &settings);

        assert!(report.chained.is_empty());
    }

    #[test]
    fn test_propagation_moves_nothing() {
        let (mut arena, ids) = arena_with(&[Vec2::ZERO, Vec2::new(10.0, 0.0)]);

        propagate(
            &mut arena,
            ids[0],
            Impulse::new(Vec2::X, 30.0, 0.0),
            &ChainSettings::default(),
        );

        assert_eq!(arena.enemy(ids[0]).map(|e| e.position()), Some(Vec2::ZERO));
        assert_eq!(
            arena.enemy(ids[1]).map(|e| e.position()),
            Some(Vec2::new(10.0, 0.0))
        );
    }

    #[test]
    fn test_missing_primary_is_noop() {
        let (mut arena, ids) = arena_with(&[Vec2::new(10.0, 0.0)]);
        let report = propagate(
            &mut arena,
            EntityId::from_raw(999),
            Impulse::new(Vec2::X, 30.0, 0.0),
            &ChainSettings::default(),
        );
        assert!(!report.primary_applied);
        assert_eq!(pending(&arena, ids[0]), Vec2::ZERO);
    }

    #[test]
    fn test_equal_forward_keeps_registry_order() {
        let (arena, ids) = arena_with(&[
            Vec2::ZERO,
            Vec2::new(30.0, 10.0),
            Vec2::new(30.0, -10.0),
        ]);

        let candidates = collect_candidates(&arena, ids[0], Vec2::ZERO, Vec2::X, &ChainSettings::default());
        let order: Vec<EntityId> = candidates.iter().map(|c| c.id).collect();
        assert_eq!(order, vec![ids[1], ids[2]]);
    }
}
