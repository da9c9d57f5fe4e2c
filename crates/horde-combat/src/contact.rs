//! Contact handling: the player's hurtbox and projectile hits.
//!
//! Overlaps are reported once, when they begin, as [`ContactEvent`]s. The
//! handlers here turn them into damage and knockback.

use ahash::AHashSet;
use horde_common::{EntityId, Vec2, DIRECTION_EPSILON_SQ};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chain::{propagate, ChainReport, ChainSettings};
use crate::entity::EnemyRegistry;
use crate::events::{CombatEvent, EventBus};
use crate::health::{DamageOutcome, Health};

/// An overlap that just began.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactEvent {
    /// The entity that moved into contact (an enemy's hitbox)
    pub initiator: EntityId,
    /// The entity that was touched
    pub struck: EntityId,
    /// Contact point
    pub point: Vec2,
}

/// Turns "currently overlapping" snapshots into begin-contact events.
#[derive(Debug, Default, Clone)]
pub struct ContactTracker {
    active: AHashSet<(EntityId, EntityId)>,
}

impl ContactTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds this tick's overlaps; returns the ones that were not
    /// overlapping last tick.
    pub fn update(&mut self, overlaps: &[ContactEvent]) -> Vec<ContactEvent> {
        let current: AHashSet<(EntityId, EntityId)> =
            overlaps.iter().map(|c| (c.initiator, c.struck)).collect();
        let began = overlaps
            .iter()
            .filter(|c| !self.active.contains(&(c.initiator, c.struck)))
            .copied()
            .collect();
        self.active = current;
        began
    }

    /// Number of overlaps currently tracked.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}

/// Result of a hurtbox contact.
#[derive(Debug, Clone, PartialEq)]
pub struct HurtboxOutcome {
    /// What the damage did to the player
    pub damage: DamageOutcome,
    /// Knockback applied to the enemy and its neighbours, if any
    pub knockback: Option<ChainReport>,
}

/// The player's hurtbox.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerHurtbox {
    /// Knockback distance for enemies that touch the player: negative uses
    /// the enemy's own distance, 0 disables, positive overrides
    pub enemy_knockback_distance: f32,
}

impl Default for PlayerHurtbox {
    fn default() -> Self {
        Self {
            enemy_knockback_distance: -1.0,
        }
    }
}

impl PlayerHurtbox {
    /// Creates a hurtbox.
    #[must_use]
    pub fn new(enemy_knockback_distance: f32) -> Self {
        Self {
            enemy_knockback_distance,
        }
    }

    /// Handles `contact` from an enemy hitbox against the player.
    ///
    /// Initiators without the damage capability are ignored. Otherwise the
    /// player takes the damage and the enemy is knocked back away from the
    /// player, chaining into the enemies behind it.
    pub fn on_contact<R: EnemyRegistry + ?Sized>(
        &self,
        registry: &mut R,
        player_health: &mut Health,
        player_position: Vec2,
        contact: &ContactEvent,
        chain: &ChainSettings,
        bus: &EventBus,
    ) -> Option<HurtboxOutcome> {
        let source = registry.damage_source(contact.initiator)?;

        let damage = player_health.take_damage(source.damage);
        match damage {
            DamageOutcome::Damaged { hp } => {
                bus.publish(CombatEvent::PlayerDamaged {
                    hp,
                    max_hp: player_health.max_hp(),
                });
            },
            DamageOutcome::Died => {
                bus.publish(CombatEvent::PlayerDamaged {
                    hp: 0,
                    max_hp: player_health.max_hp(),
                });
                bus.publish(CombatEvent::PlayerDied);
            },
            DamageOutcome::Ignored => {},
        }

        let knockback = self.knock_back(registry, player_position, contact.initiator, chain, bus);
        Some(HurtboxOutcome { damage, knockback })
    }

    fn knock_back<R: EnemyRegistry + ?Sized>(
        &self,
        registry: &mut R,
        player_position: Vec2,
        enemy_id: EntityId,
        chain: &ChainSettings,
        bus: &EventBus,
    ) -> Option<ChainReport> {
        let enemy = registry.enemy(enemy_id)?;
        let direction = enemy.position() - player_position;
        if direction.length_squared() < DIRECTION_EPSILON_SQ {
            return None;
        }
        if self.enemy_knockback_distance == 0.0 {
            return None;
        }
        let distance_override =
            (self.enemy_knockback_distance > 0.0).then_some(self.enemy_knockback_distance);
        let impulse = enemy.knockback_impulse(direction, distance_override);

        let report = propagate(registry, enemy_id, impulse, chain);
        bus.publish_chain(enemy_id, &report);
        Some(report)
    }
}

/// Damages the enemy `struck` by a projectile.
///
/// Damage is at least 1. A lethal hit removes the enemy and publishes
/// [`CombatEvent::EnemyDied`] with its last position. Returns `None` when
/// `struck` is not an enemy, so the projectile can keep flying.
pub fn resolve_projectile_hit<R: EnemyRegistry + ?Sized>(
    registry: &mut R,
    struck: EntityId,
    damage: i32,
    bus: &EventBus,
) -> Option<DamageOutcome> {
    let enemy = registry.enemy_mut(struck)?;
    let outcome = enemy.health.take_damage(damage.max(1));

    if outcome == DamageOutcome::Died {
        if let Some(dead) = registry.despawn(struck) {
            debug!(enemy = %struck, position = ?dead.position(), "enemy killed");
            bus.publish(CombatEvent::EnemyDied {
                id: struck,
                position: dead.position(),
            });
        }
    }
    Some(outcome)
}

/// Single-use projectile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projectile {
    /// Current position
    pub position: Vec2,
    /// Velocity in units per second
    pub velocity: Vec2,
    /// Hit radius
    pub radius: f32,
    /// Damage dealt on hit (at least 1)
    pub damage: i32,
    /// Seconds before the projectile expires
    pub lifetime: f32,
    spent: bool,
}

impl Projectile {
    /// Creates a projectile.
    #[must_use]
    pub fn new(position: Vec2, velocity: Vec2, radius: f32, damage: i32, lifetime: f32) -> Self {
        Self {
            position,
            velocity,
            radius,
            damage: damage.max(1),
            lifetime,
            spent: false,
        }
    }

    /// Whether the projectile has hit something or expired.
    #[must_use]
    pub fn is_spent(&self) -> bool {
        self.spent || self.lifetime <= 0.0
    }

    /// Moves the projectile and ages it.
    pub fn advance(&mut self, dt: f32) {
        self.position += self.velocity * dt;
        self.lifetime -= dt;
    }

    /// Applies this projectile to `struck`. Only the first enemy hit counts.
    pub fn hit<R: EnemyRegistry + ?Sized>(
        &mut self,
        registry: &mut R,
        struck: EntityId,
        bus: &EventBus,
    ) -> Option<DamageOutcome> {
        if self.is_spent() {
            return None;
        }
        let outcome = resolve_projectile_hit(registry, struck, self.damage, bus)?;
        self.spent = true;
        Some(outcome)
    }
}
