//! Enemy entities and the per-tick controller.

use horde_common::{CollisionLayers, EntityId, Vec2};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::collision_response::{move_body, MoveMode, MoveOutcome};
use crate::entity::{DamageSource, EnemyRegistry, Targetable};
use crate::health::Health;
use crate::knockback::{Impulse, KnockbackState};
use crate::physics::{Body, CollisionEngine};
use crate::separation::{compute_separation, SeparationSettings};
use crate::steering::desired_velocity;

/// Per-enemy tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemySettings {
    /// Chase speed in units per second
    pub speed: f32,
    /// Hold position this close to the target (0 = never stop)
    pub stop_distance: f32,
    /// Collision radius
    pub radius: f32,
    /// Hit points
    pub max_hp: i32,
    /// Damage dealt to the player on contact
    pub contact_damage: i32,
    /// Knockback distance when bumped off the player
    pub knockback_distance: f32,
    /// Knockback duration (0 = instantaneous)
    pub knockback_duration: f32,
}

impl Default for EnemySettings {
    fn default() -> Self {
        Self {
            speed: 120.0,
            stop_distance: 0.0,
            radius: 10.0,
            max_hp: 3,
            contact_damage: 1,
            knockback_distance: 48.0,
            knockback_duration: 0.15,
        }
    }
}

/// An enemy.
#[derive(Debug, Clone, PartialEq)]
pub struct Enemy {
    /// Collision body; its position is only written through the motion resolver
    pub body: Body,
    /// Current knockback
    pub knockback: KnockbackState,
    /// Hit points
    pub health: Health,
    /// Steering velocity of the last tick
    pub velocity: Vec2,
    target: Option<EntityId>,
    settings: EnemySettings,
}

impl Enemy {
    /// Creates an enemy at `position`.
    #[must_use]
    pub fn new(id: EntityId, position: Vec2, settings: &EnemySettings) -> Self {
        Self {
            body: Body::new(id, position, settings.radius, CollisionLayers::enemy()),
            knockback: KnockbackState::new(),
            health: Health::new(settings.max_hp, 0.0),
            velocity: Vec2::ZERO,
            target: None,
            settings: *settings,
        }
    }

    /// Returns the enemy's id.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.body.id
    }

    /// Returns the enemy's position.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.body.position
    }

    /// Tuning this enemy was spawned with.
    #[must_use]
    pub fn settings(&self) -> &EnemySettings {
        &self.settings
    }

    /// Contact damage capability.
    #[must_use]
    pub fn damage_source(&self) -> DamageSource {
        DamageSource {
            damage: self.settings.contact_damage,
        }
    }

    /// The enemy's own knockback impulse along `direction`.
    ///
    /// `distance_override` replaces the configured distance when given.
    #[must_use]
    pub fn knockback_impulse(&self, direction: Vec2, distance_override: Option<f32>) -> Impulse {
        Impulse::new(
            direction,
            distance_override.unwrap_or(self.settings.knockback_distance),
            self.settings.knockback_duration,
        )
    }
}

impl Targetable for Enemy {
    fn target(&self) -> Option<EntityId> {
        self.target
    }

    fn set_target(&mut self, target: Option<EntityId>) {
        self.target = target;
    }
}

/// Which branch a tick took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickPhase {
    /// Knockback owned the motion
    Knockback,
    /// Seek plus separation
    Steering,
}

/// What one enemy tick did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// Branch taken
    pub phase: TickPhase,
    /// Net displacement this tick
    pub displacement: Vec2,
    /// Knockback tunnelling ran out of sweeps
    pub iteration_limited: bool,
}

/// Per-tick decision function for one enemy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EnemyTickController {
    /// Separation tuning shared by every enemy
    pub separation: SeparationSettings,
}

impl EnemyTickController {
    /// Creates a controller.
    #[must_use]
    pub fn new(separation: SeparationSettings) -> Self {
        Self { separation }
    }

    /// Advances `enemy` by `dt`.
    ///
    /// An active knockback runs exclusively. Otherwise the enemy seeks its
    /// target and then separation nudges it, both as blocking moves.
    pub fn tick<W>(&self, enemy: &mut Enemy, world: &W, dt: f32) -> TickReport
    where
        W: CollisionEngine + EnemyRegistry + ?Sized,
    {
        let start = enemy.body.position;

        if enemy.knockback.is_active() {
            enemy.velocity = Vec2::ZERO;
            let result = enemy.knockback.advance(&mut enemy.body, world, dt);
            return TickReport {
                phase: TickPhase::Knockback,
                displacement: enemy.body.position - start,
                iteration_limited: result.is_some_and(|r| r.outcome == MoveOutcome::IterationLimit),
            };
        }

        let target = enemy.target.and_then(|id| world.resolve_target(id));
        enemy.velocity = desired_velocity(start, target, enemy.settings.speed, enemy.settings.stop_distance);
        move_body(world, &mut enemy.body, enemy.velocity * dt, MoveMode::Blocking);

        let push = compute_separation(world, &enemy.body, &self.separation);
        move_body(world, &mut enemy.body, push, MoveMode::Blocking);

        let displacement = enemy.body.position - start;
        trace!(enemy = %enemy.id(), ?displacement, "steered");
        TickReport {
            phase: TickPhase::Steering,
            displacement,
            iteration_limited: false,
        }
    }
}
