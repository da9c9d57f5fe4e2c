//! In-process collision world.
//!
//! [`Arena`] keeps circle bodies (enemies and the player) and axis-aligned
//! walls, answers swept-move and overlap queries, and doubles as the enemy
//! registry. A host game with its own physics library implements
//! [`CollisionEngine`] and [`EnemyRegistry`] instead.

use horde_common::{
    CollisionLayers, EntityId, IdAllocator, PhysicsError, Vec2, LAYER_ENEMIES, LAYER_ENVIRONMENT,
};
use tracing::{debug, warn};

use crate::collision_response::{move_body, MoveMode, MoveResult};
use crate::contact::ContactEvent;
use crate::enemy::{Enemy, EnemySettings, EnemyTickController, TickPhase};
use crate::entity::{EnemyRegistry, EnemyStore};
use crate::physics::{Aabb, Body, Collider, CollisionEngine, OverlapQuery, SweepRequest, SweepResult};

/// Gap left between a mover and whatever stopped it.
pub const DEFAULT_SKIN: f32 = 0.01;

/// Extra reach of an enemy's hitbox beyond its body, for player contacts.
pub const DEFAULT_CONTACT_MARGIN: f32 = 2.0;

/// What one [`Arena::step`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Enemies advanced
    pub ticked: usize,
    /// Of those, how many were in knockback
    pub in_knockback: usize,
    /// Knockback moves that ran out of tunnelling sweeps
    pub iteration_limits: usize,
}

/// Circle-and-box collision world plus enemy registry.
#[derive(Debug, Clone)]
pub struct Arena {
    ids: IdAllocator,
    enemies: EnemyStore,
    player: Option<Body>,
    walls: Vec<Aabb>,
    available: bool,
    skin: f32,
    contact_margin: f32,
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl Arena {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ids: IdAllocator::new(),
            enemies: EnemyStore::new(),
            player: None,
            walls: Vec::new(),
            available: true,
            skin: DEFAULT_SKIN,
            contact_margin: DEFAULT_CONTACT_MARGIN,
        }
    }

    /// Makes every query fail with [`PhysicsError::Unavailable`] while `false`.
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    /// Adds a wall.
    pub fn add_wall(&mut self, wall: Aabb) {
        self.walls.push(wall);
    }

    /// Returns the walls.
    #[must_use]
    pub fn walls(&self) -> &[Aabb] {
        &self.walls
    }

    /// Spawns an enemy and returns its id.
    pub fn spawn_enemy(&mut self, position: Vec2, settings: &EnemySettings) -> EntityId {
        let id = self.ids.allocate();
        if let Err(e) = self.enemies.insert(Enemy::new(id, position, settings)) {
            warn!("enemy spawn failed: {e}");
        }
        id
    }

    /// Number of live enemies.
    #[must_use]
    pub fn enemy_count(&self) -> usize {
        self.enemies.len()
    }

    /// Iterates live enemies in registry order.
    pub fn enemies(&self) -> impl Iterator<Item = &Enemy> {
        self.enemies.iter()
    }

    /// Places the player, creating it on first use. Returns its id.
    pub fn set_player(&mut self, position: Vec2, radius: f32) -> EntityId {
        let id = match self.player {
            Some(body) => body.id,
            None => self.ids.allocate(),
        };
        self.player = Some(Body::new(id, position, radius, CollisionLayers::player()));
        id
    }

    /// Returns the player body.
    #[must_use]
    pub fn player(&self) -> Option<&Body> {
        self.player.as_ref()
    }

    /// Moves the player with a blocking move.
    pub fn move_player(&mut self, displacement: Vec2) -> Option<MoveResult> {
        let mut body = self.player?;
        let result = move_body(&*self, &mut body, displacement, MoveMode::Blocking);
        self.player = Some(body);
        Some(result)
    }

    /// Sets the target of `id` if it has the target capability.
    pub fn set_target(&mut self, id: EntityId, target: Option<EntityId>) -> bool {
        match self.targetable_mut(id) {
            Some(targetable) => {
                targetable.set_target(target);
                true
            },
            None => false,
        }
    }

    /// Advances every enemy once, in registry order.
    ///
    /// Each enemy is ticked against the arena as it was left by the enemies
    /// before it, then written back.
    pub fn step(&mut self, controller: &EnemyTickController, dt: f32) -> StepReport {
        let mut report = StepReport::default();

        for id in self.enemies.ids() {
            let Some(mut enemy) = self.enemies.get(id).cloned() else {
                continue;
            };
            let tick = controller.tick(&mut enemy, &*self, dt);

            report.ticked += 1;
            if tick.phase == TickPhase::Knockback {
                report.in_knockback += 1;
            }
            if tick.iteration_limited {
                report.iteration_limits += 1;
            }

            if let Some(slot) = self.enemies.get_mut(id) {
                *slot = enemy;
            }
        }

        report
    }

    /// Enemies whose hitbox currently touches the player.
    #[must_use]
    pub fn player_contacts(&self) -> Vec<ContactEvent> {
        let Some(player) = self.player else {
            return Vec::new();
        };

        self.enemies
            .iter()
            .filter_map(|enemy| {
                let offset = enemy.position() - player.position;
                let reach = player.radius + enemy.body.radius + self.contact_margin;
                if offset.length_squared() > reach * reach {
                    return None;
                }
                Some(ContactEvent {
                    initiator: enemy.id(),
                    struck: player.id,
                    point: player.position + offset.normalize_or_zero() * player.radius,
                })
            })
            .collect()
    }

    fn bodies(&self) -> impl Iterator<Item = &Body> {
        self.enemies
            .iter()
            .map(|enemy| &enemy.body)
            .chain(self.player.as_ref())
    }

    fn classify(mover: &Body, other: &Body) -> Collider {
        if mover.layers.layer & other.layers.layer != 0 {
            Collider::Peer(other.id)
        } else {
            Collider::Body(other.id)
        }
    }
}

/// Time of impact in `[0, 1]` of a circle moving by `motion` from `offset`
/// (relative to a fixed circle) against combined radius `radius`.
///
/// Only approaching motion counts; a mover already overlapping and moving
/// away is free.
fn circle_time_of_impact(offset: Vec2, motion: Vec2, radius: f32) -> Option<f32> {
    let a = motion.length_squared();
    let b = 2.0 * offset.dot(motion);
    let c = offset.length_squared() - radius * radius;

    if a <= f32::EPSILON || b >= 0.0 {
        return None;
    }
    if c <= 0.0 {
        return Some(0.0);
    }

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }
    let t = (-b - discriminant.sqrt()) / (2.0 * a);
    (0.0..=1.0).contains(&t).then_some(t)
}

/// Time of impact of a circle against a wall (already expanded by the
/// circle's radius).
fn wall_time_of_impact(wall: &Aabb, origin: Vec2, motion: Vec2) -> Option<f32> {
    if wall.contains_point(origin) {
        return (motion.dot(wall.center() - origin) > 0.0).then_some(0.0);
    }
    wall.segment_entry(origin, motion)
}

impl CollisionEngine for Arena {
    fn sweep(&self, request: &SweepRequest<'_>) -> Result<SweepResult, PhysicsError> {
        if !self.available {
            return Err(PhysicsError::Unavailable);
        }

        let mover = request.body;
        let motion = request.motion;
        let mut earliest: Option<(f32, Collider)> = None;
        let mut consider = |t: f32, collider: Collider| {
            if earliest.map_or(true, |(best, _)| t < best) {
                earliest = Some((t, collider));
            }
        };

        for other in self.bodies() {
            if other.id == mover.id
                || request.exclude.contains(&other.id)
                || !mover.layers.collides_with(other.layers.layer)
            {
                continue;
            }
            let offset = mover.position - other.position;
            if let Some(t) = circle_time_of_impact(offset, motion, mover.radius + other.radius) {
                consider(t, Self::classify(mover, other));
            }
        }

        if mover.layers.collides_with(LAYER_ENVIRONMENT) {
            for wall in &self.walls {
                if let Some(t) = wall_time_of_impact(&wall.expanded(mover.radius), mover.position, motion) {
                    consider(t, Collider::Static);
                }
            }
        }

        let Some((t, collider)) = earliest else {
            return Ok(SweepResult::free(motion));
        };

        let length = motion.length();
        let travel_length = (t * length - self.skin).max(0.0);
        let travel = motion * (travel_length / length);
        Ok(SweepResult::blocked(motion, travel, collider))
    }

    fn intersect_circle(&self, query: &OverlapQuery) -> Result<Vec<EntityId>, PhysicsError> {
        if !self.available {
            return Err(PhysicsError::Unavailable);
        }

        Ok(self
            .bodies()
            .filter(|body| body.id != query.exclude && body.layers.layer & query.mask != 0)
            .filter(|body| {
                let reach = query.radius + body.radius;
                body.position.distance_squared(query.center) < reach * reach
            })
            .map(|body| body.id)
            .take(query.max_results)
            .collect())
    }
}

impl EnemyRegistry for Arena {
    fn enemy_ids(&self) -> Vec<EntityId> {
        self.enemies.ids()
    }

    fn enemy(&self, id: EntityId) -> Option<&Enemy> {
        self.enemies.get(id)
    }

    fn enemy_mut(&mut self, id: EntityId) -> Option<&mut Enemy> {
        self.enemies.get_mut(id)
    }

    fn resolve_target(&self, target: EntityId) -> Option<Vec2> {
        match self.player {
            Some(player) if player.id == target => Some(player.position),
            _ => self.enemies.get(target).map(Enemy::position),
        }
    }

    fn despawn(&mut self, id: EntityId) -> Option<Enemy> {
        match self.enemies.remove(id) {
            Ok(enemy) => Some(enemy),
            Err(e) => {
                debug!("despawn skipped: {e}");
                None
            },
        }
    }
}

/// Enemies overlapping a circle, e.g. a projectile.
#[must_use]
pub fn enemies_in_circle<E: CollisionEngine + ?Sized>(engine: &E, center: Vec2, radius: f32) -> Vec<EntityId> {
    let query = OverlapQuery {
        center,
        radius,
        mask: LAYER_ENEMIES,
        exclude: EntityId::NULL,
        max_results: usize::MAX,
    };
    engine.intersect_circle(&query).unwrap_or_default()
}
