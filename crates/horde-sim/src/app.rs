//! Headless arena simulation.
//!
//! A scripted player circles the origin and shoots the nearest enemy while
//! waves of enemies chase it. Everything runs on the fixed timestep.

use anyhow::{ensure, Result};
use horde_combat::{
    enemies_in_circle, Arena, CombatEvent, ContactTracker, Enemy, EnemyTickController,
    EventBus, Health, PlayerHurtbox, Projectile, WaveSpawner,
};
use horde_common::{normalize_or_none, EntityId, Vec2, DIRECTION_EPSILON_SQ};
use tracing::{debug, info, warn};

use crate::config::SimConfig;
use crate::timing::StepClock;

/// Running totals for one simulation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SimStats {
    /// Fixed steps run
    pub ticks: u64,
    /// Enemies spawned
    pub spawned: usize,
    /// Enemies killed
    pub killed: usize,
    /// Experience drops left by killed enemies
    pub xp_dropped: usize,
    /// Most enemies alive at once
    pub peak_alive: usize,
    /// Bullets fired
    pub shots_fired: usize,
    /// Times the player lost hit points
    pub player_hits: usize,
    /// Hits that knocked back more than one enemy
    pub chain_events: usize,
    /// Enemies knocked back by a chain
    pub chained_enemies: usize,
    /// Enemy ticks spent in knockback
    pub knockback_ticks: usize,
    /// Knockback moves that ran out of tunnelling sweeps
    pub iteration_limits: usize,
    /// Combat events lost to a full event bus
    pub events_dropped: usize,
    /// The run ended with the player dead
    pub player_died: bool,
}

impl SimStats {
    fn log_summary(&self, elapsed: f32) {
        info!(
            seconds = elapsed,
            ticks = self.ticks,
            spawned = self.spawned,
            killed = self.killed,
            xp_dropped = self.xp_dropped,
            peak_alive = self.peak_alive,
            shots_fired = self.shots_fired,
            "run finished"
        );
        info!(
            player_hits = self.player_hits,
            player_died = self.player_died,
            chain_events = self.chain_events,
            chained_enemies = self.chained_enemies,
            knockback_ticks = self.knockback_ticks,
            iteration_limits = self.iteration_limits,
            events_dropped = self.events_dropped,
            "combat totals"
        );
    }
}

/// One arena with its player, spawner and bullets.
pub struct Simulation {
    config: SimConfig,
    arena: Arena,
    controller: EnemyTickController,
    spawner: WaveSpawner,
    bus: EventBus,
    contacts: ContactTracker,
    hurtbox: PlayerHurtbox,
    player: EntityId,
    player_health: Health,
    projectiles: Vec<Projectile>,
    shot_cooldown: f32,
    elapsed: f32,
    stats: SimStats,
}

impl Simulation {
    /// Builds the arena described by `config`.
    #[must_use]
    pub fn new(config: SimConfig) -> Self {
        let mut arena = Arena::new();
        for wall in &config.walls {
            arena.add_wall(wall.to_aabb());
        }
        let player = arena.set_player(Self::orbit_position(&config, 0.0), config.combat.player.radius);

        Self {
            controller: EnemyTickController::new(config.combat.separation),
            spawner: WaveSpawner::new(config.combat.spawner.clone()),
            bus: EventBus::default(),
            contacts: ContactTracker::new(),
            hurtbox: config.combat.player.hurtbox(),
            player,
            player_health: Health::new(
                config.combat.player.max_hp,
                config.combat.player.invulnerability_seconds,
            ),
            projectiles: Vec::new(),
            shot_cooldown: 0.0,
            elapsed: 0.0,
            stats: SimStats::default(),
            arena,
            config,
        }
    }

    /// Spawns an enemy that chases the player.
    pub fn spawn_enemy(&mut self, position: Vec2) -> EntityId {
        let id = self.arena.spawn_enemy(position, &self.config.combat.enemy);
        self.arena.set_target(id, Some(self.player));
        self.bus.publish(CombatEvent::EnemySpawned { id, position });
        id
    }

    /// Runs one fixed step. Returns `false` once the player is dead.
    pub fn step(&mut self) -> bool {
        if self.stats.player_died {
            return false;
        }

        let dt = self.config.fixed_dt;
        self.elapsed += dt;
        self.stats.ticks += 1;

        self.move_player();
        self.player_health.tick(dt);
        self.spawn_wave(dt);

        let report = self.arena.step(&self.controller, dt);
        self.stats.knockback_ticks += report.in_knockback;
        self.stats.iteration_limits += report.iteration_limits;

        self.resolve_contacts();
        self.fire(dt);
        self.advance_projectiles(dt);
        self.collect_events();

        self.stats.peak_alive = self.stats.peak_alive.max(self.arena.enemy_count());
        !self.stats.player_died
    }

    fn orbit_position(config: &SimConfig, time: f32) -> Vec2 {
        Vec2::from_angle(time * config.orbit_speed) * config.orbit_radius
    }

    fn player_position(&self) -> Vec2 {
        self.arena.player().map_or(Vec2::ZERO, |body| body.position)
    }

    fn move_player(&mut self) {
        let goal = Self::orbit_position(&self.config, self.elapsed);
        let displacement = goal - self.player_position();
        self.arena.move_player(displacement);
    }

    fn spawn_wave(&mut self, dt: f32) {
        let positions = self
            .spawner
            .tick(dt, Some(self.player_position()), self.arena.enemy_count());
        for position in positions {
            self.spawn_enemy(position);
        }
    }

    fn resolve_contacts(&mut self) {
        let began = self.contacts.update(&self.arena.player_contacts());
        let player_position = self.player_position();

        for contact in &began {
            self.hurtbox.on_contact(
                &mut self.arena,
                &mut self.player_health,
                player_position,
                contact,
                &self.config.combat.chain,
                &self.bus,
            );
        }
    }

    fn fire(&mut self, dt: f32) {
        self.shot_cooldown -= dt;
        if self.shot_cooldown > 0.0 {
            return;
        }

        let origin = self.player_position();
        let range_sq = self.config.shot_range * self.config.shot_range;
        let nearest = self
            .arena
            .enemies()
            .map(Enemy::position)
            .filter(|position| position.distance_squared(origin) <= range_sq)
            .min_by(|a, b| a.distance_squared(origin).total_cmp(&b.distance_squared(origin)));
        let Some(direction) = nearest.and_then(|target| normalize_or_none(target - origin, DIRECTION_EPSILON_SQ))
        else {
            return;
        };

        self.projectiles.push(Projectile::new(
            origin,
            direction * self.config.bullet_speed,
            self.config.bullet_radius,
            self.config.combat.player.bullet_damage,
            self.config.bullet_lifetime,
        ));
        self.shot_cooldown = self.config.shot_interval;
        self.stats.shots_fired += 1;
    }

    fn advance_projectiles(&mut self, dt: f32) {
        for projectile in &mut self.projectiles {
            projectile.advance(dt);
            if self.arena.walls().iter().any(|wall| wall.contains_point(projectile.position)) {
                projectile.lifetime = 0.0;
                continue;
            }

            for struck in enemies_in_circle(&self.arena, projectile.position, projectile.radius) {
                if projectile.hit(&mut self.arena, struck, &self.bus).is_some() {
                    break;
                }
            }
        }
        self.projectiles.retain(|projectile| !projectile.is_spent());
    }

    fn collect_events(&mut self) {
        self.stats.events_dropped = self.bus.dropped_count();
        for event in self.bus.drain() {
            match event {
                CombatEvent::EnemySpawned { .. } => self.stats.spawned += 1,
                CombatEvent::EnemyDied { id, position } => {
                    self.stats.killed += 1;
                    self.stats.xp_dropped += 1;
                    debug!(enemy = %id, ?position, "xp dropped");
                },
                CombatEvent::PlayerDamaged { hp, max_hp } => {
                    self.stats.player_hits += 1;
                    debug!(hp, max_hp, "player hit");
                },
                CombatEvent::PlayerDied => {
                    self.stats.player_died = true;
                    warn!(seconds = self.elapsed, "player died");
                },
                CombatEvent::KnockbackChained { primary, secondary } => {
                    self.stats.chain_events += 1;
                    self.stats.chained_enemies += secondary.len();
                    debug!(enemy = %primary, chained = secondary.len(), "knockback chained");
                },
            }
        }
    }

    fn log_progress(&self) {
        info!(
            seconds = self.elapsed,
            alive = self.arena.enemy_count(),
            hp = self.player_health.hp(),
            killed = self.stats.killed,
            "progress"
        );
    }
}

#[cfg(test)]
impl Simulation {
    /// Totals so far.
    #[must_use]
    pub fn stats(&self) -> &SimStats {
        &self.stats
    }

    /// The arena.
    #[must_use]
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// The player's health.
    #[must_use]
    pub fn player_health(&self) -> &Health {
        &self.player_health
    }

    /// Bullets in flight.
    #[must_use]
    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }
}

/// Runs the simulation described by `config` and returns its totals.
pub fn run(config: SimConfig) -> Result<SimStats> {
    ensure!(
        config.fixed_dt.is_finite() && config.fixed_dt > 0.0,
        "fixed_dt must be positive, got {}",
        config.fixed_dt
    );

    let total_ticks = config.total_ticks();
    let report_every = if config.report_interval_seconds > 0.0 {
        ((config.report_interval_seconds / config.fixed_dt).round() as u64).max(1)
    } else {
        u64::MAX
    };
    let realtime = config.realtime;
    let mut clock = StepClock::new(config.fixed_dt);
    let mut sim = Simulation::new(config);

    info!(ticks = total_ticks, fixed_dt = clock.fixed_dt(), realtime, "simulation starting");

    let advance = |sim: &mut Simulation| -> bool {
        if sim.stats.ticks >= total_ticks || !sim.step() {
            return false;
        }
        if sim.stats.ticks % report_every == 0 {
            sim.log_progress();
        }
        true
    };

    if realtime {
        clock.reset();
        'run: loop {
            let dt = clock.delta_time();
            for _ in 0..clock.accumulate(dt) {
                if !advance(&mut sim) {
                    break 'run;
                }
            }
            clock.sleep_until_next();
        }
    } else {
        while advance(&mut sim) {}
    }

    sim.stats.log_summary(sim.elapsed);
    Ok(sim.stats)
}
