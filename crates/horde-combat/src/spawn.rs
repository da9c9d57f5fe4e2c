//! Enemy wave spawning.
//!
//! Waves appear on a circle around the player at a fixed cooldown. The
//! timer pauses while the alive cap is reached.

use horde_common::Vec2;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Default spawn radius around the player.
const DEFAULT_SPAWN_RADIUS: f32 = 600.0;

/// Default time between waves in seconds.
const DEFAULT_COOLDOWN: f32 = 1.5;

/// Default cap on living enemies.
const DEFAULT_MAX_ALIVE: usize = 20;

/// Largest accepted wave.
pub const MAX_WAVE_SIZE: usize = 50;

/// Configuration for the wave spawner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnerSettings {
    /// Distance from the player at which enemies appear
    pub spawn_radius: f32,
    /// Seconds between waves
    pub cooldown: f32,
    /// Seconds before the first wave
    pub initial_delay: f32,
    /// Whether spawning runs at all
    pub enabled: bool,
    /// Enemies per wave
    pub count_per_wave: usize,
    /// Cap on living enemies (0 = unlimited)
    pub max_alive: usize,
    /// RNG seed; `None` seeds from the OS
    pub seed: Option<u64>,
}

impl Default for SpawnerSettings {
    fn default() -> Self {
        Self {
            spawn_radius: DEFAULT_SPAWN_RADIUS,
            cooldown: DEFAULT_COOLDOWN,
            initial_delay: 0.0,
            enabled: true,
            count_per_wave: 1,
            max_alive: DEFAULT_MAX_ALIVE,
            seed: None,
        }
    }
}

/// Timer-driven wave spawner.
#[derive(Debug)]
pub struct WaveSpawner {
    settings: SpawnerSettings,
    time_until_next: f32,
    rng: fastrand::Rng,
}

impl WaveSpawner {
    /// Creates a spawner with the given configuration.
    #[must_use]
    pub fn new(settings: SpawnerSettings) -> Self {
        let rng = settings
            .seed
            .map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed);
        Self {
            time_until_next: settings.initial_delay.max(0.0),
            settings,
            rng,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn settings(&self) -> &SpawnerSettings {
        &self.settings
    }

    /// Enables or disables spawning.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.settings.enabled = enabled;
    }

    /// Seconds until the next wave.
    #[must_use]
    pub fn time_until_next(&self) -> f32 {
        self.time_until_next
    }

    fn at_cap(&self, alive: usize) -> bool {
        self.settings.max_alive > 0 && alive >= self.settings.max_alive
    }

    /// Enemies in the next wave: `count_per_wave` (at most
    /// [`MAX_WAVE_SIZE`]), truncated to the room left under the alive cap.
    fn wave_size(&self, alive: usize) -> usize {
        let count = self.settings.count_per_wave.min(MAX_WAVE_SIZE);
        if self.settings.max_alive == 0 {
            return count;
        }
        count.min(self.settings.max_alive.saturating_sub(alive))
    }

    /// Advances the timer and returns the positions to spawn at this tick.
    ///
    /// Nothing spawns without a player.
    pub fn tick(&mut self, dt: f32, player: Option<Vec2>, alive: usize) -> Vec<Vec2> {
        let Some(center) = player else {
            return Vec::new();
        };
        if !self.settings.enabled || self.at_cap(alive) {
            return Vec::new();
        }

        self.time_until_next -= dt;
        if self.time_until_next > 0.0 {
            return Vec::new();
        }

        let wave = self.wave_size(alive);
        let mut positions = Vec::with_capacity(wave);
        for _ in 0..wave {
            positions.push(self.point_on_circle(center));
        }

        self.time_until_next = self.settings.cooldown;
        trace!(count = positions.len(), "wave spawned");
        positions
    }

    fn point_on_circle(&mut self, center: Vec2) -> Vec2 {
        let angle = self.rng.f32() * std::f32::consts::TAU;
        center + Vec2::from_angle(angle) * self.settings.spawn_radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(settings: SpawnerSettings) -> WaveSpawner {
        WaveSpawner::new(SpawnerSettings {
            seed: Some(7),
            ..settings
        })
    }

    #[test]
    fn test_spawn_defaults() {
        let settings = SpawnerSettings::default();
        assert_eq!(settings.spawn_radius, 600.0);
        assert_eq!(settings.cooldown, 1.5);
        assert_eq!(settings.max_alive, 20);
        assert!(settings.enabled);
    }

    #[test]
    fn test_first_wave_without_delay() {
        let mut spawner = seeded(SpawnerSettings::default());
        let positions = spawner.tick(1.0 / 60.0, Some(Vec2::new(10.0, -10.0)), 0);

        assert_eq!(positions.len(), 1);
        let offset = positions[0] - Vec2::new(10.0, -10.0);
        assert!((offset.length() - 600.0).abs() < 1e-2);
    }

    #[test]
    fn test_cooldown_between_waves() {
        let mut spawner = seeded(SpawnerSettings::default());
        assert_eq!(spawner.tick(0.1, Some(Vec2::ZERO), 0).len(), 1);
        assert!(spawner.tick(1.0, Some(Vec2::ZERO), 1).is_empty());
        assert_eq!(spawner.tick(0.6, Some(Vec2::ZERO), 1).len(), 1);
    }

    #[test]
    fn test_initial_delay() {
        let mut spawner = seeded(SpawnerSettings {
            initial_delay: 0.5,
            ..SpawnerSettings::default()
        });
        assert!(spawner.tick(0.3, Some(Vec2::ZERO), 0).is_empty());
        assert_eq!(spawner.tick(0.3, Some(Vec2::ZERO), 0).len(), 1);
    }

    #[test]
    fn test_timer_pauses_at_cap() {
        let mut spawner = seeded(SpawnerSettings {
            max_alive: 2,
            initial_delay: 1.0,
            ..SpawnerSettings::default()
        });

        assert!(spawner.tick(5.0, Some(Vec2::ZERO), 2).is_empty());
        assert!((spawner.time_until_next() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_wave_is_truncated_at_cap() {
        let mut spawner = seeded(SpawnerSettings {
            count_per_wave: 5,
            max_alive: 3,
            ..SpawnerSettings::default()
        });
        assert_eq!(spawner.tick(0.1, Some(Vec2::ZERO), 1).len(), 2);
    }

    #[test]
    fn test_oversized_wave_fills_to_cap() {
        let mut spawner = seeded(SpawnerSettings {
            count_per_wave: usize::MAX,
            max_alive: 20,
            ..SpawnerSettings::default()
        });
        assert_eq!(spawner.tick(0.1, Some(Vec2::ZERO), 0).len(), 20);
        assert!(spawner.tick(2.0, Some(Vec2::ZERO), 20).is_empty());

        let mut unlimited = seeded(SpawnerSettings {
            count_per_wave: usize::MAX,
            max_alive: 0,
            ..SpawnerSettings::default()
        });
        assert_eq!(unlimited.tick(0.1, Some(Vec2::ZERO), 0).len(), MAX_WAVE_SIZE);
    }

    #[test]
    fn test_unlimited_alive() {
        let mut spawner = seeded(SpawnerSettings {
            count_per_wave: 4,
            max_alive: 0,
            ..SpawnerSettings::default()
        });
        assert_eq!(spawner.tick(0.1, Some(Vec2::ZERO), 10_000).len(), 4);
    }

    #[test]
    fn test_disabled_or_no_player() {
        let mut spawner = seeded(SpawnerSettings::default());
        assert!(spawner.tick(0.1, None, 0).is_empty());

        spawner.set_enabled(false);
        assert!(spawner.tick(0.1, Some(Vec2::ZERO), 0).is_empty());
    }

    #[test]
    fn test_same_seed_same_positions() {
        let mut a = seeded(SpawnerSettings::default());
        let mut b = seeded(SpawnerSettings::default());
        for _ in 0..5 {
            assert_eq!(a.tick(2.0, Some(Vec2::ZERO), 0), b.tick(2.0, Some(Vec2::ZERO), 0));
        }
    }
}
