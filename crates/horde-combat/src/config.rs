//! Combat tuning.
//!
//! Every tunable of the combat core in one TOML-friendly struct. Missing
//! keys take their defaults, so a config file only lists what it changes.

use std::fs;
use std::path::Path;

use horde_common::ConfigError;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::chain::ChainSettings;
use crate::contact::PlayerHurtbox;
use crate::enemy::EnemySettings;
use crate::separation::SeparationSettings;
use crate::spawn::{SpawnerSettings, MAX_WAVE_SIZE};

/// Player tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    /// Hit points
    pub max_hp: i32,
    /// Seconds of invulnerability after a hit
    pub invulnerability_seconds: f32,
    /// Collision radius
    pub radius: f32,
    /// Knockback distance for enemies that touch the player (-1 = the
    /// enemy's own, 0 = none)
    pub enemy_knockback_distance: f32,
    /// Damage per bullet
    pub bullet_damage: i32,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            max_hp: 5,
            invulnerability_seconds: 0.4,
            radius: 12.0,
            enemy_knockback_distance: -1.0,
            bullet_damage: 1,
        }
    }
}

impl PlayerSettings {
    /// The hurtbox described by these settings.
    #[must_use]
    pub fn hurtbox(&self) -> PlayerHurtbox {
        PlayerHurtbox::new(self.enemy_knockback_distance)
    }
}

/// All combat tuning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Enemy tuning
    pub enemy: EnemySettings,
    /// Separation tuning
    pub separation: SeparationSettings,
    /// Chain knockback tuning
    pub chain: ChainSettings,
    /// Player tuning
    pub player: PlayerSettings,
    /// Wave spawner tuning
    pub spawner: SpawnerSettings,
}

impl CombatConfig {
    /// Parses a TOML document.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(contents)?;
        config.validate();
        Ok(config)
    }

    /// Loads configuration from a file.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Saves configuration to a file.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;

        info!("Saved combat config to {}", path.display());
        Ok(())
    }

    /// Clamps values that would make no physical sense.
    ///
    /// Degenerate knockback and scan values are left alone; the core treats
    /// them as no-ops.
    pub fn validate(&mut self) {
        self.enemy.speed = self.enemy.speed.max(0.0);
        self.enemy.radius = self.enemy.radius.max(0.0);
        self.enemy.max_hp = self.enemy.max_hp.max(1);
        self.player.max_hp = self.player.max_hp.max(1);
        self.player.radius = self.player.radius.max(0.0);
        self.player.invulnerability_seconds = self.player.invulnerability_seconds.max(0.0);
        self.player.bullet_damage = self.player.bullet_damage.max(1);
        self.spawner.cooldown = self.spawner.cooldown.max(0.05);
        self.spawner.spawn_radius = self.spawner.spawn_radius.max(0.0);
        self.spawner.count_per_wave = self.spawner.count_per_wave.clamp(1, MAX_WAVE_SIZE);
    }
}
