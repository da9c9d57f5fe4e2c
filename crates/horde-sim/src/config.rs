//! Simulation configuration.
//!
//! Run length, timing, the scripted player and the arena layout, plus the
//! combat tuning under `[combat]`. Loaded from `horde.toml`.

use horde_combat::{Aabb, CombatConfig};
use horde_common::{ConfigError, Vec2};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Configuration file name.
pub const CONFIG_FILE: &str = "horde.toml";

/// An axis-aligned wall, as two corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WallConfig {
    /// First corner
    pub min: [f32; 2],
    /// Opposite corner
    pub max: [f32; 2],
}

impl WallConfig {
    /// The wall as a box.
    #[must_use]
    pub fn to_aabb(self) -> Aabb {
        Aabb::new(Vec2::from(self.min), Vec2::from(self.max))
    }
}

/// Simulation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    // === Run ===
    /// Simulated seconds
    pub duration_seconds: f32,
    /// Fixed timestep
    pub fixed_dt: f32,
    /// Pace the loop with the wall clock instead of running flat out
    pub realtime: bool,
    /// Seconds between progress log lines
    pub report_interval_seconds: f32,

    // === Scripted player ===
    /// Radius of the player's circular path around the origin
    pub orbit_radius: f32,
    /// Angular speed along that path, radians per second
    pub orbit_speed: f32,
    /// Seconds between shots
    pub shot_interval: f32,
    /// Only enemies this close are shot at
    pub shot_range: f32,
    /// Bullet speed
    pub bullet_speed: f32,
    /// Bullet hit radius
    pub bullet_radius: f32,
    /// Bullet lifetime in seconds
    pub bullet_lifetime: f32,

    // === Arena ===
    /// Static walls
    pub walls: Vec<WallConfig>,

    /// Combat tuning
    pub combat: CombatConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            duration_seconds: 60.0,
            fixed_dt: 1.0 / 60.0,
            realtime: false,
            report_interval_seconds: 10.0,

            orbit_radius: 180.0,
            orbit_speed: 0.5,
            shot_interval: 0.3,
            shot_range: 450.0,
            bullet_speed: 720.0,
            bullet_radius: 4.0,
            bullet_lifetime: 1.2,

            walls: vec![
                WallConfig {
                    min: [260.0, -120.0],
                    max: [300.0, 120.0],
                },
                WallConfig {
                    min: [-300.0, -120.0],
                    max: [-260.0, 120.0],
                },
            ],

            combat: CombatConfig::default(),
        }
    }
}

impl SimConfig {
    /// Parses a TOML document, `[combat]` included, and validates it.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(contents)?;
        config.validate();
        Ok(config)
    }

    /// Loads configuration from a file.
    pub fn try_load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        match Self::try_load_from(path) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            },
            Err(e) => {
                warn!("Failed to load config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    #[allow(dead_code)]
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        self.duration_seconds = self.duration_seconds.clamp(0.0, 3600.0);
        self.fixed_dt = self.fixed_dt.clamp(0.001, 0.1);
        self.report_interval_seconds = self.report_interval_seconds.max(0.0);
        self.orbit_radius = self.orbit_radius.max(0.0);
        self.shot_interval = self.shot_interval.max(0.01);
        self.shot_range = self.shot_range.max(0.0);
        self.bullet_radius = self.bullet_radius.max(0.1);
        self.bullet_lifetime = self.bullet_lifetime.max(0.0);
        self.combat.validate();
    }

    /// Number of fixed steps in the run.
    #[must_use]
    pub fn total_ticks(&self) -> u64 {
        (self.duration_seconds / self.fixed_dt).ceil() as u64
    }
}
