//! Collision layers and masks.
//!
//! A body sits on one or more layers and collides with whatever its mask
//! selects. Queries carry a mask too.

use serde::{Deserialize, Serialize};

/// Layer bit: enemies.
pub const LAYER_ENEMIES: u32 = 0b1;
/// Layer bit: the player body.
pub const LAYER_PLAYER: u32 = 0b10;
/// Layer bit: walls and other static geometry.
pub const LAYER_ENVIRONMENT: u32 = 0b100;

/// Enemies collide with each other, the player and walls.
pub const MASK_ENEMIES: u32 = LAYER_ENEMIES | LAYER_PLAYER | LAYER_ENVIRONMENT;
/// The player collides with enemies and walls.
pub const MASK_PLAYER: u32 = LAYER_ENEMIES | LAYER_ENVIRONMENT;

/// Layer membership plus collision mask of one body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollisionLayers {
    /// Layers this body is on
    pub layer: u32,
    /// Layers this body collides with
    pub mask: u32,
}

impl CollisionLayers {
    /// Creates a layer/mask pair.
    #[must_use]
    pub const fn new(layer: u32, mask: u32) -> Self {
        Self { layer, mask }
    }

    /// Default layers for an enemy body.
    #[must_use]
    pub const fn enemy() -> Self {
        Self::new(LAYER_ENEMIES, MASK_ENEMIES)
    }

    /// Default layers for the player body.
    #[must_use]
    pub const fn player() -> Self {
        Self::new(LAYER_PLAYER, MASK_PLAYER)
    }

    /// Whether this body's mask selects any of `layer`.
    #[must_use]
    pub const fn collides_with(self, layer: u32) -> bool {
        self.mask & layer != 0
    }
}

impl Default for CollisionLayers {
    fn default() -> Self {
        Self::enemy()
    }
}
