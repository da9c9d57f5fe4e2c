//! # Horde Combat
//!
//! Enemy combat core for a top-down action game.
//!
//! This crate decides how enemies move under the combined influence of:
//! - Seek steering toward a target
//! - Knockback impulses, instantaneous or eased over several ticks
//! - Chained knockback into the enemies behind a struck one
//! - Separation from nearby enemies
//! - Solid-geometry collision, through a [`CollisionEngine`]
//!
//! Around that core sit the bookkeeping pieces: health counters, the
//! player's hurtbox, projectile hits, a wave spawner, an event bus and an
//! in-process [`Arena`] that implements the collision and registry traits.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod arena;
pub mod chain;
pub mod collision_response;
pub mod config;
pub mod contact;
pub mod enemy;
pub mod entity;
pub mod events;
pub mod health;
pub mod knockback;
pub mod physics;
pub mod separation;
pub mod spawn;
pub mod steering;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::arena::*;
    pub use crate::chain::*;
    pub use crate::collision_response::*;
    pub use crate::config::*;
    pub use crate::contact::*;
    pub use crate::enemy::*;
    pub use crate::entity::*;
    pub use crate::events::*;
    pub use crate::health::*;
    pub use crate::knockback::*;
    pub use crate::physics::*;
    pub use crate::separation::*;
    pub use crate::spawn::*;
    pub use crate::steering::*;
}

pub use prelude::*;
