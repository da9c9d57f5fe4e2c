//! # Horde Common
//!
//! Shared types for the horde combat crates:
//! - Entity ids and a deterministic id allocator
//! - Vector helpers and epsilons over `glam::Vec2`
//! - Collision layers and masks
//! - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod ids;
pub mod layers;
pub mod math;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use crate::layers::*;
    pub use crate::math::*;
}

pub use prelude::*;
