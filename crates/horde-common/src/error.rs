//! Error types shared by the horde crates.
//!
//! The combat core itself never fails a tick: physics errors are caught at
//! the call site and degrade to "no movement" or "no neighbours". They still
//! exist as values so collision engines can report why a query went wrong.

use thiserror::Error;

/// Errors reported by a collision engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PhysicsError {
    /// The engine has no space to query (not initialised or torn down)
    #[error("collision engine unavailable")]
    Unavailable,
}

/// Errors while loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading or writing the file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML for the expected schema
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Serialising the configuration failed
    #[error("serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
