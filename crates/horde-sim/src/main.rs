//! # Horde Sim
//!
//! Headless driver for the horde combat core. Runs a scripted arena for a
//! configured number of seconds and logs what happened.
//!
//! Usage: `horde-sim [config.toml]` (defaults to `horde.toml`).

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod app;
mod config;
mod timing;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{SimConfig, CONFIG_FILE};

/// Main entry point.
fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive("horde_sim=info".parse()?)
                .add_directive("horde_combat=info".parse()?),
        )
        .init();

    info!("Horde sim starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let path = std::env::args().nth(1).unwrap_or_else(|| CONFIG_FILE.to_string());
    let config = SimConfig::load_from(&path);

    let stats = app::run(config)?;

    info!(
        survived = !stats.player_died,
        killed = stats.killed,
        "Horde sim shutdown complete"
    );
    Ok(())
}
