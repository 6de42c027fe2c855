//! # Droidfall
//!
//! Runs a headless arena of hostile droids and logs what happened.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

use anyhow::Result;
use droidfall_engine::{app, config::EngineConfig};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Where `--init` writes the default configuration.
const INIT_PATH: &str = "droidfall.toml";

/// Main entry point.
fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("droidfall=info".parse()?))
        .init();

    info!("Droidfall starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut config = match std::env::args_os().nth(1) {
        Some(arg) if arg == "--init" => {
            EngineConfig::default().save_to(INIT_PATH)?;
            return Ok(());
        },
        Some(path) => EngineConfig::load_from(path),
        None => EngineConfig::load(),
    };
    config.validate();

    app::run(&config)?;

    info!("Droidfall shutdown complete");
    Ok(())
}
