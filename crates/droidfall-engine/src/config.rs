//! Engine configuration.
//!
//! Provides the simulation, arena and droid tuning parameters.
//! Configuration can be loaded from and saved to a TOML file.

use droidfall_common::{DroidfallError, DroidfallResult};
use droidfall_gameplay::{AgentTimings, SpawnTuning};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Configuration file name.
const CONFIG_FILE: &str = "droidfall.toml";

/// Environment variable overriding the configuration path.
const CONFIG_ENV: &str = "DROIDFALL_CONFIG";

/// Engine configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === Simulation ===
    /// Simulation ticks per second
    pub tick_rate: u32,
    /// Simulated run length in seconds
    pub duration_secs: f64,
    /// RNG seed (None = random)
    pub seed: Option<u64>,
    /// Pace ticks against the wall clock
    pub realtime: bool,

    // === Arena ===
    /// Milliseconds between the player's shots (0 = never fires)
    pub fire_interval_ms: f64,
    /// Body parts per droid
    pub fragments_per_droid: usize,
    /// Score at which the game ends (0 = never)
    pub game_over_points: u32,

    // === Droids ===
    /// Spawn tuning
    pub spawn: SpawnTuning,
    /// State machine timings
    pub timings: AgentTimings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            // Simulation
            tick_rate: 60,
            duration_secs: 120.0,
            seed: None,
            realtime: false,

            // Arena
            fire_interval_ms: 1500.0,
            fragments_per_droid: 4,
            game_over_points: 50,

            // Droids
            spawn: SpawnTuning::default(),
            timings: AgentTimings::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from the default file location.
    /// Returns default config if file doesn't exist.
    pub fn load() -> Self {
        Self::load_from(Self::config_path())
    }

    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        match fs::File::open(path) {
            Ok(mut file) => {
                let mut contents = String::new();
                if let Err(e) = file.read_to_string(&mut contents) {
                    warn!("Failed to read config file: {e}");
                    return Self::default();
                }

                match toml::from_str(&contents) {
                    Ok(config) => {
                        info!("Loaded config from {}", path.display());
                        config
                    },
                    Err(e) => {
                        warn!("Failed to parse config file: {e}");
                        Self::default()
                    },
                }
            },
            Err(e) => {
                warn!("Failed to open config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> DroidfallResult<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| DroidfallError::Serialization(e.to_string()))?;

        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Path from `DROIDFALL_CONFIG`, or `droidfall.toml` in the working directory.
    fn config_path() -> PathBuf {
        std::env::var_os(CONFIG_ENV).map_or_else(|| PathBuf::from(CONFIG_FILE), PathBuf::from)
    }

    /// Clamp simulation values to sensible ranges.
    ///
    /// Droid tuning is checked separately when the session is built.
    pub fn validate(&mut self) {
        self.tick_rate = self.tick_rate.clamp(1, 1000);
        if !self.duration_secs.is_finite() || self.duration_secs < 0.0 {
            self.duration_secs = 0.0;
        }
        if !self.fire_interval_ms.is_finite() || self.fire_interval_ms < 0.0 {
            self.fire_interval_ms = 0.0;
        }
        self.fragments_per_droid = self.fragments_per_droid.clamp(1, 64);
    }

    /// Milliseconds per tick.
    #[must_use]
    pub fn tick_ms(&self) -> f64 {
        1000.0 / f64::from(self.tick_rate.max(1))
    }

    /// Seed to run with, drawing a fresh one when none is configured.
    #[must_use]
    pub fn resolve_seed(&self) -> u64 {
        self.seed.unwrap_or_else(|| fastrand::u64(..))
    }
}
