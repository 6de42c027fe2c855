//! Spawn parameters for new droids.
//!
//! This module provides:
//! - Tunable spawn constants with validation
//! - Score-based difficulty levels
//! - Area-uniform hemisphere placement
//! - The validated per-droid parameter set and its builder

use droidfall_common::{math, require_finite, require_positive, ConfigError};
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

// ============================================================================
// Tuning
// ============================================================================

/// Constants governing where droids appear and how aggressive they are.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnTuning {
    /// Radius of the spawn hemisphere.
    pub radius: f32,
    /// Height of the spawn point below the arena.
    pub spawn_depth: f32,
    /// Points needed per difficulty level.
    pub points_per_level: u32,
    /// Droids alive at any time.
    pub initial_population: usize,

    /// Waiting time at level 0 with a zero roll (ms).
    pub waiting_base_ms: f64,
    /// Waiting time removed per level and per unit of roll (ms).
    pub waiting_step_ms: f64,
    /// Lower bound of the waiting time (ms).
    pub waiting_floor_ms: f64,
    /// Upper bound of the random roll added to the level.
    pub waiting_roll_span: f64,

    /// Bullet speed at level 0.
    pub bullet_base_speed: f32,
    /// Maximum random bullet speed gain per level.
    pub bullet_speed_per_level: f32,
    /// Bullet speed cap.
    pub bullet_max_speed: f32,

    /// Charging duration at level 0 (ms).
    pub charging_base_ms: f64,
    /// Charging time removed per level (ms).
    pub charging_step_ms: f64,
    /// Lower bound of the charging duration (ms).
    pub charging_floor_ms: f64,

    /// Random span of the lifespan.
    pub lifespan_span: f32,
    /// Minimum lifespan.
    pub lifespan_min: f32,
}

impl Default for SpawnTuning {
    fn default() -> Self {
        Self {
            radius: 13.0,
            spawn_depth: -10.0,
            points_per_level: 10,
            initial_population: 3,

            waiting_base_ms: 5000.0,
            waiting_step_ms: 500.0,
            waiting_floor_ms: 2000.0,
            waiting_roll_span: 2.0,

            bullet_base_speed: 6.0,
            bullet_speed_per_level: 0.5,
            bullet_max_speed: 8.0,

            charging_base_ms: 6000.0,
            charging_step_ms: 500.0,
            charging_floor_ms: 4000.0,

            lifespan_span: 6.0,
            lifespan_min: 1.0,
        }
    }
}

impl SpawnTuning {
    /// Rejects tunings that could produce unusable droids.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("radius", f64::from(self.radius))?;
        require_finite("spawn_depth", f64::from(self.spawn_depth))?;
        if self.points_per_level == 0 {
            return Err(ConfigError::invalid(
                "points_per_level",
                0.0,
                "must be greater than zero",
            ));
        }
        require_finite("waiting_base_ms", self.waiting_base_ms)?;
        require_finite("waiting_step_ms", self.waiting_step_ms)?;
        require_positive("waiting_floor_ms", self.waiting_floor_ms)?;
        require_finite("waiting_roll_span", self.waiting_roll_span)?;
        require_non_negative("bullet_base_speed", f64::from(self.bullet_base_speed))?;
        require_non_negative(
            "bullet_speed_per_level",
            f64::from(self.bullet_speed_per_level),
        )?;
        require_positive("bullet_max_speed", f64::from(self.bullet_max_speed))?;
        if self.bullet_max_speed < self.bullet_base_speed {
            return Err(ConfigError::invalid(
                "bullet_max_speed",
                f64::from(self.bullet_max_speed),
                "must not be below bullet_base_speed",
            ));
        }
        require_finite("charging_base_ms", self.charging_base_ms)?;
        require_finite("charging_step_ms", self.charging_step_ms)?;
        require_positive("charging_floor_ms", self.charging_floor_ms)?;
        require_finite("lifespan_span", f64::from(self.lifespan_span))?;
        require_finite("lifespan_min", f64::from(self.lifespan_min))?;
        Ok(())
    }

    /// Difficulty level for a score.
    #[must_use]
    pub fn level(&self, points: u32) -> u32 {
        points / self.points_per_level.max(1)
    }

    /// Pause between shots. `roll` is uniform in `[0, 1)`.
    #[must_use]
    pub fn waiting_time_ms(&self, level: u32, roll: f64) -> f64 {
        let steps = roll * self.waiting_roll_span + f64::from(level);
        (self.waiting_base_ms - steps * self.waiting_step_ms).max(self.waiting_floor_ms)
    }

    /// Projectile speed. `roll` is uniform in `[0, 1)`.
    #[must_use]
    pub fn bullet_speed(&self, level: u32, roll: f32) -> f32 {
        (self.bullet_base_speed + roll * level as f32 * self.bullet_speed_per_level)
            .min(self.bullet_max_speed)
    }

    /// Time a charge takes.
    #[must_use]
    pub fn charging_duration_ms(&self, level: u32) -> f64 {
        (self.charging_base_ms - f64::from(level) * self.charging_step_ms)
            .max(self.charging_floor_ms)
    }

    /// Lifespan. `roll` is uniform in `[0, 1)`.
    #[must_use]
    pub fn lifespan(&self, roll: f32) -> f32 {
        roll * self.lifespan_span + self.lifespan_min
    }

    /// Spawn and resting positions for a point of the hemisphere's base disk.
    ///
    /// The resting height lies on the hemisphere surface; it is never
    /// mirrored below the horizon.
    #[must_use]
    pub fn spawn_positions(&self, disk: Vec2) -> (Vec3, Vec3) {
        let height = (self.radius * self.radius - disk.length_squared())
            .max(0.0)
            .sqrt();
        let start = Vec3::new(disk.x, self.spawn_depth, disk.y);
        let end = Vec3::new(disk.x, height, disk.y);
        (start, end)
    }

    /// Draws a full parameter set for a new droid.
    pub fn roll(&self, points: u32, rng: &mut fastrand::Rng) -> Result<AgentParams, ConfigError> {
        let disk = math::sample_disk(rng, self.radius);
        let (start, end) = self.spawn_positions(disk);
        let level = self.level(points);

        AgentParams::builder()
            .start_position(start)
            .end_position(end)
            .waiting_time_ms(self.waiting_time_ms(level, rng.f64()))
            .bullet_speed(self.bullet_speed(level, rng.f32()))
            .charging_duration_ms(self.charging_duration_ms(level))
            .lifespan(self.lifespan(rng.f32()))
            .build()
    }
}

// ============================================================================
// Agent parameters
// ============================================================================

/// Immutable per-droid configuration, fixed at spawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentParams {
    /// Spawn point below the arena.
    pub start_position: Vec3,
    /// Resting and aiming point.
    pub end_position: Vec3,
    /// Pause between shots (ms).
    pub waiting_time_ms: f64,
    /// Projectile speed.
    pub bullet_speed: f32,
    /// Charge duration (ms).
    pub charging_duration_ms: f64,
    /// Stored lifespan; no timing logic consults it.
    pub lifespan: f32,
}

impl AgentParams {
    /// Starts a builder with every parameter unset.
    #[must_use]
    pub fn builder() -> AgentParamsBuilder {
        AgentParamsBuilder::default()
    }
}

/// Builder for [`AgentParams`]; every field is required.
#[derive(Debug, Clone, Default)]
pub struct AgentParamsBuilder {
    start_position: Option<Vec3>,
    end_position: Option<Vec3>,
    waiting_time_ms: Option<f64>,
    bullet_speed: Option<f32>,
    charging_duration_ms: Option<f64>,
    lifespan: Option<f32>,
}

impl AgentParamsBuilder {
    /// Set spawn point.
    #[must_use]
    pub fn start_position(mut self, position: Vec3) -> Self {
        self.start_position = Some(position);
        self
    }

    /// Set resting point.
    #[must_use]
    pub fn end_position(mut self, position: Vec3) -> Self {
        self.end_position = Some(position);
        self
    }

    /// Set waiting time.
    #[must_use]
    pub fn waiting_time_ms(mut self, ms: f64) -> Self {
        self.waiting_time_ms = Some(ms);
        self
    }

    /// Set bullet speed.
    #[must_use]
    pub fn bullet_speed(mut self, speed: f32) -> Self {
        self.bullet_speed = Some(speed);
        self
    }

    /// Set charging duration.
    #[must_use]
    pub fn charging_duration_ms(mut self, ms: f64) -> Self {
        self.charging_duration_ms = Some(ms);
        self
    }

    /// Set lifespan.
    #[must_use]
    pub fn lifespan(mut self, lifespan: f32) -> Self {
        self.lifespan = Some(lifespan);
        self
    }

    /// Validates and builds the parameter set.
    pub fn build(self) -> Result<AgentParams, ConfigError> {
        let start_position = self
            .start_position
            .ok_or(ConfigError::MissingParameter("start_position"))?;
        let end_position = self
            .end_position
            .ok_or(ConfigError::MissingParameter("end_position"))?;
        let waiting_time_ms = self
            .waiting_time_ms
            .ok_or(ConfigError::MissingParameter("waiting_time_ms"))?;
        let bullet_speed = self
            .bullet_speed
            .ok_or(ConfigError::MissingParameter("bullet_speed"))?;
        let charging_duration_ms = self
            .charging_duration_ms
            .ok_or(ConfigError::MissingParameter("charging_duration_ms"))?;
        let lifespan = self
            .lifespan
            .ok_or(ConfigError::MissingParameter("lifespan"))?;

        if !start_position.is_finite() {
            return Err(ConfigError::invalid(
                "start_position",
                f64::NAN,
                "must be finite",
            ));
        }
        if !end_position.is_finite() {
            return Err(ConfigError::invalid(
                "end_position",
                f64::NAN,
                "must be finite",
            ));
        }
        require_positive("waiting_time_ms", waiting_time_ms)?;
        require_positive("charging_duration_ms", charging_duration_ms)?;
        let speed = require_finite("bullet_speed", f64::from(bullet_speed))?;
        if speed < 0.0 {
            return Err(ConfigError::invalid(
                "bullet_speed",
                speed,
                "must not be negative",
            ));
        }
        require_finite("lifespan", f64::from(lifespan))?;

        Ok(AgentParams {
            start_position,
            end_position,
            waiting_time_ms,
            bullet_speed,
            charging_duration_ms,
            lifespan,
        })
    }
}

fn require_non_negative(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    let value = require_finite(name, value)?;
    if value < 0.0 {
        return Err(ConfigError::invalid(name, value, "must not be negative"));
    }
    Ok(value)
}
