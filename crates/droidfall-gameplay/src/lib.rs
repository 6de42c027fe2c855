//! # Droidfall Gameplay
//!
//! Hostile droids for an arena shooter.
//!
//! This crate provides:
//! - The spawn director that keeps a constant population of droids
//! - The per-droid state machine (appear, charge, shoot, explode)
//! - Collaborator traits for scene, audio, projectiles, head tracking and score
//! - Cue-driven positional sound emitters
//! - A session wiring the director to a sound board
//! - Headless collaborators for simulation and tests

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod agent;
pub mod collaborators;
pub mod cues;
pub mod director;
pub mod events;
pub mod fragment;
pub mod headless;
pub mod session;
pub mod sound;
pub mod spawn;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::agent::*;
    pub use crate::collaborators::*;
    pub use crate::cues::*;
    pub use crate::director::*;
    pub use crate::events::*;
    pub use crate::fragment::*;
    pub use crate::headless::*;
    pub use crate::session::*;
    pub use crate::sound::*;
    pub use crate::spawn::*;
}

pub use prelude::*;
