//! Contracts with the systems that surround the droid core.
//!
//! The core never looks anything up on its own. Every operation of the
//! spawn director receives a [`Collaborators`] bundle with the scene, audio,
//! projectile, head-tracking and game-state sides it may touch.

use droidfall_common::{AgentId, NodeRef, TeardownError};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::cues::Cue;

/// Coarse game phase as reported by the game-state collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// Normal play.
    #[default]
    Playing,
    /// The player lost; every droid freezes.
    GameOver,
}

/// Read-only view of score and phase.
pub trait GameState {
    /// Current score.
    fn points(&self) -> u32;

    /// Current phase.
    fn phase(&self) -> GamePhase;

    /// Whether droid ticks should be frozen.
    fn is_game_over(&self) -> bool {
        self.phase() == GamePhase::GameOver
    }
}

/// Source of the player's head position.
pub trait HeadTracker {
    /// Head position in world space.
    fn head_position(&self) -> Vec3;
}

/// Scene-graph side: receives transforms, owns geometry.
pub trait SceneSink {
    /// Creates the visual representation of a new droid.
    fn instantiate(&mut self, agent: AgentId, position: Vec3);

    /// Sets a node's local position.
    fn set_position(&mut self, node: NodeRef, position: Vec3);

    /// Sets a node's local scale.
    fn set_scale(&mut self, node: NodeRef, scale: Vec3);

    /// Sets a node's material opacity.
    fn set_opacity(&mut self, node: NodeRef, opacity: f32);

    /// Rotates the droid so it faces `target`.
    fn look_at(&mut self, agent: AgentId, target: Vec3);

    /// Current local positions of the droid's body parts, in child order.
    fn fragment_positions(&self, agent: AgentId) -> Vec<Vec3>;

    /// Removes the droid and its body parts from the scene.
    fn destroy(&mut self, agent: AgentId) -> Result<(), TeardownError>;
}

/// Audio side: maps cues to sounds.
pub trait AudioCueSink {
    /// Fire-and-forget cue for one droid.
    fn emit_cue(&mut self, cue: Cue, agent: AgentId);

    /// Drops any audio resources held for the droid.
    fn release(&mut self, agent: AgentId) -> Result<(), TeardownError> {
        let _ = agent;
        Ok(())
    }
}

/// A request for the projectile system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectileRequest {
    /// Droid that fired.
    pub shooter: AgentId,
    /// Spawn point.
    pub origin: Vec3,
    /// Unit travel direction.
    pub direction: Vec3,
    /// Travel speed.
    pub speed: f32,
}

/// Projectile side: creates and simulates bullets.
pub trait ProjectileFactory {
    /// Fire-and-forget projectile creation.
    fn spawn(&mut self, request: ProjectileRequest);
}

/// Borrowed collaborators for one call into the core.
pub struct Collaborators<'a> {
    /// Score and phase.
    pub game: &'a dyn GameState,
    /// Head position source.
    pub head: &'a dyn HeadTracker,
    /// Transform sink and scene lifecycle.
    pub scene: &'a mut dyn SceneSink,
    /// Cue sink.
    pub audio: &'a mut dyn AudioCueSink,
    /// Projectile factory.
    pub projectiles: &'a mut dyn ProjectileFactory,
}

impl<'a> Collaborators<'a> {
    /// Bundles the collaborators.
    pub fn new(
        game: &'a dyn GameState,
        head: &'a dyn HeadTracker,
        scene: &'a mut dyn SceneSink,
        audio: &'a mut dyn AudioCueSink,
        projectiles: &'a mut dyn ProjectileFactory,
    ) -> Self {
        Self {
            game,
            head,
            scene,
            audio,
            projectiles,
        }
    }
}
