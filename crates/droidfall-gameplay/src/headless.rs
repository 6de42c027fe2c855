//! In-memory collaborators for running the droid core without a renderer.
//!
//! Used by the headless engine binary and by tests.

use std::collections::HashMap;

use droidfall_common::{AgentId, NodeRef, TeardownError};
use glam::Vec3;
use tracing::trace;

use crate::collaborators::{GamePhase, GameState, HeadTracker, SceneSink};

/// Local offsets of the parts of a droid body.
pub const DROID_BODY: [Vec3; 4] = [
    Vec3::new(0.0, 0.5, 0.0),
    Vec3::new(0.0, 0.0, 0.0),
    Vec3::new(-0.5, 0.0, 0.0),
    Vec3::new(0.5, 0.0, 0.0),
];

/// Transform state of one body part.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartTransform {
    /// Local position.
    pub position: Vec3,
    /// Local scale.
    pub scale: Vec3,
    /// Material opacity.
    pub opacity: f32,
}

impl PartTransform {
    fn at(position: Vec3) -> Self {
        Self {
            position,
            scale: Vec3::ONE,
            opacity: 1.0,
        }
    }
}

/// Scene node of one droid.
#[derive(Debug, Clone, PartialEq)]
pub struct DroidNode {
    /// Root transform.
    pub root: PartTransform,
    /// Last look-at target.
    pub facing: Option<Vec3>,
    /// Body parts.
    pub parts: Vec<PartTransform>,
}

/// Scene graph stand-in that only records transforms.
#[derive(Debug, Clone)]
pub struct HeadlessScene {
    nodes: HashMap<AgentId, DroidNode>,
    body: Vec<Vec3>,
    destroyed: usize,
}

impl Default for HeadlessScene {
    fn default() -> Self {
        Self::with_body(DROID_BODY.to_vec())
    }
}

impl HeadlessScene {
    /// Creates a scene whose droids are made of parts at `body` offsets.
    #[must_use]
    pub fn with_body(body: Vec<Vec3>) -> Self {
        Self {
            nodes: HashMap::new(),
            body,
            destroyed: 0,
        }
    }

    /// Node of a droid.
    #[must_use]
    pub fn node(&self, agent: AgentId) -> Option<&DroidNode> {
        self.nodes.get(&agent)
    }

    /// Number of droids currently in the scene.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the scene holds no droids.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of droids removed so far.
    #[must_use]
    pub fn destroyed_count(&self) -> usize {
        self.destroyed
    }

    /// Last look-at target of a droid.
    #[must_use]
    pub fn facing(&self, agent: AgentId) -> Option<Vec3> {
        self.nodes.get(&agent).and_then(|node| node.facing)
    }

    /// Position of a node.
    #[must_use]
    pub fn position(&self, node: NodeRef) -> Option<Vec3> {
        self.part(node).map(|part| part.position)
    }

    /// Scale of a node.
    #[must_use]
    pub fn scale(&self, node: NodeRef) -> Option<Vec3> {
        self.part(node).map(|part| part.scale)
    }

    /// Opacity of a node.
    #[must_use]
    pub fn opacity(&self, node: NodeRef) -> Option<f32> {
        self.part(node).map(|part| part.opacity)
    }

    fn part(&self, node: NodeRef) -> Option<&PartTransform> {
        match node {
            NodeRef::Agent(agent) => self.nodes.get(&agent).map(|n| &n.root),
            NodeRef::Fragment { agent, index } => {
                self.nodes.get(&agent).and_then(|n| n.parts.get(index))
            },
        }
    }

    fn part_mut(&mut self, node: NodeRef) -> Option<&mut PartTransform> {
        match node {
            NodeRef::Agent(agent) => self.nodes.get_mut(&agent).map(|n| &mut n.root),
            NodeRef::Fragment { agent, index } => self
                .nodes
                .get_mut(&agent)
                .and_then(|n| n.parts.get_mut(index)),
        }
    }
}

impl SceneSink for HeadlessScene {
    fn instantiate(&mut self, agent: AgentId, position: Vec3) {
        let parts = self.body.iter().copied().map(PartTransform::at).collect();
        self.nodes.insert(
            agent,
            DroidNode {
                root: PartTransform::at(position),
                facing: None,
                parts,
            },
        );
    }

    fn set_position(&mut self, node: NodeRef, position: Vec3) {
        match self.part_mut(node) {
            Some(part) => part.position = position,
            None => trace!(?node, "position for unknown node"),
        }
    }

    fn set_scale(&mut self, node: NodeRef, scale: Vec3) {
        match self.part_mut(node) {
            Some(part) => part.scale = scale,
            None => trace!(?node, "scale for unknown node"),
        }
    }

    fn set_opacity(&mut self, node: NodeRef, opacity: f32) {
        if let Some(part) = self.part_mut(node) {
            part.opacity = opacity;
        }
    }

    fn look_at(&mut self, agent: AgentId, target: Vec3) {
        if let Some(node) = self.nodes.get_mut(&agent) {
            node.facing = Some(target);
        }
    }

    fn fragment_positions(&self, agent: AgentId) -> Vec<Vec3> {
        self.nodes
            .get(&agent)
            .map(|node| node.parts.iter().map(|part| part.position).collect())
            .unwrap_or_default()
    }

    fn destroy(&mut self, agent: AgentId) -> Result<(), TeardownError> {
        if self.nodes.remove(&agent).is_none() {
            return Err(TeardownError::UnknownNode(agent));
        }
        self.destroyed += 1;
        Ok(())
    }
}

/// Minimal game state: a score and a phase.
#[derive(Debug, Clone, Default)]
pub struct ScoreBoard {
    points: u32,
    phase: GamePhase,
}

impl ScoreBoard {
    /// Creates a board with a starting score.
    #[must_use]
    pub fn with_points(points: u32) -> Self {
        Self {
            points,
            phase: GamePhase::Playing,
        }
    }

    /// Adds points.
    pub fn award(&mut self, points: u32) {
        self.points = self.points.saturating_add(points);
    }

    /// Switches to game over.
    pub fn end_game(&mut self) {
        self.phase = GamePhase::GameOver;
    }

    /// Switches back to playing.
    pub fn resume(&mut self) {
        self.phase = GamePhase::Playing;
    }
}

impl GameState for ScoreBoard {
    fn points(&self) -> u32 {
        self.points
    }

    fn phase(&self) -> GamePhase {
        self.phase
    }
}

/// Head tracker returning a settable position.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FixedHead(Vec3);

impl FixedHead {
    /// Creates a tracker at `position`.
    #[must_use]
    pub const fn new(position: Vec3) -> Self {
        Self(position)
    }

    /// Moves the head.
    pub fn set(&mut self, position: Vec3) {
        self.0 = position;
    }
}

impl HeadTracker for FixedHead {
    fn head_position(&self) -> Vec3 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_records_transforms() {
        let mut scene = HeadlessScene::default();
        let agent = AgentId::new();
        scene.instantiate(agent, Vec3::new(1.0, -10.0, 2.0));

        assert_eq!(scene.fragment_positions(agent), DROID_BODY.to_vec());
        scene.set_scale(NodeRef::Agent(agent), Vec3::splat(1.2));
        scene.set_opacity(NodeRef::Fragment { agent, index: 2 }, 0.3);

        assert_eq!(scene.scale(NodeRef::Agent(agent)), Some(Vec3::splat(1.2)));
        assert_eq!(scene.opacity(NodeRef::Fragment { agent, index: 2 }), Some(0.3));
        assert_eq!(scene.position(NodeRef::Fragment { agent, index: 9 }), None);
    }

    #[test]
    fn test_destroy_unknown_node_fails() {
        let mut scene = HeadlessScene::default();
        let agent = AgentId::new();
        assert_eq!(scene.destroy(agent), Err(TeardownError::UnknownNode(agent)));

        scene.instantiate(agent, Vec3::ZERO);
        assert!(scene.destroy(agent).is_ok());
        assert_eq!(scene.destroyed_count(), 1);
        assert!(scene.is_empty());
    }

    #[test]
    fn test_score_board() {
        let mut board = ScoreBoard::with_points(8);
        board.award(3);
        assert_eq!(board.points(), 11);
        assert!(!board.is_game_over());
        board.end_game();
        assert!(board.is_game_over());
    }
}
