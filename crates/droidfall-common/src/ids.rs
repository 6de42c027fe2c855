//! ID types for agents and their visual parts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter for agent IDs.
static AGENT_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a hostile agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(u64);

impl AgentId {
    /// Creates a new unique agent ID.
    #[must_use]
    pub fn new() -> Self {
        Self(AGENT_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Creates an agent ID from a raw value.
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Null/invalid agent ID.
    pub const NULL: Self = Self(0);

    /// Checks if this is a valid (non-null) agent ID.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "droid#{}", self.0)
    }
}

/// Handle to a node in the external scene graph.
///
/// Agents own a root node and one child node per explosion fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeRef {
    /// The agent's root node.
    Agent(AgentId),
    /// One fragment of the agent's body.
    Fragment {
        /// Owning agent
        agent: AgentId,
        /// Child index in the agent's body
        index: usize,
    },
}

impl NodeRef {
    /// Returns the agent that owns this node.
    #[must_use]
    pub const fn agent(self) -> AgentId {
        match self {
            Self::Agent(agent) | Self::Fragment { agent, .. } => agent,
        }
    }
}
